//! `SQLite` schema for the internship portal.

pub const CREATE_PROGRAMS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS programs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    created_at TEXT NOT NULL
)
";

pub const CREATE_COMPANIES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS companies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE,
    address TEXT NOT NULL,
    industry TEXT NOT NULL,
    contact_person TEXT NOT NULL,
    contact_email TEXT NOT NULL,
    contact_phone TEXT NOT NULL,
    slots INTEGER NOT NULL CHECK (slots >= 0),
    moa_signed_on TEXT,
    moa_expires_on TEXT,
    created_at TEXT NOT NULL
)
";

pub const CREATE_ACCOUNTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE COLLATE NOCASE,
    display_name TEXT NOT NULL,
    role TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    program_id INTEGER REFERENCES programs(id),
    company_id INTEGER REFERENCES companies(id),
    intern_id INTEGER REFERENCES interns(id),
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
)
";

pub const CREATE_INTERNS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS interns (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    student_number TEXT NOT NULL UNIQUE,
    last_name TEXT NOT NULL,
    first_name TEXT NOT NULL,
    middle_name TEXT,
    email TEXT NOT NULL UNIQUE COLLATE NOCASE,
    program_id INTEGER NOT NULL REFERENCES programs(id),
    section TEXT NOT NULL,
    school_year TEXT NOT NULL,
    required_hours INTEGER NOT NULL,
    status TEXT NOT NULL,
    company_id INTEGER REFERENCES companies(id),
    supervisor_id INTEGER REFERENCES accounts(id),
    start_date TEXT,
    end_date TEXT,
    created_at TEXT NOT NULL
)
";

pub const CREATE_INTERN_PROGRAM_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_interns_program ON interns(program_id, status)
";

pub const CREATE_INTERN_COMPANY_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_interns_company ON interns(company_id, status)
";

pub const CREATE_DOCUMENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    intern_id INTEGER NOT NULL REFERENCES interns(id),
    kind TEXT NOT NULL,
    file_name TEXT NOT NULL,
    content_type TEXT NOT NULL,
    storage_key TEXT NOT NULL,
    size_bytes INTEGER NOT NULL,
    status TEXT NOT NULL,
    remarks TEXT,
    reviewed_by INTEGER REFERENCES accounts(id),
    uploaded_at TEXT NOT NULL,
    reviewed_at TEXT,
    UNIQUE (intern_id, kind)
)
";

pub const CREATE_DOCUMENT_STATUS_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_documents_status ON documents(status)
";

pub const CREATE_ACTIVITY_LOGS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS activity_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    intern_id INTEGER NOT NULL REFERENCES interns(id),
    log_date TEXT NOT NULL,
    time_in TEXT NOT NULL,
    time_out TEXT NOT NULL,
    break_minutes INTEGER NOT NULL,
    worked_minutes INTEGER NOT NULL,
    activities TEXT NOT NULL,
    status TEXT NOT NULL,
    remarks TEXT,
    reviewed_by INTEGER REFERENCES accounts(id),
    created_at TEXT NOT NULL,
    reviewed_at TEXT,
    UNIQUE (intern_id, log_date)
)
";

pub const CREATE_EVALUATIONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS evaluations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    intern_id INTEGER NOT NULL REFERENCES interns(id),
    period TEXT NOT NULL,
    evaluator_id INTEGER NOT NULL REFERENCES accounts(id),
    ratings TEXT NOT NULL,
    comments TEXT,
    submitted_at TEXT NOT NULL,
    UNIQUE (intern_id, period)
)
";

pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_PROGRAMS_TABLE,
    CREATE_COMPANIES_TABLE,
    CREATE_ACCOUNTS_TABLE,
    CREATE_INTERNS_TABLE,
    CREATE_INTERN_PROGRAM_INDEX,
    CREATE_INTERN_COMPANY_INDEX,
    CREATE_DOCUMENTS_TABLE,
    CREATE_DOCUMENT_STATUS_INDEX,
    CREATE_ACTIVITY_LOGS_TABLE,
    CREATE_EVALUATIONS_TABLE,
    CREATE_METADATA_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn statements_apply_cleanly_twice() {
        let conn = Connection::open_in_memory().expect("in-memory database");
        for _ in 0..2 {
            for statement in SCHEMA_STATEMENTS {
                conn.execute(statement, []).expect("statement applies");
            }
        }

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                [],
                |row| row.get(0),
            )
            .expect("count tables");
        assert_eq!(tables, 8);
    }
}
