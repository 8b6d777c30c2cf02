//! Schema versioning.

use rusqlite::Connection;

use super::schema::SCHEMA_STATEMENTS;
use super::RepositoryError;

pub const CURRENT_VERSION: i32 = 2;

const VERSION_KEY: &str = "schema_version";

/// Create all tables if missing and bring the schema up to [`CURRENT_VERSION`].
pub fn initialize_schema(conn: &Connection) -> Result<i32, RepositoryError> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }

    let version = schema_version(conn)?;
    if version < CURRENT_VERSION {
        run_migrations(conn, version)?;
    }

    Ok(CURRENT_VERSION)
}

/// Returns 0 for a fresh database.
pub fn schema_version(conn: &Connection) -> Result<i32, RepositoryError> {
    let result: Result<String, rusqlite::Error> = conn.query_row(
        "SELECT value FROM metadata WHERE key = ?1",
        [VERSION_KEY],
        |row| row.get(0),
    );

    match result {
        Ok(value) => value.parse().map_err(|_| {
            RepositoryError::Unavailable(format!("invalid schema version: {value}"))
        }),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(err) => Err(err.into()),
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<(), RepositoryError> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, version.to_string()),
    )?;
    Ok(())
}

fn run_migrations(conn: &Connection, from_version: i32) -> Result<(), RepositoryError> {
    let mut current = from_version;

    while current < CURRENT_VERSION {
        current += 1;
        match current {
            // v1 is the base schema created above.
            1 => {}
            2 => migrate_v2(conn)?,
            other => {
                return Err(RepositoryError::Unavailable(format!(
                    "unknown migration version: {other}"
                )))
            }
        }
        set_schema_version(conn, current)?;
    }

    Ok(())
}

/// v2 adds the log-review index used by the supervisor dashboard.
fn migrate_v2(conn: &Connection) -> Result<(), RepositoryError> {
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_activity_logs_status ON activity_logs(intern_id, status)",
        [],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_db() -> Connection {
        Connection::open_in_memory().expect("failed to create in-memory database")
    }

    #[test]
    fn initialize_schema_sets_current_version() {
        let conn = create_test_db();
        initialize_schema(&conn).expect("schema initializes");
        assert_eq!(schema_version(&conn).expect("version"), CURRENT_VERSION);
    }

    #[test]
    fn initialize_schema_is_idempotent() {
        let conn = create_test_db();
        initialize_schema(&conn).expect("first run");
        initialize_schema(&conn).expect("second run");
        assert_eq!(schema_version(&conn).expect("version"), CURRENT_VERSION);
    }

    #[test]
    fn upgrades_from_version_one() {
        let conn = create_test_db();
        for statement in SCHEMA_STATEMENTS {
            conn.execute(statement, []).expect("schema");
        }
        set_schema_version(&conn, 1).expect("pin v1");

        initialize_schema(&conn).expect("upgrade");

        let index: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = 'idx_activity_logs_status'",
                [],
                |row| row.get(0),
            )
            .expect("index lookup");
        assert_eq!(index, 1);
    }

    #[test]
    fn rejects_corrupt_version() {
        let conn = create_test_db();
        for statement in SCHEMA_STATEMENTS {
            conn.execute(statement, []).expect("schema");
        }
        conn.execute(
            "INSERT INTO metadata (key, value) VALUES ('schema_version', 'two')",
            [],
        )
        .expect("insert");
        assert!(matches!(
            schema_version(&conn),
            Err(RepositoryError::Unavailable(_))
        ));
    }
}
