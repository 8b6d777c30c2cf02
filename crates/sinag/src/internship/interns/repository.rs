use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::domain::{Intern, InternStatus, PlacementChange, ValidIntern, ValidProfile};
use crate::auth::{PasswordHash, Role};
use crate::ids::{AccountId, CompanyId, InternId, ProgramId};
use crate::internship::accounts::domain::AccountRecord;
use crate::internship::accounts::repository::insert_account_row;
use crate::storage::{like_pattern, parse_column, RepositoryError, SqliteStore};

/// Role scope and user filters combined into one listing query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InternQuery {
    pub program_id: Option<ProgramId>,
    pub company_id: Option<CompanyId>,
    pub intern_id: Option<InternId>,
    pub status: Option<InternStatus>,
    pub search: Option<String>,
}

/// Storage abstraction for interns.
pub trait InternRepository: Send + Sync {
    /// Inserts the intern and its login account in one transaction.
    fn enroll_intern(
        &self,
        intern: &ValidIntern,
        password: &PasswordHash,
        now: DateTime<Utc>,
    ) -> Result<(Intern, AccountId), RepositoryError>;
    fn fetch_intern(&self, id: InternId) -> Result<Option<Intern>, RepositoryError>;
    fn find_intern_by_student_number(
        &self,
        student_number: &str,
    ) -> Result<Option<Intern>, RepositoryError>;
    fn list_interns(&self, query: &InternQuery) -> Result<Vec<Intern>, RepositoryError>;
    /// Updates the profile and keeps the login email in step.
    fn update_intern_profile(
        &self,
        id: InternId,
        profile: &ValidProfile,
    ) -> Result<Intern, RepositoryError>;
    /// Applies the change only while the intern is still in `from` status;
    /// a status that moved underneath yields `Conflict`.
    fn update_intern_placement(
        &self,
        id: InternId,
        from: InternStatus,
        change: &PlacementChange,
    ) -> Result<Intern, RepositoryError>;
    /// Deploys the intern only if the company still has an open slot and the
    /// intern is still in `from` status; both checks share the write's
    /// transaction.
    fn place_intern(
        &self,
        id: InternId,
        from: InternStatus,
        change: &PlacementChange,
        slots: u32,
    ) -> Result<PlacementOutcome, RepositoryError>;
    fn count_deployed_at(&self, company_id: CompanyId) -> Result<u32, RepositoryError>;
}

/// Result of a slot-checked placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementOutcome {
    Placed(Intern),
    Full { deployed: u32 },
}

const INTERN_COLUMNS: &str = "id, student_number, last_name, first_name, middle_name, email, \
     program_id, section, school_year, required_hours, status, company_id, supervisor_id, \
     start_date, end_date";

fn intern_from_row(row: &Row<'_>) -> rusqlite::Result<Intern> {
    Ok(Intern {
        id: row.get(0)?,
        student_number: row.get(1)?,
        last_name: row.get(2)?,
        first_name: row.get(3)?,
        middle_name: row.get(4)?,
        email: row.get(5)?,
        program_id: row.get(6)?,
        section: row.get(7)?,
        school_year: row.get(8)?,
        required_hours: row.get(9)?,
        status: parse_column(row, 10)?,
        company_id: row.get(11)?,
        supervisor_id: row.get(12)?,
        start_date: row.get(13)?,
        end_date: row.get(14)?,
    })
}

impl InternRepository for SqliteStore {
    fn enroll_intern(
        &self,
        intern: &ValidIntern,
        password: &PasswordHash,
        now: DateTime<Utc>,
    ) -> Result<(Intern, AccountId), RepositoryError> {
        let (id, account_id) = self.with_transaction(|tx| {
            tx.execute(
                "INSERT INTO interns (student_number, last_name, first_name, middle_name, email, \
                 program_id, section, school_year, required_hours, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    intern.student_number,
                    intern.last_name,
                    intern.first_name,
                    intern.middle_name,
                    intern.email,
                    intern.program_id,
                    intern.section,
                    intern.school_year,
                    intern.required_hours,
                    InternStatus::Pending.as_str(),
                    now,
                ],
            )?;
            let id = InternId(tx.last_insert_rowid());
            let record = AccountRecord {
                email: intern.email.clone(),
                display_name: format!("{} {}", intern.first_name, intern.last_name),
                role: Role::Intern,
                program_id: Some(intern.program_id),
                company_id: None,
                intern_id: Some(id),
                password: password.clone(),
            };
            let account_id = insert_account_row(tx, &record, now)?;
            Ok((id, account_id))
        })?;

        let intern = self.fetch_intern(id)?.ok_or(RepositoryError::NotFound)?;
        Ok((intern, account_id))
    }

    fn fetch_intern(&self, id: InternId) -> Result<Option<Intern>, RepositoryError> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {INTERN_COLUMNS} FROM interns WHERE id = ?1"),
                [id],
                intern_from_row,
            )
            .optional()
        })
    }

    fn find_intern_by_student_number(
        &self,
        student_number: &str,
    ) -> Result<Option<Intern>, RepositoryError> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {INTERN_COLUMNS} FROM interns WHERE student_number = ?1"),
                [student_number],
                intern_from_row,
            )
            .optional()
        })
    }

    fn list_interns(&self, query: &InternQuery) -> Result<Vec<Intern>, RepositoryError> {
        let search = query.search.as_deref().map(like_pattern);
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {INTERN_COLUMNS} FROM interns
                 WHERE (?1 IS NULL OR program_id = ?1)
                   AND (?2 IS NULL OR company_id = ?2)
                   AND (?3 IS NULL OR id = ?3)
                   AND (?4 IS NULL OR status = ?4)
                   AND (?5 IS NULL
                        OR last_name LIKE ?5 ESCAPE '\\'
                        OR first_name LIKE ?5 ESCAPE '\\'
                        OR student_number LIKE ?5 ESCAPE '\\')
                 ORDER BY last_name COLLATE NOCASE, first_name COLLATE NOCASE"
            ))?;
            let rows = stmt.query_map(
                params![
                    query.program_id,
                    query.company_id,
                    query.intern_id,
                    query.status.map(InternStatus::as_str),
                    search,
                ],
                intern_from_row,
            )?;
            rows.collect()
        })
    }

    fn update_intern_profile(
        &self,
        id: InternId,
        profile: &ValidProfile,
    ) -> Result<Intern, RepositoryError> {
        self.with_transaction(|tx| {
            let changed = tx.execute(
                "UPDATE interns SET last_name = ?2, first_name = ?3, middle_name = ?4, email = ?5, \
                 section = ?6, school_year = ?7, required_hours = ?8 WHERE id = ?1",
                params![
                    id,
                    profile.last_name,
                    profile.first_name,
                    profile.middle_name,
                    profile.email,
                    profile.section,
                    profile.school_year,
                    profile.required_hours,
                ],
            )?;
            if changed == 0 {
                return Err(RepositoryError::NotFound);
            }
            tx.execute(
                "UPDATE accounts SET email = ?2, display_name = ?3 WHERE intern_id = ?1",
                params![
                    id,
                    profile.email,
                    format!("{} {}", profile.first_name, profile.last_name),
                ],
            )?;
            Ok(())
        })?;
        self.fetch_intern(id)?.ok_or(RepositoryError::NotFound)
    }

    fn update_intern_placement(
        &self,
        id: InternId,
        from: InternStatus,
        change: &PlacementChange,
    ) -> Result<Intern, RepositoryError> {
        let changed = self.with_conn(|conn| {
            conn.execute(
                "UPDATE interns SET status = ?2, company_id = ?3, supervisor_id = ?4, \
                 start_date = ?5, end_date = ?6 WHERE id = ?1 AND status = ?7",
                params![
                    id,
                    change.status.as_str(),
                    change.company_id,
                    change.supervisor_id,
                    change.start_date,
                    change.end_date,
                    from.as_str(),
                ],
            )
        })?;
        match self.fetch_intern(id)? {
            Some(intern) if changed > 0 => Ok(intern),
            Some(_) => Err(RepositoryError::Conflict),
            None => Err(RepositoryError::NotFound),
        }
    }

    fn place_intern(
        &self,
        id: InternId,
        from: InternStatus,
        change: &PlacementChange,
        slots: u32,
    ) -> Result<PlacementOutcome, RepositoryError> {
        let company_id = change.company_id.ok_or(RepositoryError::NotFound)?;
        self.with_transaction(|tx| {
            let deployed: u32 = tx.query_row(
                "SELECT COUNT(*) FROM interns WHERE company_id = ?1 AND status = ?2",
                params![company_id, InternStatus::Deployed.as_str()],
                |row| row.get(0),
            )?;
            if deployed >= slots {
                return Ok(PlacementOutcome::Full { deployed });
            }
            let changed = tx.execute(
                "UPDATE interns SET status = ?2, company_id = ?3, supervisor_id = ?4, \
                 start_date = ?5, end_date = ?6 WHERE id = ?1 AND status = ?7",
                params![
                    id,
                    change.status.as_str(),
                    change.company_id,
                    change.supervisor_id,
                    change.start_date,
                    change.end_date,
                    from.as_str(),
                ],
            )?;
            if changed == 0 {
                return Err(RepositoryError::Conflict);
            }
            let placed = tx.query_row(
                &format!("SELECT {INTERN_COLUMNS} FROM interns WHERE id = ?1"),
                params![id],
                intern_from_row,
            )?;
            Ok(PlacementOutcome::Placed(placed))
        })
    }

    fn count_deployed_at(&self, company_id: CompanyId) -> Result<u32, RepositoryError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM interns WHERE company_id = ?1 AND status = ?2",
                params![company_id, InternStatus::Deployed.as_str()],
                |row| row.get(0),
            )
        })
    }
}
