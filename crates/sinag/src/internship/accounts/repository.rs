use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::domain::{Account, AccountRecord, StoredAccount};
use crate::auth::{PasswordHash, Role};
use crate::ids::AccountId;
use crate::storage::{parse_column, RepositoryError, SqliteStore};

/// Storage abstraction for login accounts.
pub trait AccountRepository: Send + Sync {
    fn insert_account(
        &self,
        record: &AccountRecord,
        now: DateTime<Utc>,
    ) -> Result<Account, RepositoryError>;
    fn fetch_account(&self, id: AccountId) -> Result<Option<Account>, RepositoryError>;
    fn fetch_credentials(&self, id: AccountId) -> Result<Option<StoredAccount>, RepositoryError>;
    fn fetch_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<StoredAccount>, RepositoryError>;
    fn list_accounts(&self, role: Option<Role>) -> Result<Vec<Account>, RepositoryError>;
    fn set_account_active(&self, id: AccountId, active: bool) -> Result<(), RepositoryError>;
    fn set_account_password(
        &self,
        id: AccountId,
        password: &PasswordHash,
    ) -> Result<(), RepositoryError>;
}

const ACCOUNT_COLUMNS: &str = "id, email, display_name, role, program_id, company_id, intern_id, \
     active, created_at, password_hash";

fn stored_from_row(row: &Row<'_>) -> rusqlite::Result<StoredAccount> {
    Ok(StoredAccount {
        account: Account {
            id: row.get(0)?,
            email: row.get(1)?,
            display_name: row.get(2)?,
            role: parse_column(row, 3)?,
            program_id: row.get(4)?,
            company_id: row.get(5)?,
            intern_id: row.get(6)?,
            active: row.get(7)?,
            created_at: row.get(8)?,
        },
        password: PasswordHash::from_phc(row.get(9)?),
    })
}

/// Shared by intern enrollment so the intern row and its login land in one
/// transaction.
pub(crate) fn insert_account_row(
    conn: &Connection,
    record: &AccountRecord,
    now: DateTime<Utc>,
) -> rusqlite::Result<AccountId> {
    conn.execute(
        "INSERT INTO accounts (email, display_name, role, password_hash, \
         program_id, company_id, intern_id, active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8)",
        params![
            record.email,
            record.display_name,
            record.role.as_str(),
            record.password.as_str(),
            record.program_id,
            record.company_id,
            record.intern_id,
            now,
        ],
    )?;
    Ok(AccountId(conn.last_insert_rowid()))
}

impl AccountRepository for SqliteStore {
    fn insert_account(
        &self,
        record: &AccountRecord,
        now: DateTime<Utc>,
    ) -> Result<Account, RepositoryError> {
        let id = self.with_conn(|conn| insert_account_row(conn, record, now))?;
        self.fetch_account(id)?.ok_or(RepositoryError::NotFound)
    }

    fn fetch_account(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        Ok(self.fetch_credentials(id)?.map(|stored| stored.account))
    }

    fn fetch_credentials(&self, id: AccountId) -> Result<Option<StoredAccount>, RepositoryError> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1"),
                [id],
                stored_from_row,
            )
            .optional()
        })
    }

    fn fetch_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<StoredAccount>, RepositoryError> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?1 COLLATE NOCASE"),
                [email],
                stored_from_row,
            )
            .optional()
        })
    }

    fn list_accounts(&self, role: Option<Role>) -> Result<Vec<Account>, RepositoryError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ACCOUNT_COLUMNS} FROM accounts
                 WHERE (?1 IS NULL OR role = ?1)
                 ORDER BY role, display_name COLLATE NOCASE"
            ))?;
            let rows = stmt.query_map([role.map(Role::as_str)], |row| {
                stored_from_row(row).map(|stored| stored.account)
            })?;
            rows.collect()
        })
    }

    fn set_account_active(&self, id: AccountId, active: bool) -> Result<(), RepositoryError> {
        let changed = self.with_conn(|conn| {
            conn.execute(
                "UPDATE accounts SET active = ?2 WHERE id = ?1",
                params![id, active],
            )
        })?;
        if changed == 0 {
            Err(RepositoryError::NotFound)
        } else {
            Ok(())
        }
    }

    fn set_account_password(
        &self,
        id: AccountId,
        password: &PasswordHash,
    ) -> Result<(), RepositoryError> {
        let changed = self.with_conn(|conn| {
            conn.execute(
                "UPDATE accounts SET password_hash = ?2 WHERE id = ?1",
                params![id, password.as_str()],
            )
        })?;
        if changed == 0 {
            Err(RepositoryError::NotFound)
        } else {
            Ok(())
        }
    }
}
