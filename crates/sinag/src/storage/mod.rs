//! Persistent storage for the portal.
//!
//! A single `SQLite` connection guarded by a mutex backs every repository
//! trait in [`crate::internship`]. The repository implementations live next
//! to their domain modules; this module only owns the connection, the schema
//! and the error mapping.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use rusqlite::types::Type;
use rusqlite::{ffi, Connection, ErrorCode, Row};
use tracing::{debug, info};

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, _)
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                // Foreign key failures are constraint violations too; only
                // uniqueness means the record already exists.
                match failure.extended_code {
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        Self::Conflict
                    }
                    _ => Self::Unavailable(err.to_string()),
                }
            }
            rusqlite::Error::QueryReturnedNoRows => Self::NotFound,
            _ => Self::Unavailable(err.to_string()),
        }
    }
}

/// Raised when a stored enum column holds a value the code no longer knows.
#[derive(Debug, thiserror::Error)]
#[error("unrecognised stored value '{0}'")]
pub struct UnknownVariant(pub String);

/// `SQLite` backed store implementing every repository trait.
#[derive(Debug)]
pub struct SqliteStore {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the database, creating parent directories as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|err| {
                    RepositoryError::Unavailable(format!(
                        "cannot create {}: {err}",
                        parent.display()
                    ))
                })?;
            }
        }

        debug!("opening database at {}", path.display());
        let conn = Connection::open(&path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;
        let version = migrations::initialize_schema(&conn)?;

        info!(schema_version = version, "database ready at {}", path.display());
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, RepositoryError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(conn),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema_version(&self) -> Result<i32, RepositoryError> {
        let guard = self
            .conn
            .lock()
            .map_err(|_| RepositoryError::Unavailable("connection mutex poisoned".to_string()))?;
        migrations::schema_version(&guard)
    }

    /// Run `f` against the connection.
    pub(crate) fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, rusqlite::Error>,
    ) -> Result<T, RepositoryError> {
        let guard = self
            .conn
            .lock()
            .map_err(|_| RepositoryError::Unavailable("connection mutex poisoned".to_string()))?;
        f(&guard).map_err(RepositoryError::from)
    }

    /// Run `f` inside a transaction that commits only when `f` succeeds.
    pub(crate) fn with_transaction<T>(
        &self,
        f: impl FnOnce(&rusqlite::Transaction<'_>) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| RepositoryError::Unavailable("connection mutex poisoned".to_string()))?;
        let tx = guard.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

/// Read a TEXT column into any `FromStr` enum.
pub(crate) fn parse_column<T>(row: &Row<'_>, idx: usize) -> Result<T, rusqlite::Error>
where
    T: FromStr<Err = UnknownVariant>,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

/// Escape a user supplied fragment for a `LIKE ... ESCAPE '\'` clause.
pub(crate) fn like_pattern(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len() + 2);
    escaped.push('%');
    for ch in fragment.trim().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("sinag.db");
        let store = SqliteStore::open(&path).expect("store opens");
        assert!(path.exists());
        assert_eq!(store.path(), path.as_path());
    }

    #[test]
    fn unique_violation_maps_to_conflict() {
        let store = SqliteStore::open_in_memory().expect("store");
        let insert = |conn: &Connection| {
            conn.execute(
                "INSERT INTO programs (code, name, created_at) VALUES ('BSIT', 'IT', '2025-01-01T00:00:00Z')",
                [],
            )
        };
        store.with_conn(insert).expect("first insert");
        assert!(matches!(
            store.with_conn(insert),
            Err(RepositoryError::Conflict)
        ));
    }

    #[test]
    fn foreign_key_violation_is_not_a_conflict() {
        let store = SqliteStore::open_in_memory().expect("store");
        let result = store.with_conn(|conn| {
            conn.execute(
                "INSERT INTO documents (intern_id, kind, file_name, content_type, storage_key, size_bytes, status, uploaded_at)
                 VALUES (999, 'resume', 'cv.pdf', 'application/pdf', 'k', 1, 'pending', '2025-01-01T00:00:00Z')",
                [],
            )
        });
        assert!(matches!(result, Err(RepositoryError::Unavailable(_))));
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(" dela_cruz "), "%dela\\_cruz%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
    }
}
