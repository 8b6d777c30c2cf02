//! Academic programs. Advisers and interns each belong to exactly one.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{Role, Session};
use crate::error::PortalError;
use crate::extract::Json;
use crate::ids::ProgramId;
use crate::internship::{PortalState, Store};
use crate::storage::{RepositoryError, SqliteStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub id: ProgramId,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProgram {
    pub code: String,
    pub name: String,
}

impl NewProgram {
    /// Upper-cases the code and checks both fields.
    pub fn normalized(self) -> Result<Self, PortalError> {
        let code = self.code.trim().to_ascii_uppercase();
        if !(2..=16).contains(&code.len()) || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(PortalError::validation(
                "program code must be 2 to 16 letters or digits",
            ));
        }
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(PortalError::validation("program name is required"));
        }
        Ok(Self { code, name })
    }
}

pub trait ProgramRepository: Send + Sync {
    fn insert_program(
        &self,
        program: &NewProgram,
        now: DateTime<Utc>,
    ) -> Result<Program, RepositoryError>;
    fn fetch_program(&self, id: ProgramId) -> Result<Option<Program>, RepositoryError>;
    fn list_programs(&self) -> Result<Vec<Program>, RepositoryError>;
}

fn program_from_row(row: &Row<'_>) -> rusqlite::Result<Program> {
    Ok(Program {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
    })
}

impl ProgramRepository for SqliteStore {
    fn insert_program(
        &self,
        program: &NewProgram,
        now: DateTime<Utc>,
    ) -> Result<Program, RepositoryError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO programs (code, name, created_at) VALUES (?1, ?2, ?3)",
                params![program.code, program.name, now],
            )?;
            Ok(Program {
                id: ProgramId(conn.last_insert_rowid()),
                code: program.code.clone(),
                name: program.name.clone(),
            })
        })
    }

    fn fetch_program(&self, id: ProgramId) -> Result<Option<Program>, RepositoryError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, code, name FROM programs WHERE id = ?1",
                [id],
                program_from_row,
            )
            .optional()
        })
    }

    fn list_programs(&self) -> Result<Vec<Program>, RepositoryError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, code, name FROM programs ORDER BY code")?;
            let rows = stmt.query_map([], program_from_row)?;
            rows.collect()
        })
    }
}

pub struct ProgramService<R> {
    repository: Arc<R>,
}

impl<R> ProgramService<R>
where
    R: ProgramRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn create(
        &self,
        session: &Session,
        program: NewProgram,
        now: DateTime<Utc>,
    ) -> Result<Program, PortalError> {
        session.require(&[Role::Coordinator])?;
        let program = program.normalized()?;
        let created = self
            .repository
            .insert_program(&program, now)
            .map_err(|err| match err {
                RepositoryError::Conflict => {
                    PortalError::conflict(format!("program {} already exists", program.code))
                }
                other => other.into(),
            })?;
        info!(program = %created.code, "program created");
        Ok(created)
    }

    pub fn list(&self) -> Result<Vec<Program>, PortalError> {
        Ok(self.repository.list_programs()?)
    }

    pub fn get(&self, id: ProgramId) -> Result<Program, PortalError> {
        self.repository
            .fetch_program(id)?
            .ok_or(PortalError::NotFound("program"))
    }
}

pub fn program_routes<S: Store>() -> Router<PortalState<S>> {
    Router::new().route(
        "/api/v1/programs",
        get(list_handler::<S>).post(create_handler::<S>),
    )
}

pub(crate) async fn list_handler<S: Store>(
    State(state): State<PortalState<S>>,
    _session: Session,
) -> Result<Json<Vec<Program>>, PortalError> {
    Ok(Json(state.programs.list()?))
}

pub(crate) async fn create_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Json(program): Json<NewProgram>,
) -> Result<(StatusCode, Json<Program>), PortalError> {
    let created = state.programs.create(&session, program, Utc::now())?;
    Ok((StatusCode::CREATED, Json(created)))
}
