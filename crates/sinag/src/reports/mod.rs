//! Printable PDF reports: intern activity, evaluations and program rosters.

mod canvas;
pub mod render;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use chrono::NaiveDate;
use tracing::info;

use crate::auth::{Role, Session};
use crate::error::PortalError;
use crate::extract::Path;
use crate::ids::{AccountId, EvaluationId, InternId, ProgramId};
use crate::internship::accounts::AccountRepository;
use crate::internship::companies::CompanyRepository;
use crate::internship::evaluations::EvaluationRepository;
use crate::internship::interns::{Intern, InternQuery, InternRepository};
use crate::internship::logbook::{HoursSummary, LogRange, LogbookRepository};
use crate::internship::programs::ProgramRepository;
use crate::internship::review::ReviewStatus;
use crate::internship::{today, PortalState, Store};
pub use render::{ActivitySheet, EvaluationSheet, RosterSheet};

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("PDF rendering failed: {0}")]
    Pdf(String),
}

impl ReportError {
    pub(crate) fn pdf(err: impl fmt::Display) -> Self {
        Self::Pdf(err.to_string())
    }
}

/// Builds report PDFs from stored records.
///
/// The `*_pdf` methods skip caller scoping and back the operator CLI; the
/// session-taking methods check visibility first.
pub struct ReportService<R> {
    repository: Arc<R>,
}

impl<R> ReportService<R>
where
    R: InternRepository
        + ProgramRepository
        + CompanyRepository
        + AccountRepository
        + LogbookRepository
        + EvaluationRepository
        + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn intern_activity(
        &self,
        session: &Session,
        intern_id: InternId,
        today: NaiveDate,
    ) -> Result<Vec<u8>, PortalError> {
        let intern = self.load_intern(intern_id)?;
        session.ensure_view(&intern)?;
        self.activity(intern, today)
    }

    pub fn intern_activity_pdf(
        &self,
        intern_id: InternId,
        today: NaiveDate,
    ) -> Result<Vec<u8>, PortalError> {
        let intern = self.load_intern(intern_id)?;
        self.activity(intern, today)
    }

    pub fn evaluation(&self, session: &Session, id: EvaluationId) -> Result<Vec<u8>, PortalError> {
        let evaluation = self
            .repository
            .fetch_evaluation(id)?
            .ok_or(PortalError::NotFound("evaluation"))?;
        let intern = self.load_intern(evaluation.intern_id)?;
        session.ensure_view(&intern)?;

        let company = match intern.company_id {
            Some(company_id) => self.repository.fetch_company(company_id)?,
            None => None,
        };
        let evaluator = self.display_name(Some(evaluation.evaluator_id))?;
        let bytes = render::evaluation_report(&EvaluationSheet {
            evaluation,
            intern,
            company,
            evaluator,
        })?;
        info!(evaluation = %id, bytes = bytes.len(), "evaluation report rendered");
        Ok(bytes)
    }

    pub fn program_roster(
        &self,
        session: &Session,
        program_id: ProgramId,
        today: NaiveDate,
    ) -> Result<Vec<u8>, PortalError> {
        session.require(&[Role::Coordinator, Role::Adviser])?;
        if session.is(Role::Adviser) && session.program_id != Some(program_id) {
            return Err(PortalError::forbidden("program is outside your scope"));
        }
        self.program_roster_pdf(program_id, today)
    }

    pub fn program_roster_pdf(
        &self,
        program_id: ProgramId,
        today: NaiveDate,
    ) -> Result<Vec<u8>, PortalError> {
        let program = self
            .repository
            .fetch_program(program_id)?
            .ok_or(PortalError::NotFound("program"))?;
        let companies: HashMap<_, _> = self
            .repository
            .list_companies()?
            .into_iter()
            .map(|company| (company.id, company.name))
            .collect();
        let query = InternQuery {
            program_id: Some(program_id),
            ..InternQuery::default()
        };
        let interns = self
            .repository
            .list_interns(&query)?
            .into_iter()
            .map(|intern| {
                let company = intern.company_id.and_then(|id| companies.get(&id).cloned());
                (intern, company)
            })
            .collect();

        let bytes = render::roster_report(&RosterSheet {
            program,
            interns,
            generated_on: today,
        })?;
        info!(program = %program_id, bytes = bytes.len(), "roster report rendered");
        Ok(bytes)
    }

    fn activity(&self, intern: Intern, today: NaiveDate) -> Result<Vec<u8>, PortalError> {
        let approved = LogRange {
            status: Some(ReviewStatus::Approved),
            ..LogRange::default()
        };
        let logs = self.repository.list_logs(intern.id, &approved)?;
        let hours = HoursSummary::new(
            intern.id,
            intern.required_hours,
            self.repository.log_totals(intern.id)?,
        );
        let program = self.repository.fetch_program(intern.program_id)?;
        let company = match intern.company_id {
            Some(company_id) => self.repository.fetch_company(company_id)?,
            None => None,
        };
        let supervisor = self.display_name(intern.supervisor_id)?;
        let intern_id = intern.id;

        let bytes = render::activity_report(&ActivitySheet {
            intern,
            program,
            company,
            supervisor,
            logs,
            hours,
            generated_on: today,
        })?;
        info!(intern = %intern_id, bytes = bytes.len(), "activity report rendered");
        Ok(bytes)
    }

    fn display_name(&self, id: Option<AccountId>) -> Result<Option<String>, PortalError> {
        Ok(match id {
            Some(id) => self
                .repository
                .fetch_account(id)?
                .map(|account| account.display_name),
            None => None,
        })
    }

    fn load_intern(&self, id: InternId) -> Result<Intern, PortalError> {
        self.repository
            .fetch_intern(id)?
            .ok_or(PortalError::NotFound("intern"))
    }
}

pub fn report_routes<S: Store>() -> Router<PortalState<S>> {
    Router::new()
        .route(
            "/api/v1/reports/interns/:intern_id/activity",
            get(activity_handler::<S>),
        )
        .route(
            "/api/v1/reports/evaluations/:evaluation_id",
            get(evaluation_handler::<S>),
        )
        .route(
            "/api/v1/reports/programs/:program_id/roster",
            get(roster_handler::<S>),
        )
}

fn pdf_response(bytes: Vec<u8>, file_name: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, mime::APPLICATION_PDF.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

pub(crate) async fn activity_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Path(intern_id): Path<i64>,
) -> Result<Response, PortalError> {
    let bytes = state
        .reports
        .intern_activity(&session, InternId(intern_id), today())?;
    Ok(pdf_response(bytes, format!("activity-{intern_id}.pdf")))
}

pub(crate) async fn evaluation_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Path(evaluation_id): Path<i64>,
) -> Result<Response, PortalError> {
    let bytes = state
        .reports
        .evaluation(&session, EvaluationId(evaluation_id))?;
    Ok(pdf_response(bytes, format!("evaluation-{evaluation_id}.pdf")))
}

pub(crate) async fn roster_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Path(program_id): Path<i64>,
) -> Result<Response, PortalError> {
    let bytes = state
        .reports
        .program_roster(&session, ProgramId(program_id), today())?;
    Ok(pdf_response(bytes, format!("roster-{program_id}.pdf")))
}
