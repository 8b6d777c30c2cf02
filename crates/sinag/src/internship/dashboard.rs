//! Role-specific landing page aggregates.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use chrono::NaiveDate;
use serde::Serialize;

use crate::auth::{Role, Session};
use crate::error::PortalError;
use crate::extract::Json;
use crate::ids::{InternId, ProgramId};
use crate::internship::companies::{CompanyRepository, CompanyView, MoaStatus};
use crate::internship::documents::{Checklist, DocumentRepository};
use crate::internship::evaluations::{Evaluation, EvaluationPeriod, EvaluationRepository};
use crate::internship::interns::service::scoped_query;
use crate::internship::interns::{
    Intern, InternFilter, InternRepository, InternStatus, InternView,
};
use crate::internship::logbook::{HoursSummary, LogbookRepository};
use crate::internship::programs::{Program, ProgramRepository};
use crate::internship::{today, PortalState, Store};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub pending: usize,
    pub deployed: usize,
    pub completed: usize,
    pub dropped: usize,
}

impl StatusCounts {
    pub fn tally<'a>(interns: impl IntoIterator<Item = &'a Intern>) -> Self {
        interns
            .into_iter()
            .fold(Self::default(), |mut counts, intern| {
                counts.total += 1;
                match intern.status {
                    InternStatus::Pending => counts.pending += 1,
                    InternStatus::Deployed => counts.deployed += 1,
                    InternStatus::Completed => counts.completed += 1,
                    InternStatus::Dropped => counts.dropped += 1,
                }
                counts
            })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgramBreakdown {
    pub program_id: ProgramId,
    pub code: String,
    pub name: String,
    pub total: usize,
    pub deployed: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequirementGap {
    pub intern_id: InternId,
    pub full_name: String,
    pub approved: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationDue {
    pub intern_id: InternId,
    pub full_name: String,
    pub missing: Vec<EvaluationPeriod>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequirementProgress {
    pub approved: usize,
    pub total: usize,
    pub percent_complete: u8,
}

impl From<&Checklist> for RequirementProgress {
    fn from(checklist: &Checklist) -> Self {
        Self {
            approved: checklist.approved,
            total: checklist.total,
            percent_complete: checklist.percent_complete,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Dashboard {
    Coordinator {
        interns: StatusCounts,
        programs: Vec<ProgramBreakdown>,
        company_count: usize,
        moa_expiring: Vec<CompanyView>,
        moa_expired: Vec<CompanyView>,
        pending_document_reviews: usize,
    },
    Adviser {
        program: Option<Program>,
        interns: StatusCounts,
        pending_document_reviews: usize,
        incomplete_requirements: Vec<RequirementGap>,
    },
    Supervisor {
        company: Option<CompanyView>,
        interns: StatusCounts,
        pending_log_reviews: u32,
        evaluations_due: Vec<EvaluationDue>,
    },
    Intern {
        intern: InternView,
        company: Option<CompanyView>,
        hours: HoursSummary,
        requirements: RequirementProgress,
        evaluations: Vec<Evaluation>,
    },
}

pub struct DashboardService<R> {
    repository: Arc<R>,
}

impl<R> DashboardService<R>
where
    R: InternRepository
        + ProgramRepository
        + CompanyRepository
        + DocumentRepository
        + LogbookRepository
        + EvaluationRepository
        + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn for_session(&self, session: &Session, today: NaiveDate) -> Result<Dashboard, PortalError> {
        let interns = match scoped_query(session, InternFilter::default()) {
            Some(query) => self.repository.list_interns(&query)?,
            None => Vec::new(),
        };
        match session.role {
            Role::Coordinator => self.coordinator(session, &interns, today),
            Role::Adviser => self.adviser(session, &interns),
            Role::Supervisor => self.supervisor(session, &interns, today),
            Role::Intern => self.intern(interns, today),
        }
    }

    fn coordinator(
        &self,
        session: &Session,
        interns: &[Intern],
        today: NaiveDate,
    ) -> Result<Dashboard, PortalError> {
        let programs = self
            .repository
            .list_programs()?
            .into_iter()
            .map(|program| {
                let members: Vec<&Intern> = interns
                    .iter()
                    .filter(|intern| intern.program_id == program.id)
                    .collect();
                let counts = StatusCounts::tally(members);
                ProgramBreakdown {
                    program_id: program.id,
                    code: program.code,
                    name: program.name,
                    total: counts.total,
                    deployed: counts.deployed,
                    completed: counts.completed,
                }
            })
            .collect();

        let companies: Vec<CompanyView> = self
            .repository
            .list_companies()?
            .into_iter()
            .map(|company| company.view(today))
            .collect();
        let company_count = companies.len();
        let (moa_expiring, moa_expired) = companies.into_iter().fold(
            (Vec::new(), Vec::new()),
            |(mut expiring, mut expired), company| {
                match company.moa_status {
                    MoaStatus::Expiring => expiring.push(company),
                    MoaStatus::Expired => expired.push(company),
                    _ => {}
                }
                (expiring, expired)
            },
        );

        Ok(Dashboard::Coordinator {
            interns: StatusCounts::tally(interns),
            programs,
            company_count,
            moa_expiring,
            moa_expired,
            pending_document_reviews: self.pending_documents(session)?,
        })
    }

    fn adviser(&self, session: &Session, interns: &[Intern]) -> Result<Dashboard, PortalError> {
        let program = match session.program_id {
            Some(id) => self.repository.fetch_program(id)?,
            None => None,
        };
        let mut incomplete_requirements = Vec::new();
        for intern in interns
            .iter()
            .filter(|intern| intern.status != InternStatus::Dropped)
        {
            let checklist = Checklist::build(intern.id, self.repository.list_documents(intern.id)?);
            if !checklist.is_complete() {
                incomplete_requirements.push(RequirementGap {
                    intern_id: intern.id,
                    full_name: intern.full_name(),
                    approved: checklist.approved,
                    total: checklist.total,
                });
            }
        }

        Ok(Dashboard::Adviser {
            program,
            interns: StatusCounts::tally(interns),
            pending_document_reviews: self.pending_documents(session)?,
            incomplete_requirements,
        })
    }

    fn supervisor(
        &self,
        session: &Session,
        interns: &[Intern],
        today: NaiveDate,
    ) -> Result<Dashboard, PortalError> {
        let company = match session.company_id {
            Some(id) => self
                .repository
                .fetch_company(id)?
                .map(|company| company.view(today)),
            None => None,
        };
        let pending_log_reviews = match scoped_query(session, InternFilter::default()) {
            Some(scope) => self.repository.count_pending_logs(&scope)?,
            None => 0,
        };

        let mut evaluations_due = Vec::new();
        for intern in interns
            .iter()
            .filter(|intern| intern.status == InternStatus::Deployed)
        {
            let submitted: Vec<EvaluationPeriod> = self
                .repository
                .list_evaluations(intern.id)?
                .into_iter()
                .map(|evaluation| evaluation.period)
                .collect();
            let missing: Vec<EvaluationPeriod> = [EvaluationPeriod::Midterm, EvaluationPeriod::Final]
                .into_iter()
                .filter(|period| !submitted.contains(period))
                .collect();
            if !missing.is_empty() {
                evaluations_due.push(EvaluationDue {
                    intern_id: intern.id,
                    full_name: intern.full_name(),
                    missing,
                });
            }
        }

        Ok(Dashboard::Supervisor {
            company,
            interns: StatusCounts::tally(interns),
            pending_log_reviews,
            evaluations_due,
        })
    }

    fn intern(&self, interns: Vec<Intern>, today: NaiveDate) -> Result<Dashboard, PortalError> {
        let intern = interns
            .into_iter()
            .next()
            .ok_or(PortalError::NotFound("intern"))?;
        let company = match intern.company_id {
            Some(id) => self
                .repository
                .fetch_company(id)?
                .map(|company| company.view(today)),
            None => None,
        };
        let hours = HoursSummary::new(
            intern.id,
            intern.required_hours,
            self.repository.log_totals(intern.id)?,
        );
        let checklist = Checklist::build(intern.id, self.repository.list_documents(intern.id)?);
        let evaluations = self.repository.list_evaluations(intern.id)?;

        Ok(Dashboard::Intern {
            company,
            hours,
            requirements: RequirementProgress::from(&checklist),
            evaluations,
            intern: intern.view(),
        })
    }

    fn pending_documents(&self, session: &Session) -> Result<usize, PortalError> {
        Ok(match scoped_query(session, InternFilter::default()) {
            Some(scope) => self.repository.list_pending_documents(&scope)?.len(),
            None => 0,
        })
    }
}

pub fn dashboard_routes<S: Store>() -> Router<PortalState<S>> {
    Router::new().route("/api/v1/dashboard", get(dashboard_handler::<S>))
}

pub(crate) async fn dashboard_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
) -> Result<Json<Dashboard>, PortalError> {
    Ok(Json(state.dashboard.for_session(&session, today())?))
}
