use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};

use super::domain::{
    Enrollment, Intern, InternDraft, InternFilter, InternStatus, InternView, PlacementChange,
    PlacementRequest, ProfileUpdate, ValidIntern,
};
use super::repository::{InternQuery, InternRepository, PlacementOutcome};
use super::roster::{parse_roster, write_roster, EnrolledRow, ImportReport, RowIssue};
use crate::auth::{generate_initial_password, PasswordHash, Role, Session};
use crate::error::PortalError;
use crate::ids::{InternId, ProgramId};
use crate::internship::accounts::AccountRepository;
use crate::internship::companies::CompanyRepository;
use crate::internship::evaluations::{EvaluationPeriod, EvaluationRepository};
use crate::internship::logbook::LogbookRepository;
use crate::internship::programs::ProgramRepository;
use crate::storage::RepositoryError;

pub struct InternService<R> {
    repository: Arc<R>,
    default_required_hours: u32,
}

impl<R> InternService<R>
where
    R: InternRepository
        + AccountRepository
        + CompanyRepository
        + ProgramRepository
        + LogbookRepository
        + EvaluationRepository
        + 'static,
{
    pub fn new(repository: Arc<R>, default_required_hours: u32) -> Self {
        Self {
            repository,
            default_required_hours,
        }
    }

    pub fn enroll(
        &self,
        session: &Session,
        draft: InternDraft,
        now: DateTime<Utc>,
    ) -> Result<Enrollment, PortalError> {
        self.ensure_program_manager(session, draft.program_id)?;
        let intern = draft.validate(self.default_required_hours)?;
        self.enroll_valid(intern, now)
    }

    fn enroll_valid(&self, intern: ValidIntern, now: DateTime<Utc>) -> Result<Enrollment, PortalError> {
        let initial_password = generate_initial_password();
        let password = PasswordHash::new(&initial_password)?;
        let (created, account_id) = self
            .repository
            .enroll_intern(&intern, &password, now)
            .map_err(|err| match err {
                RepositoryError::Conflict => PortalError::conflict(format!(
                    "student number {} or email {} is already registered",
                    intern.student_number, intern.email
                )),
                other => other.into(),
            })?;
        info!(intern = %created.id, student_number = %created.student_number, "intern enrolled");
        Ok(Enrollment {
            intern: created.view(),
            account_id,
            initial_password,
        })
    }

    pub fn get(&self, session: &Session, id: InternId) -> Result<InternView, PortalError> {
        Ok(self.load_visible(session, id)?.view())
    }

    /// Loads an intern the caller is allowed to see.
    pub fn load_visible(&self, session: &Session, id: InternId) -> Result<Intern, PortalError> {
        let intern = self.load(id)?;
        session.ensure_view(&intern)?;
        Ok(intern)
    }

    pub fn list(
        &self,
        session: &Session,
        filter: InternFilter,
    ) -> Result<Vec<InternView>, PortalError> {
        let Some(query) = scoped_query(session, filter) else {
            return Ok(Vec::new());
        };
        Ok(self
            .repository
            .list_interns(&query)?
            .into_iter()
            .map(Intern::view)
            .collect())
    }

    pub fn update_profile(
        &self,
        session: &Session,
        id: InternId,
        update: ProfileUpdate,
    ) -> Result<InternView, PortalError> {
        let intern = self.load(id)?;
        session.ensure_manage(&intern)?;
        let profile = update.validate(intern.required_hours)?;
        let updated = self
            .repository
            .update_intern_profile(id, &profile)
            .map_err(|err| match err {
                RepositoryError::Conflict => {
                    PortalError::conflict(format!("email {} is already registered", profile.email))
                }
                RepositoryError::NotFound => PortalError::NotFound("intern"),
                other => other.into(),
            })?;
        info!(intern = %id, "intern profile updated");
        Ok(updated.view())
    }

    pub fn place(
        &self,
        session: &Session,
        id: InternId,
        request: PlacementRequest,
        today: NaiveDate,
    ) -> Result<InternView, PortalError> {
        session.require(&[Role::Coordinator, Role::Adviser])?;
        let intern = self.load(id)?;
        session.ensure_manage(&intern)?;
        intern.status.ensure_transition(InternStatus::Deployed)?;

        if let Some(end_date) = request.end_date {
            if end_date < request.start_date {
                return Err(PortalError::validation(
                    "end date cannot be earlier than the start date",
                ));
            }
        }

        let company = self
            .repository
            .fetch_company(request.company_id)?
            .ok_or(PortalError::NotFound("company"))?;
        let moa_status = company.moa_status(today);
        if !moa_status.allows_placement() {
            warn!(company = %company.id, status = %moa_status, "placement blocked by MOA");
            return Err(PortalError::conflict(format!(
                "{} cannot receive interns: MOA is {}",
                company.name,
                moa_status.label().to_lowercase()
            )));
        }
        if let Some(supervisor_id) = request.supervisor_id {
            let supervisor = self
                .repository
                .fetch_account(supervisor_id)?
                .ok_or(PortalError::NotFound("supervisor"))?;
            if supervisor.role != Role::Supervisor
                || supervisor.company_id != Some(company.id)
                || !supervisor.active
            {
                return Err(PortalError::validation(format!(
                    "account {supervisor_id} is not an active supervisor at {}",
                    company.name
                )));
            }
        }

        let change = PlacementChange {
            status: InternStatus::Deployed,
            company_id: Some(company.id),
            supervisor_id: request.supervisor_id,
            start_date: Some(request.start_date),
            end_date: request.end_date,
        };
        let placed = match self
            .repository
            .place_intern(id, intern.status, &change, company.slots)
        {
            Ok(PlacementOutcome::Placed(placed)) => placed,
            Ok(PlacementOutcome::Full { deployed }) => {
                return Err(PortalError::conflict(format!(
                    "{} has no open slots ({deployed} of {} filled)",
                    company.name, company.slots
                )));
            }
            Err(RepositoryError::Conflict) => {
                return Err(PortalError::conflict(
                    "intern status changed while the placement was saved",
                ));
            }
            Err(err) => return Err(err.into()),
        };
        info!(intern = %id, company = %company.id, "intern placed");
        Ok(placed.view())
    }

    pub fn unassign(&self, session: &Session, id: InternId) -> Result<InternView, PortalError> {
        session.require(&[Role::Coordinator, Role::Adviser])?;
        let intern = self.load(id)?;
        session.ensure_manage(&intern)?;
        intern.status.ensure_transition(InternStatus::Pending)?;
        if intern.status != InternStatus::Deployed {
            return Err(PortalError::validation("only deployed interns can be unassigned"));
        }
        let updated = self
            .repository
            .update_intern_placement(
                id,
                intern.status,
                &PlacementChange::cleared(InternStatus::Pending),
            )?;
        info!(intern = %id, "intern unassigned");
        Ok(updated.view())
    }

    pub fn drop_intern(&self, session: &Session, id: InternId) -> Result<InternView, PortalError> {
        session.require(&[Role::Coordinator, Role::Adviser])?;
        let intern = self.load(id)?;
        session.ensure_manage(&intern)?;
        intern.status.ensure_transition(InternStatus::Dropped)?;
        let updated = self.repository.update_intern_placement(
            id,
            intern.status,
            &PlacementChange::keep(&intern, InternStatus::Dropped),
        )?;
        info!(intern = %id, "intern dropped");
        Ok(updated.view())
    }

    pub fn reinstate(&self, session: &Session, id: InternId) -> Result<InternView, PortalError> {
        session.require(&[Role::Coordinator])?;
        let intern = self.load(id)?;
        if intern.status != InternStatus::Dropped {
            return Err(PortalError::validation("only dropped interns can be reinstated"));
        }
        let updated = self
            .repository
            .update_intern_placement(
                id,
                intern.status,
                &PlacementChange::cleared(InternStatus::Pending),
            )?;
        info!(intern = %id, "intern reinstated");
        Ok(updated.view())
    }

    pub fn complete(
        &self,
        session: &Session,
        id: InternId,
        today: NaiveDate,
    ) -> Result<InternView, PortalError> {
        session.require(&[Role::Coordinator, Role::Adviser])?;
        let intern = self.load(id)?;
        session.ensure_manage(&intern)?;
        intern.status.ensure_transition(InternStatus::Completed)?;

        let totals = self.repository.log_totals(id)?;
        let required_minutes = i64::from(intern.required_hours) * 60;
        if totals.approved_minutes < required_minutes {
            return Err(PortalError::validation(format!(
                "only {:.1} of {} required hours are approved",
                totals.approved_minutes as f64 / 60.0,
                intern.required_hours
            )));
        }
        if self
            .repository
            .fetch_evaluation_for(id, EvaluationPeriod::Final)?
            .is_none()
        {
            return Err(PortalError::validation(
                "the final evaluation has not been submitted",
            ));
        }

        let mut change = PlacementChange::keep(&intern, InternStatus::Completed);
        change.end_date = Some(intern.end_date.unwrap_or(today));
        let completed = self
            .repository
            .update_intern_placement(id, intern.status, &change)?;
        info!(intern = %id, "internship completed");
        Ok(completed.view())
    }

    pub fn import_roster<Rd: Read>(
        &self,
        session: &Session,
        program_id: ProgramId,
        school_year: &str,
        required_hours: Option<u32>,
        reader: Rd,
        now: DateTime<Utc>,
    ) -> Result<ImportReport, PortalError> {
        self.ensure_program_manager(session, program_id)?;
        let rows = parse_roster(reader)
            .map_err(|err| PortalError::validation(format!("roster is not valid CSV: {err}")))?;

        let mut report = ImportReport::default();
        for parsed in rows {
            let row = match parsed.row {
                Ok(row) => row,
                Err(reason) => {
                    report.failed.push(RowIssue {
                        line: parsed.line,
                        student_number: None,
                        reason,
                    });
                    continue;
                }
            };
            let raw_number = row.student_number.clone();
            let draft = row.into_draft(program_id, school_year, required_hours);
            let intern = match draft.validate(self.default_required_hours) {
                Ok(intern) => intern,
                Err(err) => {
                    report.failed.push(RowIssue {
                        line: parsed.line,
                        student_number: Some(raw_number),
                        reason: err.to_string(),
                    });
                    continue;
                }
            };
            if self
                .repository
                .find_intern_by_student_number(&intern.student_number)?
                .is_some()
            {
                report.skipped.push(RowIssue {
                    line: parsed.line,
                    student_number: Some(intern.student_number),
                    reason: "already enrolled".to_string(),
                });
                continue;
            }

            let student_number = intern.student_number.clone();
            match self.enroll_valid(intern, now) {
                Ok(enrollment) => report.enrolled.push(EnrolledRow {
                    line: parsed.line,
                    student_number,
                    intern_id: enrollment.intern.intern.id,
                    account_id: enrollment.account_id,
                    initial_password: enrollment.initial_password,
                }),
                Err(PortalError::Conflict(reason)) => report.skipped.push(RowIssue {
                    line: parsed.line,
                    student_number: Some(student_number),
                    reason,
                }),
                Err(err) => return Err(err),
            }
        }

        info!(
            program = %program_id,
            enrolled = report.enrolled.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "roster imported"
        );
        Ok(report)
    }

    pub fn export_roster(
        &self,
        session: &Session,
        program_id: ProgramId,
    ) -> Result<String, PortalError> {
        session.require(&[Role::Coordinator, Role::Adviser])?;
        let interns = self.program_roster(session, program_id)?;
        let companies: HashMap<_, _> = self
            .repository
            .list_companies()?
            .into_iter()
            .map(|company| (company.id, company.name))
            .collect();
        let rows = interns.iter().map(|intern| {
            let company = intern
                .company_id
                .and_then(|id| companies.get(&id))
                .map_or("", String::as_str);
            (intern, company)
        });
        write_roster(rows)
            .map_err(|err| PortalError::validation(format!("roster export failed: {err}")))
    }

    /// Interns of one program, after checking the caller may see it.
    pub fn program_roster(
        &self,
        session: &Session,
        program_id: ProgramId,
    ) -> Result<Vec<Intern>, PortalError> {
        if self.repository.fetch_program(program_id)?.is_none() {
            return Err(PortalError::NotFound("program"));
        }
        if session.is(Role::Adviser) && session.program_id != Some(program_id) {
            return Err(PortalError::forbidden("program is outside your scope"));
        }
        let filter = InternFilter {
            program_id: Some(program_id),
            ..InternFilter::default()
        };
        Ok(scoped_query(session, filter)
            .map(|query| self.repository.list_interns(&query))
            .transpose()?
            .unwrap_or_default())
    }

    fn load(&self, id: InternId) -> Result<Intern, PortalError> {
        self.repository
            .fetch_intern(id)?
            .ok_or(PortalError::NotFound("intern"))
    }

    fn ensure_program_manager(
        &self,
        session: &Session,
        program_id: ProgramId,
    ) -> Result<(), PortalError> {
        session.require(&[Role::Coordinator, Role::Adviser])?;
        if session.is(Role::Adviser) && session.program_id != Some(program_id) {
            return Err(PortalError::forbidden(
                "advisers can only enroll interns into their own program",
            ));
        }
        if self.repository.fetch_program(program_id)?.is_none() {
            return Err(PortalError::NotFound("program"));
        }
        Ok(())
    }
}

/// Narrows user filters to the caller's scope; `None` means nothing is visible.
pub(crate) fn scoped_query(session: &Session, filter: InternFilter) -> Option<InternQuery> {
    let mut query = InternQuery {
        program_id: filter.program_id,
        company_id: filter.company_id,
        intern_id: None,
        status: filter.status,
        search: filter.q.filter(|q| !q.trim().is_empty()),
    };

    fn narrow<T: PartialEq + Copy>(requested: Option<T>, scope: Option<T>) -> Option<Option<T>> {
        match (requested, scope) {
            (_, None) => None,
            (Some(requested), Some(scope)) if requested != scope => None,
            (_, scope) => Some(scope),
        }
    }

    match session.role {
        Role::Coordinator => {}
        Role::Adviser => query.program_id = narrow(filter.program_id, session.program_id)?,
        Role::Supervisor => query.company_id = narrow(filter.company_id, session.company_id)?,
        Role::Intern => query.intern_id = Some(session.intern_id?),
    }
    Some(query)
}
