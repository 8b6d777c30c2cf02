use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;

use super::domain::{ActivityLog, HoursSummary, LogDraft, LogRange};
use super::repository::LogbookRepository;
use crate::auth::{Role, Session};
use crate::error::PortalError;
use crate::ids::{InternId, LogId};
use crate::internship::interns::{Intern, InternRepository, InternStatus};
use crate::internship::review::{ReviewRequest, ReviewStatus};
use crate::storage::RepositoryError;

pub struct LogbookService<R> {
    repository: Arc<R>,
}

impl<R> LogbookService<R>
where
    R: LogbookRepository + InternRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn submit(
        &self,
        session: &Session,
        intern_id: InternId,
        draft: LogDraft,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<ActivityLog, PortalError> {
        let intern = self.load_own_intern(session, intern_id)?;
        let log = draft.validate(intern.start_date, today)?;
        let created = self
            .repository
            .insert_log(intern.id, &log, now)
            .map_err(|err| duplicate_date(err, log.log_date))?;
        info!(intern = %intern.id, log = %created.id, date = %created.log_date, "activity logged");
        Ok(created)
    }

    pub fn update(
        &self,
        session: &Session,
        id: LogId,
        draft: LogDraft,
        today: NaiveDate,
    ) -> Result<ActivityLog, PortalError> {
        let existing = self.load_editable(session, id)?;
        let intern = self.load_own_intern(session, existing.intern_id)?;
        let log = draft.validate(intern.start_date, today)?;
        let updated = self
            .repository
            .update_log(id, &log)
            .map_err(|err| duplicate_date(err, log.log_date))?;
        info!(log = %id, "activity log edited");
        Ok(updated)
    }

    pub fn delete(&self, session: &Session, id: LogId) -> Result<(), PortalError> {
        self.load_editable(session, id)?;
        self.repository.delete_log(id)?;
        info!(log = %id, "activity log deleted");
        Ok(())
    }

    pub fn list(
        &self,
        session: &Session,
        intern_id: InternId,
        range: LogRange,
    ) -> Result<Vec<ActivityLog>, PortalError> {
        let intern = self.load_intern(intern_id)?;
        session.ensure_view(&intern)?;
        Ok(self.repository.list_logs(intern_id, &range)?)
    }

    pub fn review(
        &self,
        session: &Session,
        id: LogId,
        request: ReviewRequest,
        now: DateTime<Utc>,
    ) -> Result<ActivityLog, PortalError> {
        session.require(&[Role::Coordinator, Role::Supervisor])?;
        let log = self.load_log(id)?;
        let intern = self.load_intern(log.intern_id)?;
        if session.is(Role::Supervisor)
            && (session.company_id.is_none() || session.company_id != intern.company_id)
        {
            return Err(PortalError::forbidden(
                "only the intern's host supervisor can review this log",
            ));
        }
        if log.status != ReviewStatus::Pending {
            return Err(PortalError::conflict(format!(
                "log for {} is already {}",
                log.log_date, log.status
            )));
        }
        let verdict = request.into_verdict()?;
        let reviewed = self
            .repository
            .record_log_review(id, &verdict, session.account_id, now)?;
        info!(
            log = %id,
            intern = %intern.id,
            status = %reviewed.status,
            reviewer = %session.account_id,
            "activity log reviewed"
        );
        Ok(reviewed)
    }

    pub fn summary(&self, session: &Session, intern_id: InternId) -> Result<HoursSummary, PortalError> {
        let intern = self.load_intern(intern_id)?;
        session.ensure_view(&intern)?;
        self.summary_for(&intern)
    }

    pub(crate) fn summary_for(&self, intern: &Intern) -> Result<HoursSummary, PortalError> {
        let totals = self.repository.log_totals(intern.id)?;
        Ok(HoursSummary::new(intern.id, intern.required_hours, totals))
    }

    fn load_own_intern(&self, session: &Session, intern_id: InternId) -> Result<Intern, PortalError> {
        session.require(&[Role::Intern])?;
        if session.intern_id != Some(intern_id) {
            return Err(PortalError::forbidden("interns can only keep their own logbook"));
        }
        let intern = self.load_intern(intern_id)?;
        if intern.status != InternStatus::Deployed {
            return Err(PortalError::validation(
                "activity logs are accepted only while deployed",
            ));
        }
        Ok(intern)
    }

    fn load_editable(&self, session: &Session, id: LogId) -> Result<ActivityLog, PortalError> {
        let log = self.load_log(id)?;
        if session.intern_id != Some(log.intern_id) {
            return Err(PortalError::forbidden("only the intern who logged it can change it"));
        }
        if log.status != ReviewStatus::Pending {
            return Err(PortalError::conflict(format!(
                "log is already {} and can no longer change",
                log.status
            )));
        }
        Ok(log)
    }

    fn load_log(&self, id: LogId) -> Result<ActivityLog, PortalError> {
        self.repository
            .fetch_log(id)?
            .ok_or(PortalError::NotFound("activity log"))
    }

    fn load_intern(&self, id: InternId) -> Result<Intern, PortalError> {
        self.repository
            .fetch_intern(id)?
            .ok_or(PortalError::NotFound("intern"))
    }
}

fn duplicate_date(err: RepositoryError, date: NaiveDate) -> PortalError {
    match err {
        RepositoryError::Conflict => {
            PortalError::conflict(format!("an activity log for {date} already exists"))
        }
        RepositoryError::NotFound => PortalError::NotFound("activity log"),
        other => other.into(),
    }
}
