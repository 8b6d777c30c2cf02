use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use super::domain::{Evaluation, EvaluationDraft};
use super::repository::EvaluationRepository;
use crate::auth::{Role, Session};
use crate::error::PortalError;
use crate::ids::{EvaluationId, InternId};
use crate::internship::interns::{Intern, InternRepository, InternStatus};
use crate::storage::RepositoryError;

pub struct EvaluationService<R> {
    repository: Arc<R>,
}

impl<R> EvaluationService<R>
where
    R: EvaluationRepository + InternRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn submit(
        &self,
        session: &Session,
        intern_id: InternId,
        draft: EvaluationDraft,
        now: DateTime<Utc>,
    ) -> Result<Evaluation, PortalError> {
        session.require(&[Role::Supervisor])?;
        let intern = self.load_intern(intern_id)?;
        if session.company_id.is_none() || session.company_id != intern.company_id {
            return Err(PortalError::forbidden(
                "only supervisors at the intern's host company can evaluate",
            ));
        }
        if intern.status != InternStatus::Deployed {
            return Err(PortalError::validation(
                "evaluations are accepted only for deployed interns",
            ));
        }

        let evaluation = draft.validate()?;
        let period = evaluation.period;
        let created = self
            .repository
            .insert_evaluation(intern_id, session.account_id, &evaluation, now)
            .map_err(|err| match err {
                RepositoryError::Conflict => PortalError::conflict(format!(
                    "the {} for this intern was already submitted",
                    period.label().to_lowercase()
                )),
                other => other.into(),
            })?;
        info!(
            intern = %intern_id,
            period = %period,
            average = created.score.average,
            evaluator = %session.account_id,
            "evaluation submitted"
        );
        Ok(created)
    }

    pub fn list_for_intern(
        &self,
        session: &Session,
        intern_id: InternId,
    ) -> Result<Vec<Evaluation>, PortalError> {
        let intern = self.load_intern(intern_id)?;
        session.ensure_view(&intern)?;
        Ok(self.repository.list_evaluations(intern_id)?)
    }

    pub fn get(&self, session: &Session, id: EvaluationId) -> Result<Evaluation, PortalError> {
        Ok(self.get_with_intern(session, id)?.0)
    }

    /// The evaluation with its intern, after the caller's scope check.
    pub fn get_with_intern(
        &self,
        session: &Session,
        id: EvaluationId,
    ) -> Result<(Evaluation, Intern), PortalError> {
        let evaluation = self
            .repository
            .fetch_evaluation(id)?
            .ok_or(PortalError::NotFound("evaluation"))?;
        let intern = self.load_intern(evaluation.intern_id)?;
        session.ensure_view(&intern)?;
        Ok((evaluation, intern))
    }

    fn load_intern(&self, id: InternId) -> Result<Intern, PortalError> {
        self.repository
            .fetch_intern(id)?
            .ok_or(PortalError::NotFound("intern"))
    }
}
