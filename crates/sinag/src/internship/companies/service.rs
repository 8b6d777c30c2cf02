use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;

use super::domain::{parse_moa_pair, CompanyDraft, CompanyView, MoaStatus, Occupancy};
use super::repository::CompanyRepository;
use crate::auth::{Role, Session};
use crate::error::PortalError;
use crate::ids::CompanyId;
use crate::internship::interns::InternRepository;
use crate::storage::RepositoryError;

/// Replacement MOA dates; both `null` clears the agreement.
#[derive(Debug, Clone, Deserialize)]
pub struct MoaUpdate {
    pub signed_on: Option<NaiveDate>,
    pub expires_on: Option<NaiveDate>,
}

pub struct CompanyService<R> {
    repository: Arc<R>,
}

impl<R> CompanyService<R>
where
    R: CompanyRepository + InternRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn create(
        &self,
        session: &Session,
        draft: CompanyDraft,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<CompanyView, PortalError> {
        session.require(&[Role::Coordinator])?;
        let company = draft.validate()?;
        let created = self
            .repository
            .insert_company(&company, now)
            .map_err(|err| duplicate_name(err, &company.name))?;
        info!(company = %created.id, name = %created.name, "company registered");
        Ok(created.view(today))
    }

    pub fn update(
        &self,
        session: &Session,
        id: CompanyId,
        draft: CompanyDraft,
        today: NaiveDate,
    ) -> Result<CompanyView, PortalError> {
        session.require(&[Role::Coordinator])?;
        let company = draft.validate()?;
        let deployed = self.repository.count_deployed_at(id)?;
        if company.slots < deployed {
            return Err(PortalError::validation(format!(
                "slots cannot drop below the {deployed} interns already deployed"
            )));
        }
        let updated = self
            .repository
            .update_company(id, &company)
            .map_err(|err| duplicate_name(err, &company.name))?;
        Ok(updated.view(today))
    }

    pub fn set_moa(
        &self,
        session: &Session,
        id: CompanyId,
        update: MoaUpdate,
        today: NaiveDate,
    ) -> Result<CompanyView, PortalError> {
        session.require(&[Role::Coordinator])?;
        let moa = parse_moa_pair(update.signed_on, update.expires_on)?;
        self.repository.set_company_moa(id, moa).map_err(not_found)?;
        let company = self.get(id, today)?;
        info!(company = %id, status = %company.moa_status, "MOA updated");
        Ok(company)
    }

    pub fn get(&self, id: CompanyId, today: NaiveDate) -> Result<CompanyView, PortalError> {
        self.repository
            .fetch_company(id)?
            .map(|company| company.view(today))
            .ok_or(PortalError::NotFound("company"))
    }

    pub fn list(
        &self,
        moa: Option<MoaStatus>,
        today: NaiveDate,
    ) -> Result<Vec<CompanyView>, PortalError> {
        Ok(self
            .repository
            .list_companies()?
            .into_iter()
            .map(|company| company.view(today))
            .filter(|view| moa.map_or(true, |status| view.moa_status == status))
            .collect())
    }

    pub fn occupancy(&self, session: &Session, id: CompanyId) -> Result<Occupancy, PortalError> {
        session.require(&[Role::Coordinator, Role::Adviser, Role::Supervisor])?;
        if session.is(Role::Supervisor) && session.company_id != Some(id) {
            return Err(PortalError::forbidden("company is outside your scope"));
        }
        let company = self
            .repository
            .fetch_company(id)?
            .ok_or(PortalError::NotFound("company"))?;
        let deployed = self.repository.count_deployed_at(id)?;
        Ok(Occupancy::new(company.id, company.slots, deployed))
    }

    pub fn delete(&self, session: &Session, id: CompanyId) -> Result<(), PortalError> {
        session.require(&[Role::Coordinator])?;
        if self.repository.fetch_company(id)?.is_none() {
            return Err(PortalError::NotFound("company"));
        }
        if self.repository.company_in_use(id)? {
            return Err(PortalError::conflict(
                "company still has interns or supervisor accounts",
            ));
        }
        self.repository.delete_company(id).map_err(not_found)?;
        info!(company = %id, "company removed");
        Ok(())
    }
}

fn duplicate_name(err: RepositoryError, name: &str) -> PortalError {
    match err {
        RepositoryError::Conflict => {
            PortalError::conflict(format!("a company named '{name}' already exists"))
        }
        RepositoryError::NotFound => PortalError::NotFound("company"),
        other => other.into(),
    }
}

fn not_found(err: RepositoryError) -> PortalError {
    match err {
        RepositoryError::NotFound => PortalError::NotFound("company"),
        other => other.into(),
    }
}
