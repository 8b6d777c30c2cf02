//! The internship domain: one module per portal area, each with its
//! repository trait, service and axum routes.

pub mod accounts;
pub mod companies;
pub mod dashboard;
pub mod documents;
pub mod evaluations;
pub mod interns;
pub mod logbook;
pub mod programs;
pub mod review;

#[cfg(test)]
pub(crate) mod testing;

use std::ops::Deref;
use std::sync::Arc;

use axum::extract::FromRef;
use chrono::{Local, NaiveDate};

use crate::auth::TokenIssuer;
use crate::config::InternshipConfig;
use crate::reports::ReportService;
use accounts::{AccountRepository, AccountService};
use companies::{CompanyRepository, CompanyService};
use dashboard::DashboardService;
use documents::{DocumentRepository, DocumentService, DocumentVault};
use evaluations::{EvaluationRepository, EvaluationService};
use interns::{InternRepository, InternService};
use logbook::{LogbookRepository, LogbookService};
use programs::{ProgramRepository, ProgramService};

/// Everything a portal backend must persist.
pub trait Store:
    AccountRepository
    + ProgramRepository
    + CompanyRepository
    + InternRepository
    + DocumentRepository
    + LogbookRepository
    + EvaluationRepository
    + Send
    + Sync
    + 'static
{
}

impl<T> Store for T where
    T: AccountRepository
        + ProgramRepository
        + CompanyRepository
        + InternRepository
        + DocumentRepository
        + LogbookRepository
        + EvaluationRepository
        + Send
        + Sync
        + 'static
{
}

/// Services wired over one shared store.
pub struct Portal<S> {
    pub store: Arc<S>,
    pub tokens: Arc<TokenIssuer>,
    pub accounts: AccountService<S>,
    pub programs: ProgramService<S>,
    pub companies: CompanyService<S>,
    pub interns: InternService<S>,
    pub documents: DocumentService<S>,
    pub logbook: LogbookService<S>,
    pub evaluations: EvaluationService<S>,
    pub dashboard: DashboardService<S>,
    pub reports: ReportService<S>,
}

impl<S: Store> Portal<S> {
    pub fn new(
        store: Arc<S>,
        tokens: Arc<TokenIssuer>,
        vault: Arc<DocumentVault>,
        internship: &InternshipConfig,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            accounts: AccountService::new(store.clone(), tokens.clone()),
            programs: ProgramService::new(store.clone()),
            companies: CompanyService::new(store.clone()),
            interns: InternService::new(store.clone(), internship.default_required_hours),
            documents: DocumentService::new(store.clone(), vault, max_upload_bytes),
            logbook: LogbookService::new(store.clone()),
            evaluations: EvaluationService::new(store.clone()),
            dashboard: DashboardService::new(store.clone()),
            reports: ReportService::new(store.clone()),
            store,
            tokens,
        }
    }
}

/// Router state; cloning shares the same portal.
pub struct PortalState<S>(pub Arc<Portal<S>>);

impl<S> PortalState<S> {
    pub fn new(portal: Portal<S>) -> Self {
        Self(Arc::new(portal))
    }
}

impl<S> Clone for PortalState<S> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<S> Deref for PortalState<S> {
    type Target = Portal<S>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRef<PortalState<S>> for Arc<TokenIssuer> {
    fn from_ref(state: &PortalState<S>) -> Self {
        state.tokens.clone()
    }
}

/// Calendar date used for MOA status and log date checks.
pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}
