//! The portal's REST surface composed into one router.

use axum::extract::DefaultBodyLimit;
use axum::Router;

use crate::internship::accounts::account_routes;
use crate::internship::companies::company_routes;
use crate::internship::dashboard::dashboard_routes;
use crate::internship::documents::document_routes;
use crate::internship::evaluations::evaluation_routes;
use crate::internship::interns::intern_routes;
use crate::internship::logbook::logbook_routes;
use crate::internship::programs::program_routes;
use crate::internship::{PortalState, Store};
use crate::reports::report_routes;

/// Bodies may run slightly past the upload limit; the document service
/// answers the excess with 413.
const BODY_SLACK_BYTES: usize = 64 * 1024;

pub fn portal_router<S: Store>(state: PortalState<S>) -> Router {
    let body_limit = state.documents.max_upload_bytes() + BODY_SLACK_BYTES;
    Router::new()
        .merge(account_routes::<S>())
        .merge(program_routes::<S>())
        .merge(company_routes::<S>())
        .merge(intern_routes::<S>())
        .merge(document_routes::<S>())
        .merge(logbook_routes::<S>())
        .merge(evaluation_routes::<S>())
        .merge(dashboard_routes::<S>())
        .merge(report_routes::<S>())
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
