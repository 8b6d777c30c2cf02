use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::Router;
use chrono::Utc;
use serde::Deserialize;

use super::domain::{CompanyDraft, CompanyView, MoaStatus, Occupancy};
use super::service::MoaUpdate;
use crate::auth::Session;
use crate::error::PortalError;
use crate::extract::{Json, Path, Query};
use crate::ids::CompanyId;
use crate::internship::{today, PortalState, Store};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CompanyFilter {
    #[serde(default)]
    moa: Option<String>,
}

pub fn company_routes<S: Store>() -> Router<PortalState<S>> {
    Router::new()
        .route(
            "/api/v1/companies",
            get(list_handler::<S>).post(create_handler::<S>),
        )
        .route(
            "/api/v1/companies/:company_id",
            get(get_handler::<S>)
                .put(update_handler::<S>)
                .delete(delete_handler::<S>),
        )
        .route("/api/v1/companies/:company_id/moa", put(moa_handler::<S>))
        .route(
            "/api/v1/companies/:company_id/occupancy",
            get(occupancy_handler::<S>),
        )
}

pub(crate) async fn list_handler<S: Store>(
    State(state): State<PortalState<S>>,
    _session: Session,
    Query(filter): Query<CompanyFilter>,
) -> Result<Json<Vec<CompanyView>>, PortalError> {
    let moa = filter
        .moa
        .as_deref()
        .map(str::parse::<MoaStatus>)
        .transpose()
        .map_err(|err| PortalError::validation(format!("unknown MOA status filter: {err}")))?;
    Ok(Json(state.companies.list(moa, today())?))
}

pub(crate) async fn create_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Json(draft): Json<CompanyDraft>,
) -> Result<(StatusCode, Json<CompanyView>), PortalError> {
    let view = state
        .companies
        .create(&session, draft, today(), Utc::now())?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub(crate) async fn get_handler<S: Store>(
    State(state): State<PortalState<S>>,
    _session: Session,
    Path(company_id): Path<i64>,
) -> Result<Json<CompanyView>, PortalError> {
    Ok(Json(state.companies.get(CompanyId(company_id), today())?))
}

pub(crate) async fn update_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Path(company_id): Path<i64>,
    Json(draft): Json<CompanyDraft>,
) -> Result<Json<CompanyView>, PortalError> {
    let view = state
        .companies
        .update(&session, CompanyId(company_id), draft, today())?;
    Ok(Json(view))
}

pub(crate) async fn delete_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Path(company_id): Path<i64>,
) -> Result<StatusCode, PortalError> {
    state.companies.delete(&session, CompanyId(company_id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn moa_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Path(company_id): Path<i64>,
    Json(update): Json<MoaUpdate>,
) -> Result<Json<CompanyView>, PortalError> {
    let view = state
        .companies
        .set_moa(&session, CompanyId(company_id), update, today())?;
    Ok(Json(view))
}

pub(crate) async fn occupancy_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Path(company_id): Path<i64>,
) -> Result<Json<Occupancy>, PortalError> {
    Ok(Json(
        state.companies.occupancy(&session, CompanyId(company_id))?,
    ))
}
