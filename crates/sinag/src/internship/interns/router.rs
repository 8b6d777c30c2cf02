use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde::Deserialize;

use super::domain::{Enrollment, InternDraft, InternFilter, InternView, PlacementRequest, ProfileUpdate};
use super::roster::ImportReport;
use crate::auth::Session;
use crate::error::PortalError;
use crate::extract::{Json, Path, Query, RawBody};
use crate::ids::{InternId, ProgramId};
use crate::internship::{today, PortalState, Store};

#[derive(Debug, Deserialize)]
pub(crate) struct RosterImportParams {
    school_year: String,
    #[serde(default)]
    required_hours: Option<u32>,
}

pub fn intern_routes<S: Store>() -> Router<PortalState<S>> {
    Router::new()
        .route(
            "/api/v1/interns",
            get(list_handler::<S>).post(enroll_handler::<S>),
        )
        .route(
            "/api/v1/interns/:intern_id",
            get(get_handler::<S>).put(update_handler::<S>),
        )
        .route(
            "/api/v1/interns/:intern_id/placement",
            post(place_handler::<S>).delete(unassign_handler::<S>),
        )
        .route("/api/v1/interns/:intern_id/drop", post(drop_handler::<S>))
        .route(
            "/api/v1/interns/:intern_id/reinstate",
            post(reinstate_handler::<S>),
        )
        .route(
            "/api/v1/interns/:intern_id/complete",
            post(complete_handler::<S>),
        )
        .route(
            "/api/v1/programs/:program_id/roster",
            get(export_handler::<S>).post(import_handler::<S>),
        )
}

pub(crate) async fn list_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Query(filter): Query<InternFilter>,
) -> Result<Json<Vec<InternView>>, PortalError> {
    Ok(Json(state.interns.list(&session, filter)?))
}

pub(crate) async fn enroll_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Json(draft): Json<InternDraft>,
) -> Result<(StatusCode, Json<Enrollment>), PortalError> {
    let enrollment = state.interns.enroll(&session, draft, Utc::now())?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

pub(crate) async fn get_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Path(intern_id): Path<i64>,
) -> Result<Json<InternView>, PortalError> {
    Ok(Json(state.interns.get(&session, InternId(intern_id))?))
}

pub(crate) async fn update_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Path(intern_id): Path<i64>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<InternView>, PortalError> {
    let view = state
        .interns
        .update_profile(&session, InternId(intern_id), update)?;
    Ok(Json(view))
}

pub(crate) async fn place_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Path(intern_id): Path<i64>,
    Json(request): Json<PlacementRequest>,
) -> Result<Json<InternView>, PortalError> {
    let view = state
        .interns
        .place(&session, InternId(intern_id), request, today())?;
    Ok(Json(view))
}

pub(crate) async fn unassign_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Path(intern_id): Path<i64>,
) -> Result<Json<InternView>, PortalError> {
    Ok(Json(state.interns.unassign(&session, InternId(intern_id))?))
}

pub(crate) async fn drop_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Path(intern_id): Path<i64>,
) -> Result<Json<InternView>, PortalError> {
    Ok(Json(
        state.interns.drop_intern(&session, InternId(intern_id))?,
    ))
}

pub(crate) async fn reinstate_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Path(intern_id): Path<i64>,
) -> Result<Json<InternView>, PortalError> {
    Ok(Json(state.interns.reinstate(&session, InternId(intern_id))?))
}

pub(crate) async fn complete_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Path(intern_id): Path<i64>,
) -> Result<Json<InternView>, PortalError> {
    let view = state
        .interns
        .complete(&session, InternId(intern_id), today())?;
    Ok(Json(view))
}

pub(crate) async fn import_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Path(program_id): Path<i64>,
    Query(params): Query<RosterImportParams>,
    RawBody(body): RawBody,
) -> Result<Json<ImportReport>, PortalError> {
    let report = state.interns.import_roster(
        &session,
        ProgramId(program_id),
        &params.school_year,
        params.required_hours,
        &body[..],
        Utc::now(),
    )?;
    Ok(Json(report))
}

pub(crate) async fn export_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Path(program_id): Path<i64>,
) -> Result<impl IntoResponse, PortalError> {
    let csv = state.interns.export_roster(&session, ProgramId(program_id))?;
    let disposition = format!("attachment; filename=\"roster-{program_id}.csv\"");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}
