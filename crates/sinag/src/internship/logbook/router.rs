use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::Router;
use chrono::Utc;

use super::domain::{ActivityLog, HoursSummary, LogDraft, LogRange};
use crate::auth::Session;
use crate::error::PortalError;
use crate::extract::{Json, Path, Query};
use crate::ids::{InternId, LogId};
use crate::internship::review::ReviewRequest;
use crate::internship::{today, PortalState, Store};

pub fn logbook_routes<S: Store>() -> Router<PortalState<S>> {
    Router::new()
        .route(
            "/api/v1/interns/:intern_id/logs",
            get(list_handler::<S>).post(submit_handler::<S>),
        )
        .route(
            "/api/v1/interns/:intern_id/logs/summary",
            get(summary_handler::<S>),
        )
        .route(
            "/api/v1/logs/:log_id",
            put(update_handler::<S>).delete(delete_handler::<S>),
        )
        .route("/api/v1/logs/:log_id/review", post(review_handler::<S>))
}

pub(crate) async fn list_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Path(intern_id): Path<i64>,
    Query(range): Query<LogRange>,
) -> Result<Json<Vec<ActivityLog>>, PortalError> {
    Ok(Json(state.logbook.list(&session, InternId(intern_id), range)?))
}

pub(crate) async fn submit_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Path(intern_id): Path<i64>,
    Json(draft): Json<LogDraft>,
) -> Result<(StatusCode, Json<ActivityLog>), PortalError> {
    let log = state.logbook.submit(
        &session,
        InternId(intern_id),
        draft,
        today(),
        Utc::now(),
    )?;
    Ok((StatusCode::CREATED, Json(log)))
}

pub(crate) async fn summary_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Path(intern_id): Path<i64>,
) -> Result<Json<HoursSummary>, PortalError> {
    Ok(Json(state.logbook.summary(&session, InternId(intern_id))?))
}

pub(crate) async fn update_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Path(log_id): Path<i64>,
    Json(draft): Json<LogDraft>,
) -> Result<Json<ActivityLog>, PortalError> {
    let log = state
        .logbook
        .update(&session, LogId(log_id), draft, today())?;
    Ok(Json(log))
}

pub(crate) async fn delete_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Path(log_id): Path<i64>,
) -> Result<StatusCode, PortalError> {
    state.logbook.delete(&session, LogId(log_id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn review_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Path(log_id): Path<i64>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<ActivityLog>, PortalError> {
    let log = state
        .logbook
        .review(&session, LogId(log_id), request, Utc::now())?;
    Ok(Json(log))
}
