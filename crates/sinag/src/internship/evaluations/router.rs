use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use chrono::Utc;

use super::domain::{Evaluation, EvaluationDraft};
use crate::auth::Session;
use crate::error::PortalError;
use crate::extract::{Json, Path};
use crate::ids::{EvaluationId, InternId};
use crate::internship::{PortalState, Store};

pub fn evaluation_routes<S: Store>() -> Router<PortalState<S>> {
    Router::new()
        .route(
            "/api/v1/interns/:intern_id/evaluations",
            get(list_handler::<S>).post(submit_handler::<S>),
        )
        .route(
            "/api/v1/evaluations/:evaluation_id",
            get(get_handler::<S>),
        )
}

pub(crate) async fn list_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Path(intern_id): Path<i64>,
) -> Result<Json<Vec<Evaluation>>, PortalError> {
    Ok(Json(
        state
            .evaluations
            .list_for_intern(&session, InternId(intern_id))?,
    ))
}

pub(crate) async fn submit_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Path(intern_id): Path<i64>,
    Json(draft): Json<EvaluationDraft>,
) -> Result<(StatusCode, Json<Evaluation>), PortalError> {
    let evaluation =
        state
            .evaluations
            .submit(&session, InternId(intern_id), draft, Utc::now())?;
    Ok((StatusCode::CREATED, Json(evaluation)))
}

pub(crate) async fn get_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Path(evaluation_id): Path<i64>,
) -> Result<Json<Evaluation>, PortalError> {
    Ok(Json(
        state
            .evaluations
            .get(&session, EvaluationId(evaluation_id))?,
    ))
}
