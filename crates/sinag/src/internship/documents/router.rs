use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::Router;
use chrono::Utc;

use super::domain::{Checklist, Document, DocumentKind, PendingDocument, Upload};
use crate::auth::Session;
use crate::error::PortalError;
use crate::extract::{Json, Path, RawBody};
use crate::ids::{DocumentId, InternId};
use crate::internship::review::ReviewRequest;
use crate::internship::{PortalState, Store};

/// Header carrying the original file name of a raw upload body.
pub const FILE_NAME_HEADER: &str = "x-file-name";

pub fn document_routes<S: Store>() -> Router<PortalState<S>> {
    Router::new()
        .route(
            "/api/v1/interns/:intern_id/documents",
            get(checklist_handler::<S>),
        )
        .route(
            "/api/v1/interns/:intern_id/documents/:kind",
            put(upload_handler::<S>),
        )
        .route("/api/v1/documents/:document_id/file", get(download_handler::<S>))
        .route(
            "/api/v1/documents/:document_id/review",
            post(review_handler::<S>),
        )
        .route("/api/v1/reviews/documents", get(pending_handler::<S>))
}

pub(crate) async fn checklist_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Path(intern_id): Path<i64>,
) -> Result<Json<Checklist>, PortalError> {
    Ok(Json(state.documents.checklist(&session, InternId(intern_id))?))
}

pub(crate) async fn upload_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Path((intern_id, kind)): Path<(i64, String)>,
    headers: HeaderMap,
    RawBody(body): RawBody,
) -> Result<(StatusCode, Json<Document>), PortalError> {
    let kind: DocumentKind = kind
        .parse()
        .map_err(|_| PortalError::validation(format!("unknown document kind '{kind}'")))?;
    let file_name = headers
        .get(FILE_NAME_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| PortalError::validation("the X-File-Name header is required"))?;
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let document = state.documents.upload(
        &session,
        InternId(intern_id),
        kind,
        Upload {
            file_name,
            content_type,
            bytes: body.to_vec(),
        },
        Utc::now(),
    )?;
    Ok((StatusCode::CREATED, Json(document)))
}

pub(crate) async fn download_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Path(document_id): Path<i64>,
) -> Result<impl IntoResponse, PortalError> {
    let (document, bytes) = state
        .documents
        .download(&session, DocumentId(document_id))?;
    let disposition = format!("inline; filename=\"{}\"", document.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, document.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

pub(crate) async fn review_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Path(document_id): Path<i64>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<Document>, PortalError> {
    let document =
        state
            .documents
            .review(&session, DocumentId(document_id), request, Utc::now())?;
    Ok(Json(document))
}

pub(crate) async fn pending_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
) -> Result<Json<Vec<PendingDocument>>, PortalError> {
    Ok(Json(state.documents.pending_reviews(&session)?))
}
