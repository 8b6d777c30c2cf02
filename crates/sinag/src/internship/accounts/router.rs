use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::Router;
use chrono::Utc;
use serde::Deserialize;

use super::domain::{
    Account, ActiveToggle, LoginRequest, LoginResponse, NewAccount, PasswordChange,
    ProvisionedAccount,
};
use crate::auth::{Role, Session};
use crate::error::PortalError;
use crate::extract::{Json, Path, Query};
use crate::ids::AccountId;
use crate::internship::{PortalState, Store};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AccountFilter {
    #[serde(default)]
    role: Option<Role>,
}

pub fn account_routes<S: Store>() -> Router<PortalState<S>> {
    Router::new()
        .route("/api/v1/auth/login", post(login_handler::<S>))
        .route("/api/v1/auth/me", get(me_handler::<S>))
        .route("/api/v1/auth/password", post(password_handler::<S>))
        .route(
            "/api/v1/accounts",
            get(list_handler::<S>).post(create_handler::<S>),
        )
        .route(
            "/api/v1/accounts/:account_id/active",
            patch(active_handler::<S>),
        )
}

pub(crate) async fn login_handler<S: Store>(
    State(state): State<PortalState<S>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, PortalError> {
    Ok(Json(state.accounts.login(request, Utc::now())?))
}

pub(crate) async fn me_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
) -> Result<Json<Account>, PortalError> {
    Ok(Json(state.accounts.me(&session)?))
}

pub(crate) async fn password_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Json(change): Json<PasswordChange>,
) -> Result<StatusCode, PortalError> {
    state.accounts.change_password(&session, change)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn list_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Query(filter): Query<AccountFilter>,
) -> Result<Json<Vec<Account>>, PortalError> {
    Ok(Json(state.accounts.list(&session, filter.role)?))
}

pub(crate) async fn create_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Json(request): Json<NewAccount>,
) -> Result<(StatusCode, Json<ProvisionedAccount>), PortalError> {
    let provisioned = state.accounts.create(&session, request, Utc::now())?;
    Ok((StatusCode::CREATED, Json(provisioned)))
}

pub(crate) async fn active_handler<S: Store>(
    State(state): State<PortalState<S>>,
    session: Session,
    Path(account_id): Path<i64>,
    Json(toggle): Json<ActiveToggle>,
) -> Result<Json<Account>, PortalError> {
    let account = state
        .accounts
        .set_active(&session, AccountId(account_id), toggle.active)?;
    Ok(Json(account))
}
