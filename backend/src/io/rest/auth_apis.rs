//! # REST API for Login
//!
//! Exchanges a cpf and secret for a bearer token.

use axum::{extract::State, Json};
use tracing::info;

use super::errors::{ApiError, ApiJson};
use super::mappers::AccountMapper;
use crate::storage::Connection;
use crate::AppState;
use shared::{LoginRequest, LoginResponse};

pub async fn login<C: Connection>(
    State(state): State<AppState<C>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    info!("POST /login");

    let command = AccountMapper::to_authenticate_command(request);
    let account_id = state.account_service.authenticate(command).await?;
    let token = state.auth_service.create_token(account_id).await?;

    Ok(Json(LoginResponse { token }))
}
