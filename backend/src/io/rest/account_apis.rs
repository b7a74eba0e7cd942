//! # REST API for Accounts
//!
//! Endpoints for opening accounts, listing them and reading a balance.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use tracing::info;

use super::errors::{ApiError, ApiJson, ApiPath};
use super::mappers::AccountMapper;
use crate::storage::Connection;
use crate::AppState;
use shared::{AccountSummary, BalanceResponse, CreateAccountRequest};

/// Open a new account
pub async fn create_account<C: Connection>(
    State(state): State<AppState<C>>,
    ApiJson(request): ApiJson<CreateAccountRequest>,
) -> Result<(StatusCode, Json<AccountSummary>), ApiError> {
    info!("POST /accounts - name={}", request.name);

    let command = AccountMapper::to_create_command(request);
    let account = state.account_service.create_account(command).await?;

    Ok((StatusCode::CREATED, Json(AccountMapper::account_to_dto(&account))))
}

/// List all accounts
pub async fn list_accounts<C: Connection>(
    State(state): State<AppState<C>>,
) -> Result<Json<Vec<AccountSummary>>, ApiError> {
    info!("GET /accounts");

    let accounts = state.account_service.read_accounts().await?;
    Ok(Json(accounts.into_iter().map(AccountMapper::to_dto).collect()))
}

/// Get the balance of one account
pub async fn get_balance<C: Connection>(
    State(state): State<AppState<C>>,
    ApiPath(account_id): ApiPath<i64>,
) -> Result<Json<BalanceResponse>, ApiError> {
    info!("GET /accounts/{}/balance", account_id);

    let balance = state.account_service.read_balance(account_id).await?;
    Ok(Json(AccountMapper::to_balance_dto(account_id, balance)))
}
