//! # REST API for Transfers
//!
//! Both endpoints require `Authorization: Bearer <token>`. The origin of a new
//! transfer is always the authenticated account.

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    Json,
};
use tracing::{info, warn};

use super::errors::{ApiError, ApiJson};
use super::mappers::TransferMapper;
use crate::storage::Connection;
use crate::AppState;
use shared::{CreateTransferRequest, TransferRecord};

fn authorization_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok())
}

/// Move money out of the caller's account
///
/// The caller is authenticated before the body is looked at.
pub async fn create_transfer<C: Connection>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    body: Result<ApiJson<CreateTransferRequest>, ApiError>,
) -> Result<(StatusCode, Json<TransferRecord>), ApiError> {
    info!("POST /transfers");

    let caller = state
        .auth_service
        .authorize(authorization_header(&headers))
        .await?;
    let ApiJson(request) = body?;
    info!(
        "Transfer request from {}: destination={}, amount={}",
        caller, request.account_destination_id, request.amount
    );

    if let Some(requested) = request.account_origin_id {
        if requested != caller {
            warn!(
                "Transfer body named origin {} but token belongs to {}; using {}",
                requested, caller, caller
            );
        }
    }

    let command = TransferMapper::to_create_command(&request, caller);
    let transfer = state.transfer_service.create_transfer(command).await?;

    Ok((StatusCode::CREATED, Json(TransferMapper::to_dto(transfer))))
}

/// List the caller's outgoing transfers
pub async fn list_transfers<C: Connection>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
) -> Result<Json<Vec<TransferRecord>>, ApiError> {
    info!("GET /transfers");

    let caller = state
        .auth_service
        .authorize(authorization_header(&headers))
        .await?;
    let transfers = state.transfer_service.read_transfers_by_account(caller).await?;

    Ok(Json(transfers.into_iter().map(TransferMapper::to_dto).collect()))
}
