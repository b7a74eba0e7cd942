//! # Ledger Backend
//!
//! Accounts, bearer tokens and atomic transfers behind an HTTP API.
//!
//! The crate follows a layered architecture:
//! ```text
//! IO Layer (axum handlers, DTO mappers, error translation)
//!     ↓
//! Domain Layer (account, auth and transfer services)
//!     ↓
//! Storage Layer (memory, CSV or SQLite behind the storage traits)
//! ```
//!
//! [`AppState`] wires the services to one storage [`Connection`];
//! [`create_router`] builds the HTTP surface and [`serve`] runs it.

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use std::sync::Arc;

use anyhow::Result;
use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::LedgerConfig;
use crate::domain::{AccountService, AuthService, TransferService};
use crate::storage::Connection;

/// Services shared by every handler
#[derive(Clone)]
pub struct AppState<C: Connection> {
    pub account_service: AccountService<C>,
    pub auth_service: AuthService<C>,
    pub transfer_service: TransferService<C>,
}

impl<C: Connection> AppState<C> {
    pub fn new(connection: Arc<C>, token_ttl: Option<chrono::Duration>) -> Self {
        Self {
            account_service: AccountService::new(connection.clone()),
            auth_service: AuthService::new(connection.clone(), token_ttl),
            transfer_service: TransferService::new(connection),
        }
    }
}

/// Create the Axum router with all routes configured
pub fn create_router<C: Connection>(app_state: AppState<C>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route(
            "/accounts",
            get(io::account_apis::list_accounts::<C>).post(io::account_apis::create_account::<C>),
        )
        .route("/accounts/:id/balance", get(io::account_apis::get_balance::<C>))
        .route("/login", post(io::auth_apis::login::<C>))
        .route(
            "/transfers",
            get(io::transfer_apis::list_transfers::<C>).post(io::transfer_apis::create_transfer::<C>),
        )
        .route("/health", get(|| async { "ok" }))
        .layer(cors)
        .with_state(app_state)
}

/// Serve the API on `config.bind` until Ctrl+C
pub async fn serve<C: Connection>(connection: C, config: &LedgerConfig) -> Result<()> {
    info!("Setting up domain services");
    let app_state = AppState::new(Arc::new(connection), config.token_ttl());
    let app = create_router(app_state);

    let listener = TcpListener::bind(config.bind).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::rest::test_support::{send, test_router};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health() {
        let app = test_router();
        let response = send(&app, "GET", "/health", None, None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let app = create_router(AppState::new(
            Arc::new(crate::storage::MemoryConnection::new()),
            None,
        ));
        let response = send(&app, "GET", "/nope", None, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
