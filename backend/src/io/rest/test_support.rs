//! Helpers for driving the router in handler tests.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
    Router,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use shared::{AccountSummary, LoginResponse};
use tower::ServiceExt;

use crate::storage::MemoryConnection;
use crate::{create_router, AppState};

pub(crate) fn test_router() -> Router {
    create_router(AppState::new(Arc::new(MemoryConnection::new()), None))
}

pub(crate) async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    authorization: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        request = request.header(header::AUTHORIZATION, value);
    }

    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

/// Sends `body` as-is, for requests `serde_json` would refuse to build
pub(crate) async fn send_raw(
    app: &Router,
    uri: &str,
    authorization: Option<&str>,
    content_type: Option<&str>,
    body: &'static str,
) -> Response {
    let mut request = Request::builder().method("POST").uri(uri);
    if let Some(value) = authorization {
        request = request.header(header::AUTHORIZATION, value);
    }
    if let Some(value) = content_type {
        request = request.header(header::CONTENT_TYPE, value);
    }

    app.clone()
        .oneshot(request.body(Body::from(body)).unwrap())
        .await
        .unwrap()
}

pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub(crate) async fn create_account(app: &Router, cpf: &str, secret: &str, balance: i64) -> AccountSummary {
    let response = send(
        app,
        "POST",
        "/accounts",
        None,
        Some(json!({"name": format!("holder {cpf}"), "cpf": cpf, "secret": secret, "balance": balance})),
    )
    .await;
    read_json(response).await
}

pub(crate) async fn login(app: &Router, cpf: &str, secret: &str) -> String {
    let response = send(app, "POST", "/login", None, Some(json!({"cpf": cpf, "secret": secret}))).await;
    read_json::<LoginResponse>(response).await.token
}
