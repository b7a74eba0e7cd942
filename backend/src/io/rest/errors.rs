//! Translation of domain failures into HTTP responses.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts, Path,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shared::ErrorResponse;
use tracing::{error, warn};

use crate::domain::LedgerError;

/// Everything a handler can fail with
#[derive(Debug)]
pub enum ApiError {
    Ledger(LedgerError),
    /// Body or path did not decode; rejected before any service is called
    InvalidRequest(StatusCode, String),
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::InvalidRequest(rejection.status(), rejection.body_text())
    }
}

/// `Json` whose rejections answer with the same `{error, code}` body as
/// every other failure
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Path` counterpart of [`ApiJson`]
#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

pub fn status_for(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::InvalidAccount(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LedgerError::CreationFailed(_) => StatusCode::CONFLICT,
        LedgerError::AuthFailed
        | LedgerError::InvalidToken
        | LedgerError::MalformedAuthorization => StatusCode::UNAUTHORIZED,
        LedgerError::AccountNotFound { .. } => StatusCode::NOT_FOUND,
        LedgerError::InvalidTransfer(_) | LedgerError::InsufficientFunds { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        LedgerError::PersistenceFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, code) = match self {
            ApiError::Ledger(LedgerError::PersistenceFailed(cause)) => {
                // Store details stay in the log
                error!("Request failed on persistence: {}", cause);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal storage error".to_string(),
                    "PERSISTENCE_FAILED",
                )
            }
            ApiError::Ledger(err) => (status_for(&err), err.to_string(), err.code()),
            ApiError::InvalidRequest(status, message) => {
                warn!("Rejected malformed request: {}", message);
                (status, message, "INVALID_REQUEST")
            }
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AccountSide;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (LedgerError::InvalidAccount("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (LedgerError::CreationFailed("x".into()), StatusCode::CONFLICT),
            (LedgerError::AuthFailed, StatusCode::UNAUTHORIZED),
            (LedgerError::InvalidToken, StatusCode::UNAUTHORIZED),
            (LedgerError::MalformedAuthorization, StatusCode::UNAUTHORIZED),
            (
                LedgerError::AccountNotFound { side: AccountSide::Destination, account_id: 2 },
                StatusCode::NOT_FOUND,
            ),
            (LedgerError::InvalidTransfer("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (
                LedgerError::InsufficientFunds { balance: 1, amount: 2 },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (LedgerError::PersistenceFailed("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(status_for(&err), status, "{err:?}");
        }
    }

    #[tokio::test]
    async fn test_persistence_details_are_not_exposed() {
        let response =
            ApiError::Ledger(LedgerError::PersistenceFailed("/var/lib/secret path".into()))
                .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.code, "PERSISTENCE_FAILED");
        assert!(!body.error.contains("secret"));
    }

    #[tokio::test]
    async fn test_malformed_bodies_get_error_body() {
        use crate::io::rest::test_support::{read_json, send_raw, test_router};

        let app = test_router();
        let json = Some("application/json");
        let cases = [
            ("/accounts", json, "{not json", StatusCode::BAD_REQUEST),
            ("/accounts", json, r#"{"name": "Ana"}"#, StatusCode::UNPROCESSABLE_ENTITY),
            ("/login", None, r#"{"cpf": "1", "secret": "s"}"#, StatusCode::UNSUPPORTED_MEDIA_TYPE),
        ];
        for (uri, content_type, body, status) in cases {
            let response = send_raw(&app, uri, None, content_type, body).await;

            assert_eq!(response.status(), status, "{uri} {body}");
            let error: ErrorResponse = read_json(response).await;
            assert_eq!(error.code, "INVALID_REQUEST");
        }
    }
}
