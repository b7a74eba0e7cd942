//! Bearer token issuance and resolution.
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::error::{LedgerError, LedgerResult};
use crate::domain::models::AuthToken;
use crate::storage::{Connection, TokenStorage};

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Clone)]
pub struct AuthService<C: Connection> {
    token_repository: C::TokenRepository,
    token_ttl: Option<Duration>,
}

impl<C: Connection> AuthService<C> {
    /// `token_ttl` of `None` means tokens never expire
    pub fn new(connection: Arc<C>, token_ttl: Option<Duration>) -> Self {
        Self {
            token_repository: connection.create_token_repository(),
            token_ttl,
        }
    }

    /// Issue a token for an already authenticated account.
    ///
    /// Any token previously issued to the account stops resolving.
    pub async fn create_token(&self, account_id: i64) -> LedgerResult<String> {
        let token = AuthToken::issue(account_id, Utc::now());
        self.token_repository
            .register_token(&token)
            .await
            .map_err(LedgerError::persistence)?;

        info!("Issued token for account {}", account_id);
        Ok(token.token)
    }

    pub async fn decode_token(&self, token: &str) -> LedgerResult<i64> {
        let stored = self
            .token_repository
            .find_token(token)
            .await
            .map_err(LedgerError::persistence)?
            .ok_or(LedgerError::InvalidToken)?;

        if stored.is_expired(self.token_ttl, Utc::now()) {
            warn!("Rejected expired token for account {}", stored.account_id);
            return Err(LedgerError::InvalidToken);
        }

        Ok(stored.account_id)
    }

    /// Resolve a raw `Authorization` header value to the caller's account id
    pub async fn authorize(&self, header: Option<&str>) -> LedgerResult<i64> {
        let token = parse_bearer(header)?;
        self.decode_token(token).await
    }
}

/// Extract the token from `Bearer <token>`.
pub fn parse_bearer(header: Option<&str>) -> LedgerResult<&str> {
    let token = header
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .ok_or(LedgerError::MalformedAuthorization)?;

    if token.is_empty() || token.chars().any(char::is_whitespace) {
        return Err(LedgerError::MalformedAuthorization);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryConnection;

    fn create_test_service(ttl: Option<Duration>) -> (AuthService<MemoryConnection>, MemoryConnection) {
        let connection = MemoryConnection::new();
        (AuthService::new(Arc::new(connection.clone()), ttl), connection)
    }

    #[test]
    fn test_parse_bearer() {
        assert_eq!(parse_bearer(Some("Bearer abc123")), Ok("abc123"));
        assert_eq!(parse_bearer(None), Err(LedgerError::MalformedAuthorization));
        assert_eq!(parse_bearer(Some("abc123")), Err(LedgerError::MalformedAuthorization));
        assert_eq!(parse_bearer(Some("Basic abc123")), Err(LedgerError::MalformedAuthorization));
        assert_eq!(parse_bearer(Some("Bearer ")), Err(LedgerError::MalformedAuthorization));
        assert_eq!(parse_bearer(Some("Bearer a b")), Err(LedgerError::MalformedAuthorization));
    }

    #[tokio::test]
    async fn test_token_round_trip() {
        let (service, _) = create_test_service(None);
        let token = service.create_token(7).await.unwrap();

        assert_eq!(service.decode_token(&token).await, Ok(7));
        assert_eq!(service.authorize(Some(&format!("Bearer {token}"))).await, Ok(7));
    }

    #[tokio::test]
    async fn test_unknown_token_is_invalid() {
        let (service, _) = create_test_service(None);
        assert_eq!(service.decode_token("nope").await, Err(LedgerError::InvalidToken));
        assert_eq!(
            service.authorize(Some("Bearer nope")).await,
            Err(LedgerError::InvalidToken)
        );
    }

    #[tokio::test]
    async fn test_relogin_invalidates_previous_token() {
        let (service, _) = create_test_service(None);
        let first = service.create_token(1).await.unwrap();
        let second = service.create_token(1).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(service.decode_token(&first).await, Err(LedgerError::InvalidToken));
        assert_eq!(service.decode_token(&second).await, Ok(1));
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let (service, connection) = create_test_service(Some(Duration::minutes(5)));
        let stale = AuthToken {
            token: "stale".to_string(),
            account_id: 3,
            issued_at: Utc::now() - Duration::minutes(10),
        };
        connection
            .create_token_repository()
            .register_token(&stale)
            .await
            .unwrap();

        assert_eq!(service.decode_token("stale").await, Err(LedgerError::InvalidToken));

        let fresh = service.create_token(3).await.unwrap();
        assert_eq!(service.decode_token(&fresh).await, Ok(3));
    }
}
