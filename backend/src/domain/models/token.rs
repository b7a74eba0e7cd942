//! Domain model for an opaque bearer token.
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct AuthToken {
    pub token: String,
    pub account_id: i64,
    pub issued_at: DateTime<Utc>,
}

impl AuthToken {
    /// Issue a fresh random token; it carries no information about the account
    pub fn issue(account_id: i64, issued_at: DateTime<Utc>) -> Self {
        Self {
            token: Uuid::new_v4().simple().to_string(),
            account_id,
            issued_at,
        }
    }

    pub fn is_expired(&self, ttl: Option<Duration>, now: DateTime<Utc>) -> bool {
        match ttl {
            Some(ttl) => now - self.issued_at >= ttl,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_tokens_are_unique() {
        let now = Utc::now();
        let a = AuthToken::issue(1, now);
        let b = AuthToken::issue(1, now);
        assert_ne!(a.token, b.token);
        assert!(!a.token.contains(' '));
    }

    #[test]
    fn test_expiry() {
        let issued_at = Utc::now();
        let token = AuthToken::issue(1, issued_at);

        assert!(!token.is_expired(None, issued_at + Duration::days(365)));
        assert!(!token.is_expired(Some(Duration::minutes(5)), issued_at + Duration::minutes(4)));
        assert!(token.is_expired(Some(Duration::minutes(5)), issued_at + Duration::minutes(5)));
    }
}
