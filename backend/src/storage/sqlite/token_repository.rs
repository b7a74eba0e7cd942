use anyhow::Result;
use async_trait::async_trait;
use sqlx::Row;

use super::connection::SqliteConnection;
use super::parse_timestamp;
use crate::domain::models::AuthToken;
use crate::storage::traits::TokenStorage;

/// Repository for bearer tokens
#[derive(Clone)]
pub struct TokenRepository {
    db: SqliteConnection,
}

impl TokenRepository {
    pub fn new(db: SqliteConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TokenStorage for TokenRepository {
    async fn register_token(&self, token: &AuthToken) -> Result<()> {
        // Re-login replaces the account's previous token
        sqlx::query(
            r#"
            INSERT INTO auth_tokens (token, account_id, issued_at)
            VALUES (?, ?, ?)
            ON CONFLICT(account_id) DO UPDATE SET
                token = excluded.token,
                issued_at = excluded.issued_at
            "#,
        )
        .bind(&token.token)
        .bind(token.account_id)
        .bind(token.issued_at.to_rfc3339())
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn find_token(&self, token: &str) -> Result<Option<AuthToken>> {
        let row = sqlx::query(
            r#"
            SELECT token, account_id, issued_at
            FROM auth_tokens
            WHERE token = ?
            "#,
        )
        .bind(token)
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            Some(r) => Ok(Some(AuthToken {
                token: r.try_get("token")?,
                account_id: r.try_get("account_id")?,
                issued_at: parse_timestamp(r.try_get("issued_at")?)?,
            })),
            None => Ok(None),
        }
    }

    async fn reset(&self) -> Result<()> {
        sqlx::query("DELETE FROM auth_tokens")
            .execute(self.db.pool())
            .await?;
        Ok(())
    }
}
