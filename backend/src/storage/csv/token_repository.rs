use anyhow::Result;
use async_trait::async_trait;

use super::connection::{CsvConnection, TOKENS_FILE};
use super::records::TokenRecord;
use crate::domain::models::AuthToken;
use crate::storage::traits::TokenStorage;

/// Bearer tokens in `{data_dir}/tokens.csv`, at most one row per account
#[derive(Clone)]
pub struct TokenRepository {
    connection: CsvConnection,
}

impl TokenRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl TokenStorage for TokenRepository {
    async fn register_token(&self, token: &AuthToken) -> Result<()> {
        let _guard = self.connection.lock()?;
        let mut records: Vec<TokenRecord> = self.connection.read_records(TOKENS_FILE)?;

        records.retain(|record| record.account_id != token.account_id);
        records.push(TokenRecord::from(token));

        self.connection.write_records(TOKENS_FILE, &records)
    }

    async fn find_token(&self, token: &str) -> Result<Option<AuthToken>> {
        let _guard = self.connection.lock()?;
        Ok(self
            .connection
            .read_records::<TokenRecord>(TOKENS_FILE)?
            .into_iter()
            .find(|record| record.token == token)
            .map(AuthToken::from))
    }

    async fn reset(&self) -> Result<()> {
        let _guard = self.connection.lock()?;
        self.connection.write_records::<TokenRecord>(TOKENS_FILE, &[])
    }
}
