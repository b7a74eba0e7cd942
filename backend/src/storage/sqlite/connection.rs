use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::account_repository::AccountRepository;
use super::token_repository::TokenRepository;
use super::transfer_repository::TransferRepository;
use crate::domain::models::Transfer;
use crate::storage::traits::{Connection, TransferPosting};

/// SqliteConnection manages the pool and the schema
#[derive(Clone)]
pub struct SqliteConnection {
    pool: Arc<SqlitePool>,
}

impl SqliteConnection {
    /// Connect to (and create if missing) the database at `url`
    pub async fn new(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid database url '{url}'"))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .with_context(|| format!("connecting to {url}"))?;

        Self::setup_schema(&pool).await?;
        info!("Connected to SQLite database {}", url);

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Private in-memory database, used by tests.
    ///
    /// Pinned to a single connection that never expires, otherwise every pooled
    /// connection would see its own empty database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::setup_schema(&pool).await?;
        Ok(Self { pool: Arc::new(pool) })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                external_id TEXT NOT NULL UNIQUE,
                credential_hash TEXT NOT NULL,
                balance INTEGER NOT NULL CHECK (balance >= 0),
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS transfers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                origin_account_id INTEGER NOT NULL,
                destination_account_id INTEGER NOT NULL,
                amount INTEGER NOT NULL CHECK (amount > 0),
                created_at TEXT NOT NULL,
                CHECK (origin_account_id <> destination_account_id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        // Outgoing transfers are queried by origin
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_transfers_origin_account_id
            ON transfers(origin_account_id);
            "#,
        )
        .execute(pool)
        .await?;

        // One live token per account
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS auth_tokens (
                token TEXT PRIMARY KEY,
                account_id INTEGER NOT NULL UNIQUE,
                issued_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl Connection for SqliteConnection {
    type AccountRepository = AccountRepository;
    type TransferRepository = TransferRepository;
    type TokenRepository = TokenRepository;

    fn create_account_repository(&self) -> Self::AccountRepository {
        AccountRepository::new(self.clone())
    }

    fn create_transfer_repository(&self) -> Self::TransferRepository {
        TransferRepository::new(self.clone())
    }

    fn create_token_repository(&self) -> Self::TokenRepository {
        TokenRepository::new(self.clone())
    }

    async fn commit_transfer(&self, posting: &TransferPosting) -> Result<Transfer> {
        let mut tx = self.pool.begin().await?;

        for change in posting.changes() {
            let result = sqlx::query(
                r#"
                UPDATE accounts SET balance = ?
                WHERE id = ? AND balance = ?
                "#,
            )
            .bind(change.new_balance)
            .bind(change.account_id)
            .bind(change.expected_balance)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() != 1 {
                tx.rollback().await?;
                bail!(
                    "balance of account {} changed concurrently (expected {})",
                    change.account_id,
                    change.expected_balance
                );
            }
        }

        let transfer = &posting.transfer;
        let result = sqlx::query(
            r#"
            INSERT INTO transfers (origin_account_id, destination_account_id, amount, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(transfer.origin_account_id())
        .bind(transfer.destination_account_id())
        .bind(transfer.amount())
        .bind(transfer.created_at().to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let transfer = transfer.clone().into_transfer(result.last_insert_rowid());
        debug!("Committed transfer {} to SQLite", transfer.id);
        Ok(transfer)
    }
}
