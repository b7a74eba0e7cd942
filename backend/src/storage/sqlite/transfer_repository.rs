use anyhow::Result;
use async_trait::async_trait;
use sqlx::Row;

use super::connection::SqliteConnection;
use super::parse_timestamp;
use crate::domain::models::{NewTransfer, Transfer};
use crate::storage::traits::TransferStorage;

/// Repository for transfer operations
#[derive(Clone)]
pub struct TransferRepository {
    db: SqliteConnection,
}

impl TransferRepository {
    pub fn new(db: SqliteConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TransferStorage for TransferRepository {
    async fn list_by_origin(&self, account_id: i64) -> Result<Vec<Transfer>> {
        let rows = sqlx::query(
            r#"
            SELECT id, origin_account_id, destination_account_id, amount, created_at
            FROM transfers
            WHERE origin_account_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(account_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter()
            .map(|row| -> Result<Transfer> {
                Ok(Transfer {
                    id: row.try_get("id")?,
                    origin_account_id: row.try_get("origin_account_id")?,
                    destination_account_id: row.try_get("destination_account_id")?,
                    amount: row.try_get("amount")?,
                    created_at: parse_timestamp(row.try_get("created_at")?)?,
                })
            })
            .collect()
    }

    async fn create_transfer(&self, transfer: &NewTransfer) -> Result<Transfer> {
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
        .execute(self.db.pool())
        .await?;

        Ok(transfer.clone().into_transfer(result.last_insert_rowid()))
    }

    async fn reset(&self) -> Result<()> {
        sqlx::query("DELETE FROM transfers")
            .execute(self.db.pool())
            .await?;
        Ok(())
    }
}
