use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::connection::SqliteConnection;
use super::parse_timestamp;
use crate::domain::models::{Account, CredentialHash, NewAccount, StoredCredential};
use crate::storage::traits::AccountStorage;

/// Repository for account operations
#[derive(Clone)]
pub struct AccountRepository {
    db: SqliteConnection,
}

impl AccountRepository {
    pub fn new(db: SqliteConnection) -> Self {
        Self { db }
    }
}

fn account_from_row(row: &SqliteRow) -> Result<Account> {
    Ok(Account {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        external_id: row.try_get("external_id")?,
        credential_hash: CredentialHash::from_hex(row.try_get("credential_hash")?)?,
        balance: row.try_get("balance")?,
        created_at: parse_timestamp(row.try_get("created_at")?)?,
    })
}

#[async_trait]
impl AccountStorage for AccountRepository {
    /// The UNIQUE constraint on `external_id` rejects duplicates
    async fn create_account(&self, account: &NewAccount) -> Result<Account> {
        let result = sqlx::query(
            r#"
            INSERT INTO accounts (name, external_id, credential_hash, balance, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(account.name())
        .bind(account.external_id())
        .bind(account.credential_hash().to_hex())
        .bind(account.balance())
        .bind(account.created_at().to_rfc3339())
        .execute(self.db.pool())
        .await?;

        Ok(account.clone().into_account(result.last_insert_rowid()))
    }

    async fn list_accounts(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, external_id, credential_hash, balance, created_at
            FROM accounts
            ORDER BY id ASC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(account_from_row).collect()
    }

    async fn get_account(&self, account_id: i64) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, external_id, credential_hash, balance, created_at
            FROM accounts
            WHERE id = ?
            "#,
        )
        .bind(account_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn get_credential(&self, external_id: &str) -> Result<Option<StoredCredential>> {
        let row = sqlx::query(
            r#"
            SELECT id, credential_hash
            FROM accounts
            WHERE external_id = ?
            "#,
        )
        .bind(external_id)
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            Some(r) => Ok(Some(StoredCredential {
                account_id: r.try_get("id")?,
                credential_hash: CredentialHash::from_hex(r.try_get("credential_hash")?)?,
            })),
            None => Ok(None),
        }
    }

    async fn update_balance(&self, account_id: i64, balance: i64) -> Result<Account> {
        let result = sqlx::query(
            r#"
            UPDATE accounts SET balance = ? WHERE id = ?
            "#,
        )
        .bind(balance)
        .bind(account_id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(anyhow!("account {account_id} not found"));
        }

        self.get_account(account_id)
            .await?
            .ok_or_else(|| anyhow!("account {account_id} vanished after update"))
    }

    async fn reset(&self) -> Result<()> {
        sqlx::query("DELETE FROM accounts")
            .execute(self.db.pool())
            .await?;
        Ok(())
    }
}
