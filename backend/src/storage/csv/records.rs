//! Row layouts of the CSV files.
//!
//! ```csv
//! id,name,external_id,credential_hash,balance,created_at
//! 1,Ana,12345678900,9f86d081...,100,2024-01-15T10:30:00Z
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::models::{Account, AuthToken, CredentialHash, Transfer};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct AccountRecord {
    pub id: i64,
    pub name: String,
    pub external_id: String,
    /// Hex-encoded SHA-256 digest
    pub credential_hash: String,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
}

impl AccountRecord {
    pub fn into_account(self) -> Result<Account> {
        let credential_hash = CredentialHash::from_hex(&self.credential_hash)
            .with_context(|| format!("account {} has an unreadable credential", self.id))?;
        Ok(Account {
            id: self.id,
            name: self.name,
            external_id: self.external_id,
            credential_hash,
            balance: self.balance,
            created_at: self.created_at,
        })
    }
}

impl From<&Account> for AccountRecord {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            external_id: account.external_id.clone(),
            credential_hash: account.credential_hash.to_hex(),
            balance: account.balance,
            created_at: account.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct TransferRecord {
    pub id: i64,
    pub origin_account_id: i64,
    pub destination_account_id: i64,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

impl From<TransferRecord> for Transfer {
    fn from(record: TransferRecord) -> Self {
        Transfer {
            id: record.id,
            origin_account_id: record.origin_account_id,
            destination_account_id: record.destination_account_id,
            amount: record.amount,
            created_at: record.created_at,
        }
    }
}

impl From<&Transfer> for TransferRecord {
    fn from(transfer: &Transfer) -> Self {
        Self {
            id: transfer.id,
            origin_account_id: transfer.origin_account_id,
            destination_account_id: transfer.destination_account_id,
            amount: transfer.amount,
            created_at: transfer.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct TokenRecord {
    pub token: String,
    pub account_id: i64,
    pub issued_at: DateTime<Utc>,
}

impl From<TokenRecord> for AuthToken {
    fn from(record: TokenRecord) -> Self {
        AuthToken {
            token: record.token,
            account_id: record.account_id,
            issued_at: record.issued_at,
        }
    }
}

impl From<&AuthToken> for TokenRecord {
    fn from(token: &AuthToken) -> Self {
        Self {
            token: token.token.clone(),
            account_id: token.account_id,
            issued_at: token.issued_at,
        }
    }
}

/// Next id for an append-only file: one past the largest id present
pub(crate) fn next_id(ids: impl Iterator<Item = i64>) -> i64 {
    ids.max().unwrap_or(0) + 1
}
