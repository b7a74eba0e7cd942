//! Domain model for a balance-bearing account.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use super::transfer::NewTransfer;
use crate::domain::error::{LedgerError, LedgerResult};

/// SHA-256 digest of an account secret.
///
/// Produced once when the account is created or a login is checked; the raw
/// secret is never kept around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialHash(Vec<u8>);

impl CredentialHash {
    pub fn from_secret(secret: &str) -> Self {
        Self(Sha256::digest(secret.as_bytes()).to_vec())
    }

    pub fn from_hex(encoded: &str) -> Result<Self> {
        let bytes = hex::decode(encoded).map_err(|e| anyhow!("corrupted credential hash: {e}"))?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Plain byte comparison of the digests, not constant-time.
    pub fn matches(&self, secret: &str) -> bool {
        self.0 == Self::from_secret(secret).0
    }
}

/// An account as held by the account store
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: i64,
    pub name: String,
    /// Unique credential key (national ID)
    pub external_id: String,
    pub credential_hash: CredentialHash,
    /// Minor currency units, never negative once committed
    pub balance: i64,
    pub created_at: DateTime<Utc>,
}

/// Public projection of an account without the credential hash
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSummary {
    pub id: i64,
    pub name: String,
    pub external_id: String,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
}

/// What the account store needs to look up a login
#[derive(Debug, Clone, PartialEq)]
pub struct StoredCredential {
    pub account_id: i64,
    pub credential_hash: CredentialHash,
}

/// A validated account that has not been assigned an id yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    name: String,
    external_id: String,
    credential_hash: CredentialHash,
    balance: i64,
    created_at: DateTime<Utc>,
}

impl NewAccount {
    pub fn new(
        name: &str,
        external_id: &str,
        credential_hash: CredentialHash,
        balance: i64,
        created_at: DateTime<Utc>,
    ) -> LedgerResult<Self> {
        let name = name.trim();
        let external_id = external_id.trim();

        if name.is_empty() {
            return Err(LedgerError::InvalidAccount("name cannot be empty".to_string()));
        }
        if external_id.is_empty() {
            return Err(LedgerError::InvalidAccount("cpf cannot be empty".to_string()));
        }
        if balance < 0 {
            return Err(LedgerError::InvalidAccount(format!(
                "balance cannot be negative, got {balance}"
            )));
        }

        Ok(Self {
            name: name.to_string(),
            external_id: external_id.to_string(),
            credential_hash,
            balance,
            created_at,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn credential_hash(&self) -> &CredentialHash {
        &self.credential_hash
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Attach the id handed out by the store
    pub fn into_account(self, id: i64) -> Account {
        Account {
            id,
            name: self.name,
            external_id: self.external_id,
            credential_hash: self.credential_hash,
            balance: self.balance,
            created_at: self.created_at,
        }
    }
}

impl Account {
    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            id: self.id,
            name: self.name.clone(),
            external_id: self.external_id.clone(),
            balance: self.balance,
            created_at: self.created_at,
        }
    }

    /// Move `amount` from this account into `destination`.
    ///
    /// The transfer record is built (and validated) before any balance changes,
    /// so a rejected transfer leaves both accounts untouched.
    pub fn transfer_to(
        &mut self,
        destination: &mut Account,
        amount: i64,
        created_at: DateTime<Utc>,
    ) -> LedgerResult<NewTransfer> {
        let transfer = NewTransfer::new(self.id, destination.id, amount, created_at)?;

        if self.balance < amount {
            return Err(LedgerError::InsufficientFunds {
                balance: self.balance,
                amount,
            });
        }

        let credited = destination.balance.checked_add(amount).ok_or_else(|| {
            LedgerError::InvalidTransfer(format!(
                "destination balance would overflow when adding {amount}"
            ))
        })?;

        self.balance -= amount;
        destination.balance = credited;

        Ok(transfer)
    }
}
