//! Domain model for a completed money movement.
//!
//! Transfers are append-only: once the store has assigned an id they are never
//! updated or deleted.

use chrono::{DateTime, Utc};

use crate::domain::error::{LedgerError, LedgerResult};

/// A persisted transfer
#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    pub id: i64,
    pub origin_account_id: i64,
    pub destination_account_id: i64,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// A transfer that passed validation and is waiting for a store id.
///
/// The fields are private so the only way to obtain one is [`NewTransfer::new`];
/// a record breaking the invariants can never reach a store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransfer {
    origin_account_id: i64,
    destination_account_id: i64,
    amount: i64,
    created_at: DateTime<Utc>,
}

impl NewTransfer {
    pub fn new(
        origin_account_id: i64,
        destination_account_id: i64,
        amount: i64,
        created_at: DateTime<Utc>,
    ) -> LedgerResult<Self> {
        if amount <= 0 {
            return Err(LedgerError::InvalidTransfer(format!(
                "amount must be positive, got {amount}"
            )));
        }
        if origin_account_id == destination_account_id {
            return Err(LedgerError::InvalidTransfer(format!(
                "account {origin_account_id} cannot transfer to itself"
            )));
        }

        Ok(Self {
            origin_account_id,
            destination_account_id,
            amount,
            created_at,
        })
    }

    pub fn origin_account_id(&self) -> i64 {
        self.origin_account_id
    }

    pub fn destination_account_id(&self) -> i64 {
        self.destination_account_id
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn into_transfer(self, id: i64) -> Transfer {
        Transfer {
            id,
            origin_account_id: self.origin_account_id,
            destination_account_id: self.destination_account_id,
            amount: self.amount,
            created_at: self.created_at,
        }
    }
}
