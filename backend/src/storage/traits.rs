//! # Storage Traits
//!
//! This module defines the storage abstraction traits that allow different
//! storage backends (memory, CSV files, SQLite) to be used interchangeably in
//! the domain layer.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::{
    Account, AuthToken, NewAccount, NewTransfer, StoredCredential, Transfer,
};

/// Trait defining the interface for account storage operations
#[async_trait]
pub trait AccountStorage: Send + Sync {
    /// Store a new account and return it with its assigned id.
    /// Fails when the external id is already taken.
    async fn create_account(&self, account: &NewAccount) -> Result<Account>;

    /// List all accounts ordered by id
    async fn list_accounts(&self) -> Result<Vec<Account>>;

    /// Retrieve a specific account by id
    async fn get_account(&self, account_id: i64) -> Result<Option<Account>>;

    /// Look up the stored credential for an external id
    async fn get_credential(&self, external_id: &str) -> Result<Option<StoredCredential>>;

    /// Overwrite the balance of an account and return the updated account
    async fn update_balance(&self, account_id: i64, balance: i64) -> Result<Account>;

    /// Remove every account (tests only)
    async fn reset(&self) -> Result<()>;
}

/// Trait defining the interface for transfer storage operations
#[async_trait]
pub trait TransferStorage: Send + Sync {
    /// Transfers whose origin is `account_id`, ordered by id
    async fn list_by_origin(&self, account_id: i64) -> Result<Vec<Transfer>>;

    /// Append a transfer record without touching any balance
    async fn create_transfer(&self, transfer: &NewTransfer) -> Result<Transfer>;

    /// Remove every transfer (tests only)
    async fn reset(&self) -> Result<()>;
}

/// Trait defining the interface for bearer token storage operations
#[async_trait]
pub trait TokenStorage: Send + Sync {
    /// Record a token, replacing any token previously issued to the same account
    async fn register_token(&self, token: &AuthToken) -> Result<()>;

    /// Find a token by its opaque value
    async fn find_token(&self, token: &str) -> Result<Option<AuthToken>>;

    /// Remove every token (tests only)
    async fn reset(&self) -> Result<()>;
}

/// One side of a posting: the balance an account is expected to hold and the
/// balance it should hold afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceChange {
    pub account_id: i64,
    pub expected_balance: i64,
    pub new_balance: i64,
}

/// Everything a completed transfer writes: a debit, a credit and the record.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferPosting {
    pub debit: BalanceChange,
    pub credit: BalanceChange,
    pub transfer: NewTransfer,
}

impl TransferPosting {
    pub fn changes(&self) -> [BalanceChange; 2] {
        [self.debit, self.credit]
    }
}

/// Trait defining the interface for storage connections
///
/// This trait abstracts away the specific connection type and provides factory
/// methods for creating repositories, plus the one operation that has to span
/// repositories: committing a transfer.
#[async_trait]
pub trait Connection: Send + Sync + Clone + 'static {
    type AccountRepository: AccountStorage + Clone + 'static;
    type TransferRepository: TransferStorage + Clone + 'static;
    type TokenRepository: TokenStorage + Clone + 'static;

    fn create_account_repository(&self) -> Self::AccountRepository;

    fn create_transfer_repository(&self) -> Self::TransferRepository;

    fn create_token_repository(&self) -> Self::TokenRepository;

    /// Apply both balance changes and append the transfer record as one unit.
    ///
    /// Each change is a compare-and-set against `expected_balance`; if either
    /// account no longer holds its expected balance nothing is written.
    async fn commit_transfer(&self, posting: &TransferPosting) -> Result<Transfer>;
}
