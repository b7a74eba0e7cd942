//! Typed failures of the ledger core.
//!
//! Every operation in the domain layer returns [`LedgerResult`]. The REST layer
//! translates each variant into an HTTP status; nothing here is retried.

use std::fmt;

use thiserror::Error;

/// Which participant of an operation an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountSide {
    Origin,
    Destination,
    /// A plain lookup outside of a transfer
    Account,
}

impl fmt::Display for AccountSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountSide::Origin => write!(f, "origin"),
            AccountSide::Destination => write!(f, "destination"),
            AccountSide::Account => write!(f, "requested"),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("invalid account: {0}")]
    InvalidAccount(String),

    #[error("could not create account: {0}")]
    CreationFailed(String),

    /// Deliberately silent about whether the external id exists
    #[error("authentication failed: unknown account or wrong secret")]
    AuthFailed,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("malformed authorization header, expected 'Bearer <token>'")]
    MalformedAuthorization,

    #[error("{side} account {account_id} not found")]
    AccountNotFound { side: AccountSide, account_id: i64 },

    #[error("invalid transfer: {0}")]
    InvalidTransfer(String),

    #[error("insufficient funds: balance {balance}, requested {amount}")]
    InsufficientFunds { balance: i64, amount: i64 },

    #[error("persistence failed: {0}")]
    PersistenceFailed(String),
}

impl LedgerError {
    /// Wrap a storage failure, keeping the whole cause chain in the message
    pub fn persistence(err: anyhow::Error) -> Self {
        LedgerError::PersistenceFailed(format!("{err:#}"))
    }

    /// Stable machine-readable code used in error bodies
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::InvalidAccount(_) => "INVALID_ACCOUNT",
            LedgerError::CreationFailed(_) => "CREATION_FAILED",
            LedgerError::AuthFailed => "AUTH_FAILED",
            LedgerError::InvalidToken => "INVALID_TOKEN",
            LedgerError::MalformedAuthorization => "MALFORMED_AUTHORIZATION",
            LedgerError::AccountNotFound { .. } => "ACCOUNT_NOT_FOUND",
            LedgerError::InvalidTransfer(_) => "INVALID_TRANSFER",
            LedgerError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            LedgerError::PersistenceFailed(_) => "PERSISTENCE_FAILED",
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
