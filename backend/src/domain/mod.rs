//! # Domain Module
//!
//! Business rules of the ledger: account creation and credential checks,
//! bearer tokens, and the transfer execution core.
//!
//! Services are generic over the storage [`Connection`](crate::storage::Connection)
//! and return [`LedgerResult`]; they know nothing about HTTP.

pub mod account_locks;
pub mod account_service;
pub mod auth_service;
pub mod commands;
pub mod error;
pub mod models;
pub mod transfer_service;

pub use account_service::AccountService;
pub use auth_service::{parse_bearer, AuthService};
pub use error::{AccountSide, LedgerError, LedgerResult};
pub use transfer_service::TransferService;
