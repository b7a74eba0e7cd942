//! # SQLite Storage Module
//!
//! Relational backend built on a `sqlx` connection pool. Timestamps are stored
//! as RFC 3339 text and credential digests as hex text.
//!
//! ## Components
//!
//! - **connection.rs** - pool setup, schema, and the transactional transfer commit
//! - **\*_repository.rs** - one repository per table

pub mod account_repository;
pub mod connection;
pub mod token_repository;
pub mod transfer_repository;

pub use account_repository::AccountRepository as SqliteAccountRepository;
pub use connection::SqliteConnection;
pub use token_repository::TokenRepository as SqliteTokenRepository;
pub use transfer_repository::TransferRepository as SqliteTransferRepository;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("invalid timestamp '{value}'"))?
        .with_timezone(&Utc))
}
