//! # Storage Module
//!
//! Handles all data persistence for the ledger.
//!
//! The domain layer only sees the traits in [`traits`]; the backend is picked at
//! startup and injected through the [`Connection`] factory.
//!
//! ## Backends
//!
//! - **memory** - process-local state behind a mutex, nothing persisted
//! - **csv** - one CSV file per entity in a data directory, journaled transfers
//! - **sqlite** - relational storage through a `sqlx` pool, transactional transfers

pub mod csv;
pub mod memory;
pub mod sqlite;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_utils;

pub use self::csv::CsvConnection;
pub use memory::MemoryConnection;
pub use sqlite::SqliteConnection;
pub use traits::{
    AccountStorage, BalanceChange, Connection, TokenStorage, TransferPosting, TransferStorage,
};
