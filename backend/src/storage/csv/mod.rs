//! # CSV Storage Module
//!
//! File-backed storage: one CSV file per entity inside a data directory.
//!
//! ## File Structure
//!
//! ```text
//! database/
//! ├── accounts.csv
//! ├── transfers.csv
//! ├── tokens.csv
//! └── pending_transfer.yaml    ← only present while a transfer is being applied
//! ```
//!
//! ## Features
//!
//! - Atomic file writes with temp files
//! - Auto-incrementing ID generation
//! - Write-ahead journal so a crash mid-transfer is replayed on the next open

pub mod account_repository;
pub mod connection;
mod records;
pub mod token_repository;
pub mod transfer_repository;

pub use account_repository::AccountRepository;
pub use connection::CsvConnection;
pub use token_repository::TokenRepository;
pub use transfer_repository::TransferRepository;
