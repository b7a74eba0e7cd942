//! Server configuration from command-line flags and environment variables.
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Which storage backend the server runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackend {
    /// Process-local state, lost on exit
    Memory,
    /// CSV files in `--data-dir`
    Csv,
    /// SQLite database at `--database-url`
    Sqlite,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "ledger-server")]
#[command(about = "Ledger service: accounts, bearer tokens and atomic transfers over HTTP", long_about = None)]
pub struct LedgerConfig {
    /// Address the HTTP server listens on
    #[arg(long, env = "LEDGER_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    #[arg(long, env = "LEDGER_STORAGE", value_enum, default_value_t = StorageBackend::Csv)]
    pub storage: StorageBackend,

    /// Directory holding the CSV files
    #[arg(long, env = "LEDGER_DATA_DIR", default_value = "database")]
    pub data_dir: PathBuf,

    #[arg(long, env = "LEDGER_DATABASE_URL", default_value = "sqlite:ledger.db")]
    pub database_url: String,

    /// Token lifetime in seconds; tokens never expire when unset
    #[arg(long, env = "LEDGER_TOKEN_TTL_SECS")]
    pub token_ttl_secs: Option<u64>,

    /// Log filter, e.g. `info` or `ledger_backend=debug`
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl LedgerConfig {
    /// Lifetimes too large for a `chrono::Duration` behave like no expiry
    pub fn token_ttl(&self) -> Option<chrono::Duration> {
        self.token_ttl_secs
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(chrono::Duration::try_seconds)
    }
}
