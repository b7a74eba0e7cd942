use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ledger_backend::config::{LedgerConfig, StorageBackend};
use ledger_backend::serve;
use ledger_backend::storage::{CsvConnection, MemoryConnection, SqliteConnection};

#[tokio::main]
async fn main() -> Result<()> {
    let config = LedgerConfig::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Setting up {:?} storage", config.storage);
    match config.storage {
        StorageBackend::Memory => serve(MemoryConnection::new(), &config).await,
        StorageBackend::Csv => {
            info!("Using data directory {}", config.data_dir.display());
            let connection = CsvConnection::new(&config.data_dir)?;
            serve(connection, &config).await
        }
        StorageBackend::Sqlite => {
            info!("Using database {}", config.database_url);
            let connection = SqliteConnection::new(&config.database_url).await?;
            serve(connection, &config).await
        }
    }
}
