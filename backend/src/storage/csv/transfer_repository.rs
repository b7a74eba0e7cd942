//! # CSV Transfer Repository
//!
//! Append-only audit trail in `{data_dir}/transfers.csv`:
//!
//! ```csv
//! id,origin_account_id,destination_account_id,amount,created_at
//! 1,1,2,30,2024-01-15T10:30:00Z
//! ```

use anyhow::Result;
use async_trait::async_trait;

use super::connection::{CsvConnection, TRANSFERS_FILE};
use super::records::{next_id, TransferRecord};
use crate::domain::models::{NewTransfer, Transfer};
use crate::storage::traits::TransferStorage;

#[derive(Clone)]
pub struct TransferRepository {
    connection: CsvConnection,
}

impl TransferRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl TransferStorage for TransferRepository {
    async fn list_by_origin(&self, account_id: i64) -> Result<Vec<Transfer>> {
        let _guard = self.connection.lock()?;
        let mut transfers: Vec<Transfer> = self
            .connection
            .read_records::<TransferRecord>(TRANSFERS_FILE)?
            .into_iter()
            .filter(|record| record.origin_account_id == account_id)
            .map(Transfer::from)
            .collect();
        transfers.sort_by_key(|transfer| transfer.id);
        Ok(transfers)
    }

    async fn create_transfer(&self, transfer: &NewTransfer) -> Result<Transfer> {
        let _guard = self.connection.lock()?;
        let mut records: Vec<TransferRecord> = self.connection.read_records(TRANSFERS_FILE)?;

        let transfer = transfer
            .clone()
            .into_transfer(next_id(records.iter().map(|r| r.id)));
        records.push(TransferRecord::from(&transfer));
        self.connection.write_records(TRANSFERS_FILE, &records)?;

        Ok(transfer)
    }

    async fn reset(&self) -> Result<()> {
        let _guard = self.connection.lock()?;
        self.connection
            .write_records::<TransferRecord>(TRANSFERS_FILE, &[])
    }
}
