use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

use super::account_repository::AccountRepository;
use super::records::{next_id, AccountRecord, TransferRecord};
use super::token_repository::TokenRepository;
use super::transfer_repository::TransferRepository;
use crate::domain::models::Transfer;
use crate::storage::traits::{Connection, TransferPosting};

pub(crate) const ACCOUNTS_FILE: &str = "accounts.csv";
pub(crate) const TRANSFERS_FILE: &str = "transfers.csv";
pub(crate) const TOKENS_FILE: &str = "tokens.csv";
const JOURNAL_FILE: &str = "pending_transfer.yaml";

/// Balance an account must end up with once a journaled transfer is applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct JournalBalance {
    account_id: i64,
    balance: i64,
}

/// Write-ahead record of a transfer that is being applied to the CSV files.
///
/// Applying it is idempotent: balances are absolute values and the transfer
/// row is only appended when its id is not already present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct PendingTransfer {
    transfer: TransferRecord,
    balances: Vec<JournalBalance>,
}

/// CsvConnection owns the data directory and serializes every file rewrite
#[derive(Clone)]
pub struct CsvConnection {
    base_directory: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl CsvConnection {
    /// Open (or create) a data directory, finishing any transfer a previous
    /// process left half-applied
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path)
                .with_context(|| format!("creating data directory {}", base_path.display()))?;
        }

        let connection = Self {
            base_directory: base_path,
            write_lock: Arc::new(Mutex::new(())),
        };
        drop(connection.lock()?);

        info!("Using CSV data directory {}", connection.base_directory.display());
        Ok(connection)
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    fn file_path(&self, file_name: &str) -> PathBuf {
        self.base_directory.join(file_name)
    }

    /// Serialize access to the data files.
    ///
    /// Readers take the lock too, so a transfer is never seen half-applied. A
    /// journal left behind by an earlier failure is replayed before the guard
    /// is handed out; while it cannot be replayed every access fails.
    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        let guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow!("CSV store lock poisoned"))?;
        self.replay_journal()?;
        Ok(guard)
    }

    pub(crate) fn read_records<T: DeserializeOwned>(&self, file_name: &str) -> Result<Vec<T>> {
        let path = self.file_path(file_name);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&path)
            .with_context(|| format!("opening {}", path.display()))?;
        let mut records = Vec::new();
        for result in reader.deserialize() {
            let record: T = result.with_context(|| format!("parsing {}", path.display()))?;
            records.push(record);
        }
        Ok(records)
    }

    /// Replace a file's content through a temp file and rename
    pub(crate) fn write_records<T: Serialize>(&self, file_name: &str, records: &[T]) -> Result<()> {
        let path = self.file_path(file_name);
        let temp_path = self.file_path(&format!("{file_name}.tmp"));

        let mut writer = csv::Writer::from_path(&temp_path)
            .with_context(|| format!("creating {}", temp_path.display()))?;
        for record in records {
            writer.serialize(record)?;
        }
        let file = writer
            .into_inner()
            .map_err(|e| anyhow!("flushing {}: {}", temp_path.display(), e.error()))?;
        file.sync_all()?;

        fs::rename(&temp_path, &path)
            .with_context(|| format!("replacing {}", path.display()))?;
        debug!("Wrote {} records to {}", records.len(), path.display());
        Ok(())
    }

    fn write_journal(&self, pending: &PendingTransfer) -> Result<()> {
        let path = self.file_path(JOURNAL_FILE);
        let temp_path = self.file_path(&format!("{JOURNAL_FILE}.tmp"));

        let content = serde_yaml::to_string(pending)?;
        fs::write(&temp_path, content)?;
        File::open(&temp_path)?.sync_all()?;
        fs::rename(&temp_path, &path)?;
        Ok(())
    }

    fn apply_pending(&self, pending: &PendingTransfer) -> Result<()> {
        let mut accounts: Vec<AccountRecord> = self.read_records(ACCOUNTS_FILE)?;
        let mut transfers: Vec<TransferRecord> = self.read_records(TRANSFERS_FILE)?;

        for change in &pending.balances {
            let account = accounts
                .iter_mut()
                .find(|account| account.id == change.account_id)
                .ok_or_else(|| anyhow!("journaled account {} is missing", change.account_id))?;
            account.balance = change.balance;
        }
        if !transfers.iter().any(|t| t.id == pending.transfer.id) {
            transfers.push(pending.transfer.clone());
        }

        self.write_records(ACCOUNTS_FILE, &accounts)?;
        self.write_records(TRANSFERS_FILE, &transfers)?;
        fs::remove_file(self.file_path(JOURNAL_FILE))?;
        Ok(())
    }

    /// Finish a transfer whose journal is still on disk. Caller holds the lock.
    fn replay_journal(&self) -> Result<()> {
        let path = self.file_path(JOURNAL_FILE);
        if !path.exists() {
            return Ok(());
        }

        let content = fs::read_to_string(&path)?;
        let pending: PendingTransfer = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;

        warn!(
            "Found unfinished transfer {} in {}, replaying it",
            pending.transfer.id,
            path.display()
        );
        self.apply_pending(&pending)
            .with_context(|| format!("replaying unfinished transfer {}", pending.transfer.id))
    }

    /// Put back whatever `apply_pending` already replaced, then drop the journal.
    ///
    /// If this fails too the journal stays and the next [`lock`](Self::lock)
    /// rolls the transfer forward instead.
    fn roll_back(&self, accounts: &[AccountRecord], transfers: &[TransferRecord]) -> Result<()> {
        if self.read_records::<AccountRecord>(ACCOUNTS_FILE)? != accounts {
            self.write_records(ACCOUNTS_FILE, accounts)?;
        }
        if self.read_records::<TransferRecord>(TRANSFERS_FILE)? != transfers {
            self.write_records(TRANSFERS_FILE, transfers)?;
        }
        fs::remove_file(self.file_path(JOURNAL_FILE))?;
        Ok(())
    }
}

#[async_trait]
impl Connection for CsvConnection {
    type AccountRepository = AccountRepository;
    type TransferRepository = TransferRepository;
    type TokenRepository = TokenRepository;

    fn create_account_repository(&self) -> Self::AccountRepository {
        AccountRepository::new(self.clone())
    }

    fn create_transfer_repository(&self) -> Self::TransferRepository {
        TransferRepository::new(self.clone())
    }

    fn create_token_repository(&self) -> Self::TokenRepository {
        TokenRepository::new(self.clone())
    }

    async fn commit_transfer(&self, posting: &TransferPosting) -> Result<Transfer> {
        let _guard = self.lock()?;

        let accounts: Vec<AccountRecord> = self.read_records(ACCOUNTS_FILE)?;
        for change in posting.changes() {
            let account = accounts
                .iter()
                .find(|account| account.id == change.account_id)
                .ok_or_else(|| anyhow!("account {} disappeared", change.account_id))?;
            if account.balance != change.expected_balance {
                bail!(
                    "balance of account {} changed concurrently (expected {}, found {})",
                    change.account_id,
                    change.expected_balance,
                    account.balance
                );
            }
        }

        let transfers: Vec<TransferRecord> = self.read_records(TRANSFERS_FILE)?;
        let transfer = posting
            .transfer
            .clone()
            .into_transfer(next_id(transfers.iter().map(|t| t.id)));

        let pending = PendingTransfer {
            transfer: TransferRecord::from(&transfer),
            balances: posting
                .changes()
                .iter()
                .map(|change| JournalBalance {
                    account_id: change.account_id,
                    balance: change.new_balance,
                })
                .collect(),
        };

        self.write_journal(&pending)?;
        if let Err(apply_err) = self.apply_pending(&pending) {
            match self.roll_back(&accounts, &transfers) {
                Ok(()) => warn!("Rolled back transfer {} after a failed write", transfer.id),
                Err(rollback_err) => error!(
                    "Could not roll back transfer {}, it will be replayed: {:#}",
                    transfer.id, rollback_err
                ),
            }
            return Err(apply_err.context(format!("applying transfer {}", transfer.id)));
        }

        debug!("Committed transfer {} to CSV files", transfer.id);
        Ok(transfer)
    }
}
