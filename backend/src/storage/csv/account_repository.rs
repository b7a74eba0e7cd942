//! # CSV Account Repository
//!
//! Accounts live in `{data_dir}/accounts.csv`, one row per account with the
//! credential digest hex-encoded. Every write rewrites the whole file through a
//! temp file.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use tracing::info;

use super::connection::{CsvConnection, ACCOUNTS_FILE};
use super::records::{next_id, AccountRecord};
use crate::domain::models::{Account, NewAccount, StoredCredential};
use crate::storage::traits::AccountStorage;

#[derive(Clone)]
pub struct AccountRepository {
    connection: CsvConnection,
}

impl AccountRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn read_accounts(&self) -> Result<Vec<Account>> {
        let _guard = self.connection.lock()?;
        self.connection
            .read_records::<AccountRecord>(ACCOUNTS_FILE)?
            .into_iter()
            .map(AccountRecord::into_account)
            .collect()
    }
}

#[async_trait]
impl AccountStorage for AccountRepository {
    async fn create_account(&self, account: &NewAccount) -> Result<Account> {
        let _guard = self.connection.lock()?;
        let mut records: Vec<AccountRecord> = self.connection.read_records(ACCOUNTS_FILE)?;

        if records.iter().any(|r| r.external_id == account.external_id()) {
            bail!("an account with cpf '{}' already exists", account.external_id());
        }

        let account = account
            .clone()
            .into_account(next_id(records.iter().map(|r| r.id)));
        records.push(AccountRecord::from(&account));
        self.connection.write_records(ACCOUNTS_FILE, &records)?;

        info!("Stored account {} in {}", account.id, ACCOUNTS_FILE);
        Ok(account)
    }

    async fn list_accounts(&self) -> Result<Vec<Account>> {
        let mut accounts = self.read_accounts()?;
        accounts.sort_by_key(|account| account.id);
        Ok(accounts)
    }

    async fn get_account(&self, account_id: i64) -> Result<Option<Account>> {
        Ok(self
            .read_accounts()?
            .into_iter()
            .find(|account| account.id == account_id))
    }

    async fn get_credential(&self, external_id: &str) -> Result<Option<StoredCredential>> {
        Ok(self
            .read_accounts()?
            .into_iter()
            .find(|account| account.external_id == external_id)
            .map(|account| StoredCredential {
                account_id: account.id,
                credential_hash: account.credential_hash,
            }))
    }

    async fn update_balance(&self, account_id: i64, balance: i64) -> Result<Account> {
        let _guard = self.connection.lock()?;
        let mut records: Vec<AccountRecord> = self.connection.read_records(ACCOUNTS_FILE)?;

        let record = records
            .iter_mut()
            .find(|r| r.id == account_id)
            .ok_or_else(|| anyhow!("account {account_id} not found"))?;
        record.balance = balance;
        let updated = record.clone();

        self.connection.write_records(ACCOUNTS_FILE, &records)?;
        updated.into_account()
    }

    async fn reset(&self) -> Result<()> {
        let _guard = self.connection.lock()?;
        self.connection
            .write_records::<AccountRecord>(ACCOUNTS_FILE, &[])
    }
}
