//! # In-Memory Storage
//!
//! All three repositories share one `Mutex`-guarded state, so a transfer
//! commit is atomic simply by holding the lock for the whole posting.
//! Nothing survives a restart.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use tracing::debug;

use super::traits::{
    AccountStorage, Connection, TokenStorage, TransferPosting, TransferStorage,
};
use crate::domain::models::{
    Account, AuthToken, NewAccount, NewTransfer, StoredCredential, Transfer,
};

#[derive(Debug)]
struct MemoryState {
    accounts: BTreeMap<i64, Account>,
    transfers: Vec<Transfer>,
    /// account id -> its single live token
    tokens: HashMap<i64, AuthToken>,
    next_account_id: i64,
    next_transfer_id: i64,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            accounts: BTreeMap::new(),
            transfers: Vec::new(),
            tokens: HashMap::new(),
            next_account_id: 1,
            next_transfer_id: 1,
        }
    }
}

impl MemoryState {
    fn append_transfer(&mut self, transfer: &NewTransfer) -> Transfer {
        let transfer = transfer.clone().into_transfer(self.next_transfer_id);
        self.next_transfer_id += 1;
        self.transfers.push(transfer.clone());
        transfer
    }
}

#[derive(Clone, Default)]
pub struct MemoryConnection {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryConnection {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        lock_state(&self.state)
    }
}

fn lock_state(state: &Mutex<MemoryState>) -> Result<MutexGuard<'_, MemoryState>> {
    state
        .lock()
        .map_err(|_| anyhow!("in-memory store lock poisoned"))
}

#[async_trait]
impl Connection for MemoryConnection {
    type AccountRepository = MemoryAccountRepository;
    type TransferRepository = MemoryTransferRepository;
    type TokenRepository = MemoryTokenRepository;

    fn create_account_repository(&self) -> Self::AccountRepository {
        MemoryAccountRepository {
            state: self.state.clone(),
        }
    }

    fn create_transfer_repository(&self) -> Self::TransferRepository {
        MemoryTransferRepository {
            state: self.state.clone(),
        }
    }

    fn create_token_repository(&self) -> Self::TokenRepository {
        MemoryTokenRepository {
            state: self.state.clone(),
        }
    }

    async fn commit_transfer(&self, posting: &TransferPosting) -> Result<Transfer> {
        let mut state = self.lock()?;

        for change in posting.changes() {
            let account = state
                .accounts
                .get(&change.account_id)
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

        for change in posting.changes() {
            if let Some(account) = state.accounts.get_mut(&change.account_id) {
                account.balance = change.new_balance;
            }
        }
        let transfer = state.append_transfer(&posting.transfer);

        debug!("Committed transfer {} in memory", transfer.id);
        Ok(transfer)
    }
}

#[derive(Clone)]
pub struct MemoryAccountRepository {
    state: Arc<Mutex<MemoryState>>,
}

#[async_trait]
impl AccountStorage for MemoryAccountRepository {
    async fn create_account(&self, account: &NewAccount) -> Result<Account> {
        let mut state = lock_state(&self.state)?;

        if state
            .accounts
            .values()
            .any(|existing| existing.external_id == account.external_id())
        {
            bail!("an account with cpf '{}' already exists", account.external_id());
        }

        let id = state.next_account_id;
        state.next_account_id += 1;
        let account = account.clone().into_account(id);
        state.accounts.insert(id, account.clone());

        Ok(account)
    }

    async fn list_accounts(&self) -> Result<Vec<Account>> {
        let state = lock_state(&self.state)?;
        Ok(state.accounts.values().cloned().collect())
    }

    async fn get_account(&self, account_id: i64) -> Result<Option<Account>> {
        let state = lock_state(&self.state)?;
        Ok(state.accounts.get(&account_id).cloned())
    }

    async fn get_credential(&self, external_id: &str) -> Result<Option<StoredCredential>> {
        let state = lock_state(&self.state)?;
        Ok(state
            .accounts
            .values()
            .find(|account| account.external_id == external_id)
            .map(|account| StoredCredential {
                account_id: account.id,
                credential_hash: account.credential_hash.clone(),
            }))
    }

    async fn update_balance(&self, account_id: i64, balance: i64) -> Result<Account> {
        let mut state = lock_state(&self.state)?;
        let account = state
            .accounts
            .get_mut(&account_id)
            .ok_or_else(|| anyhow!("account {account_id} not found"))?;
        account.balance = balance;
        Ok(account.clone())
    }

    async fn reset(&self) -> Result<()> {
        let mut state = lock_state(&self.state)?;
        state.accounts.clear();
        state.next_account_id = 1;
        Ok(())
    }
}

#[derive(Clone)]
pub struct MemoryTransferRepository {
    state: Arc<Mutex<MemoryState>>,
}

#[async_trait]
impl TransferStorage for MemoryTransferRepository {
    async fn list_by_origin(&self, account_id: i64) -> Result<Vec<Transfer>> {
        let state = lock_state(&self.state)?;
        Ok(state
            .transfers
            .iter()
            .filter(|transfer| transfer.origin_account_id == account_id)
            .cloned()
            .collect())
    }

    async fn create_transfer(&self, transfer: &NewTransfer) -> Result<Transfer> {
        let mut state = lock_state(&self.state)?;
        Ok(state.append_transfer(transfer))
    }

    async fn reset(&self) -> Result<()> {
        let mut state = lock_state(&self.state)?;
        state.transfers.clear();
        state.next_transfer_id = 1;
        Ok(())
    }
}

#[derive(Clone)]
pub struct MemoryTokenRepository {
    state: Arc<Mutex<MemoryState>>,
}

#[async_trait]
impl TokenStorage for MemoryTokenRepository {
    async fn register_token(&self, token: &AuthToken) -> Result<()> {
        let mut state = lock_state(&self.state)?;
        state.tokens.insert(token.account_id, token.clone());
        Ok(())
    }

    async fn find_token(&self, token: &str) -> Result<Option<AuthToken>> {
        let state = lock_state(&self.state)?;
        Ok(state.tokens.values().find(|t| t.token == token).cloned())
    }

    async fn reset(&self) -> Result<()> {
        let mut state = lock_state(&self.state)?;
        state.tokens.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::traits::BalanceChange;
    use crate::domain::models::CredentialHash;
    use chrono::Utc;

    fn new_account(cpf: &str, balance: i64) -> NewAccount {
        NewAccount::new("Ana", cpf, CredentialHash::from_secret("s"), balance, Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn test_ids_are_sequential_and_cpf_unique() {
        let conn = MemoryConnection::new();
        let repo = conn.create_account_repository();

        let first = repo.create_account(&new_account("111", 10)).await.unwrap();
        let second = repo.create_account(&new_account("222", 0)).await.unwrap();
        assert_eq!((first.id, second.id), (1, 2));

        assert!(repo.create_account(&new_account("111", 0)).await.is_err());
        assert_eq!(repo.list_accounts().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_commit_rejects_stale_balance_and_writes_nothing() {
        let conn = MemoryConnection::new();
        let accounts = conn.create_account_repository();
        let origin = accounts.create_account(&new_account("111", 100)).await.unwrap();
        let destination = accounts.create_account(&new_account("222", 0)).await.unwrap();

        let posting = TransferPosting {
            debit: BalanceChange { account_id: origin.id, expected_balance: 90, new_balance: 60 },
            credit: BalanceChange { account_id: destination.id, expected_balance: 0, new_balance: 30 },
            transfer: NewTransfer::new(origin.id, destination.id, 30, Utc::now()).unwrap(),
        };

        assert!(conn.commit_transfer(&posting).await.is_err());
        assert_eq!(accounts.get_account(origin.id).await.unwrap().unwrap().balance, 100);
        assert_eq!(accounts.get_account(destination.id).await.unwrap().unwrap().balance, 0);
        let transfers = conn.create_transfer_repository();
        assert!(transfers.list_by_origin(origin.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_token_replaced_on_relogin() {
        let conn = MemoryConnection::new();
        let tokens = conn.create_token_repository();

        let first = AuthToken::issue(1, Utc::now());
        let second = AuthToken::issue(1, Utc::now());
        tokens.register_token(&first).await.unwrap();
        tokens.register_token(&second).await.unwrap();

        assert!(tokens.find_token(&first.token).await.unwrap().is_none());
        assert_eq!(tokens.find_token(&second.token).await.unwrap(), Some(second));
    }
}
