//! Account creation, credential checks, and balance/listing queries.
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::domain::commands::accounts::{AuthenticateCommand, CreateAccountCommand};
use crate::domain::error::{AccountSide, LedgerError, LedgerResult};
use crate::domain::models::{Account, AccountSummary, CredentialHash, NewAccount};
use crate::storage::{AccountStorage, Connection};

#[derive(Clone)]
pub struct AccountService<C: Connection> {
    account_repository: C::AccountRepository,
}

impl<C: Connection> AccountService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            account_repository: connection.create_account_repository(),
        }
    }

    pub async fn create_account(&self, command: CreateAccountCommand) -> LedgerResult<Account> {
        info!("Creating account: name={}", command.name);

        let new_account = NewAccount::new(
            &command.name,
            &command.external_id,
            CredentialHash::from_secret(&command.secret),
            command.initial_balance,
            Utc::now(),
        )?;

        let account = self
            .account_repository
            .create_account(&new_account)
            .await
            .map_err(|e| {
                warn!("Account store rejected new account: {:#}", e);
                LedgerError::CreationFailed(format!("{e:#}"))
            })?;

        info!("Created account {} with balance {}", account.id, account.balance);
        Ok(account)
    }

    /// All accounts ordered by id, without credentials
    pub async fn read_accounts(&self) -> LedgerResult<Vec<AccountSummary>> {
        let accounts = self
            .account_repository
            .list_accounts()
            .await
            .map_err(LedgerError::persistence)?;

        info!("Found {} accounts", accounts.len());
        Ok(accounts.iter().map(Account::summary).collect())
    }

    pub async fn read_balance(&self, account_id: i64) -> LedgerResult<i64> {
        let account = self
            .account_repository
            .get_account(account_id)
            .await
            .map_err(LedgerError::persistence)?
            .ok_or(LedgerError::AccountNotFound {
                side: AccountSide::Account,
                account_id,
            })?;

        Ok(account.balance)
    }

    /// Resolve a login to an account id.
    ///
    /// Unknown external ids and wrong secrets fail the same way.
    pub async fn authenticate(&self, command: AuthenticateCommand) -> LedgerResult<i64> {
        let credential = self
            .account_repository
            .get_credential(&command.external_id)
            .await
            .map_err(|e| {
                error!("Failed to look up credential: {:#}", e);
                LedgerError::persistence(e)
            })?;

        match credential {
            Some(stored) if stored.credential_hash.matches(&command.secret) => {
                info!("Authenticated account {}", stored.account_id);
                Ok(stored.account_id)
            }
            Some(stored) => {
                warn!("Wrong secret for account {}", stored.account_id);
                Err(LedgerError::AuthFailed)
            }
            None => {
                warn!("Login attempt for unknown cpf");
                Err(LedgerError::AuthFailed)
            }
        }
    }
}
