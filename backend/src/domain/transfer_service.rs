//! Transfer service.
//!
//! Executes money movements between two accounts. Every transfer runs under the
//! locks of both accounts involved, computes the new balances through
//! [`Account::transfer_to`] and hands the result to the store as a single
//! [`TransferPosting`]. The store is the source of truth: balances mutated in
//! memory are discarded if the commit fails.
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::domain::account_locks::AccountLocks;
use crate::domain::commands::transfers::CreateTransferCommand;
use crate::domain::error::{AccountSide, LedgerError, LedgerResult};
use crate::domain::models::{Account, Transfer};
use crate::storage::{
    AccountStorage, BalanceChange, Connection, TransferPosting, TransferStorage,
};

#[derive(Clone)]
pub struct TransferService<C: Connection> {
    connection: Arc<C>,
    account_repository: C::AccountRepository,
    transfer_repository: C::TransferRepository,
    locks: AccountLocks,
}

impl<C: Connection> TransferService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            account_repository: connection.create_account_repository(),
            transfer_repository: connection.create_transfer_repository(),
            connection,
            locks: AccountLocks::new(),
        }
    }

    /// Move `amount` from the origin to the destination account.
    ///
    /// The origin must already be bound to the authenticated caller.
    pub async fn create_transfer(&self, command: CreateTransferCommand) -> LedgerResult<Transfer> {
        info!(
            "Creating transfer: origin={}, destination={}, amount={}",
            command.origin_account_id, command.destination_account_id, command.amount
        );

        let _guard = self
            .locks
            .lock_accounts(&[command.origin_account_id, command.destination_account_id])
            .await;

        let mut origin = self
            .load_account(command.origin_account_id, AccountSide::Origin)
            .await?;
        let mut destination = self
            .load_account(command.destination_account_id, AccountSide::Destination)
            .await?;

        if origin.id == destination.id {
            warn!("Rejected self-transfer on account {}", origin.id);
            return Err(LedgerError::InvalidTransfer(
                "origin and destination must differ".to_string(),
            ));
        }

        let debit_before = origin.balance;
        let credit_before = destination.balance;

        let new_transfer = origin
            .transfer_to(&mut destination, command.amount, Utc::now())
            .map_err(|e| {
                warn!("Transfer rejected: {}", e);
                e
            })?;

        let posting = TransferPosting {
            debit: BalanceChange {
                account_id: origin.id,
                expected_balance: debit_before,
                new_balance: origin.balance,
            },
            credit: BalanceChange {
                account_id: destination.id,
                expected_balance: credit_before,
                new_balance: destination.balance,
            },
            transfer: new_transfer,
        };

        let transfer = self.connection.commit_transfer(&posting).await.map_err(|e| {
            error!(
                "Failed to commit transfer {} -> {}: {:#}",
                origin.id, destination.id, e
            );
            LedgerError::persistence(e)
        })?;

        info!(
            "Committed transfer {}: {} -> {} ({}), balances now {} / {}",
            transfer.id,
            origin.id,
            destination.id,
            transfer.amount,
            origin.balance,
            destination.balance
        );
        Ok(transfer)
    }

    /// Outgoing transfers of an account, oldest first
    pub async fn read_transfers_by_account(&self, account_id: i64) -> LedgerResult<Vec<Transfer>> {
        let transfers = self
            .transfer_repository
            .list_by_origin(account_id)
            .await
            .map_err(LedgerError::persistence)?;

        info!("Found {} transfers from account {}", transfers.len(), account_id);
        Ok(transfers)
    }

    async fn load_account(&self, account_id: i64, side: AccountSide) -> LedgerResult<Account> {
        self.account_repository
            .get_account(account_id)
            .await
            .map_err(LedgerError::persistence)?
            .ok_or_else(|| {
                warn!("{} account {} not found", side, account_id);
                LedgerError::AccountNotFound { side, account_id }
            })
    }
}
