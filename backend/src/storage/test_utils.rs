//! Storage contract checks shared by every backend.
//!
//! Each `check_*` function drives a fresh [`Connection`] through the behaviour
//! the domain layer relies on; the tests at the bottom run them against the
//! memory, CSV and SQLite backends.

use chrono::Utc;

use super::traits::{
    AccountStorage, BalanceChange, Connection, TokenStorage, TransferPosting, TransferStorage,
};
use crate::domain::models::{Account, AuthToken, CredentialHash, NewAccount, NewTransfer};

pub(crate) async fn create_account<C: Connection>(conn: &C, cpf: &str, balance: i64) -> Account {
    let account = NewAccount::new(
        &format!("holder {cpf}"),
        cpf,
        CredentialHash::from_secret("secret"),
        balance,
        Utc::now(),
    )
    .unwrap();
    conn.create_account_repository()
        .create_account(&account)
        .await
        .unwrap()
}

pub(crate) async fn check_account_storage<C: Connection>(conn: C) {
    let repo = conn.create_account_repository();

    let first = create_account(&conn, "111", 100).await;
    let second = create_account(&conn, "222", 0).await;
    assert!(second.id > first.id);

    let duplicate = NewAccount::new("Other", "111", CredentialHash::from_secret("x"), 0, Utc::now())
        .unwrap();
    assert!(repo.create_account(&duplicate).await.is_err());

    let listed = repo.list_accounts().await.unwrap();
    assert_eq!(listed.iter().map(|a| a.id).collect::<Vec<_>>(), vec![first.id, second.id]);

    assert_eq!(repo.get_account(first.id).await.unwrap(), Some(first.clone()));
    assert_eq!(repo.get_account(9_999).await.unwrap(), None);

    let credential = repo.get_credential("111").await.unwrap().unwrap();
    assert_eq!(credential.account_id, first.id);
    assert!(credential.credential_hash.matches("secret"));
    assert!(repo.get_credential("nobody").await.unwrap().is_none());

    let updated = repo.update_balance(second.id, 42).await.unwrap();
    assert_eq!(updated.balance, 42);
    assert_eq!(repo.get_account(second.id).await.unwrap().unwrap().balance, 42);
    assert!(repo.update_balance(9_999, 1).await.is_err());

    repo.reset().await.unwrap();
    assert!(repo.list_accounts().await.unwrap().is_empty());
}

pub(crate) async fn check_transfer_storage<C: Connection>(conn: C) {
    let repo = conn.create_transfer_repository();
    let x = create_account(&conn, "111", 100).await;
    let y = create_account(&conn, "222", 0).await;

    let first = repo
        .create_transfer(&NewTransfer::new(x.id, y.id, 10, Utc::now()).unwrap())
        .await
        .unwrap();
    let second = repo
        .create_transfer(&NewTransfer::new(x.id, y.id, 5, Utc::now()).unwrap())
        .await
        .unwrap();
    repo.create_transfer(&NewTransfer::new(y.id, x.id, 1, Utc::now()).unwrap())
        .await
        .unwrap();

    let outgoing = repo.list_by_origin(x.id).await.unwrap();
    assert_eq!(outgoing, vec![first, second]);
    assert_eq!(repo.list_by_origin(y.id).await.unwrap().len(), 1);

    repo.reset().await.unwrap();
    assert!(repo.list_by_origin(x.id).await.unwrap().is_empty());
}

pub(crate) async fn check_token_storage<C: Connection>(conn: C) {
    let repo = conn.create_token_repository();

    let first = AuthToken::issue(1, Utc::now());
    repo.register_token(&first).await.unwrap();
    assert_eq!(repo.find_token(&first.token).await.unwrap(), Some(first.clone()));

    let relogin = AuthToken::issue(1, Utc::now());
    repo.register_token(&relogin).await.unwrap();
    assert!(repo.find_token(&first.token).await.unwrap().is_none());
    assert_eq!(repo.find_token(&relogin.token).await.unwrap(), Some(relogin.clone()));

    let other = AuthToken::issue(2, Utc::now());
    repo.register_token(&other).await.unwrap();
    assert!(repo.find_token(&relogin.token).await.unwrap().is_some());

    repo.reset().await.unwrap();
    assert!(repo.find_token(&other.token).await.unwrap().is_none());
}

pub(crate) async fn check_commit_transfer<C: Connection>(conn: C) {
    let accounts = conn.create_account_repository();
    let transfers = conn.create_transfer_repository();
    let x = create_account(&conn, "111", 100).await;
    let y = create_account(&conn, "222", 0).await;

    let posting = TransferPosting {
        debit: BalanceChange { account_id: x.id, expected_balance: 100, new_balance: 70 },
        credit: BalanceChange { account_id: y.id, expected_balance: 0, new_balance: 30 },
        transfer: NewTransfer::new(x.id, y.id, 30, Utc::now()).unwrap(),
    };
    let committed = conn.commit_transfer(&posting).await.unwrap();
    assert_eq!(committed.amount, 30);
    assert_eq!(accounts.get_account(x.id).await.unwrap().unwrap().balance, 70);
    assert_eq!(accounts.get_account(y.id).await.unwrap().unwrap().balance, 30);
    assert_eq!(transfers.list_by_origin(x.id).await.unwrap(), vec![committed]);

    // Replaying the same posting is stale now: nothing may change
    assert!(conn.commit_transfer(&posting).await.is_err());
    assert_eq!(accounts.get_account(x.id).await.unwrap().unwrap().balance, 70);
    assert_eq!(accounts.get_account(y.id).await.unwrap().unwrap().balance, 30);
    assert_eq!(transfers.list_by_origin(x.id).await.unwrap().len(), 1);

    // A stale credit side must also roll back the debit
    let stale_credit = TransferPosting {
        debit: BalanceChange { account_id: x.id, expected_balance: 70, new_balance: 60 },
        credit: BalanceChange { account_id: y.id, expected_balance: 999, new_balance: 40 },
        transfer: NewTransfer::new(x.id, y.id, 10, Utc::now()).unwrap(),
    };
    assert!(conn.commit_transfer(&stale_credit).await.is_err());
    assert_eq!(accounts.get_account(x.id).await.unwrap().unwrap().balance, 70);
    assert_eq!(transfers.list_by_origin(x.id).await.unwrap().len(), 1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{CsvConnection, MemoryConnection, SqliteConnection};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_memory_backend_contract() {
        check_account_storage(MemoryConnection::new()).await;
        check_transfer_storage(MemoryConnection::new()).await;
        check_token_storage(MemoryConnection::new()).await;
        check_commit_transfer(MemoryConnection::new()).await;
    }

    #[tokio::test]
    async fn test_csv_backend_contract() {
        for check in 0..4 {
            let temp_dir = TempDir::new().unwrap();
            let conn = CsvConnection::new(temp_dir.path()).unwrap();
            match check {
                0 => check_account_storage(conn).await,
                1 => check_transfer_storage(conn).await,
                2 => check_token_storage(conn).await,
                _ => check_commit_transfer(conn).await,
            }
        }
    }

    #[tokio::test]
    async fn test_sqlite_backend_contract() {
        check_account_storage(SqliteConnection::in_memory().await.unwrap()).await;
        check_transfer_storage(SqliteConnection::in_memory().await.unwrap()).await;
        check_token_storage(SqliteConnection::in_memory().await.unwrap()).await;
        check_commit_transfer(SqliteConnection::in_memory().await.unwrap()).await;
    }

    #[tokio::test]
    async fn test_sqlite_file_database_persists() {
        let temp_dir = TempDir::new().unwrap();
        let url = format!("sqlite://{}", temp_dir.path().join("ledger.db").display());

        let conn = SqliteConnection::new(&url).await.unwrap();
        let account = create_account(&conn, "111", 100).await;
        conn.pool().close().await;

        let reopened = SqliteConnection::new(&url).await.unwrap();
        let stored = reopened
            .create_account_repository()
            .get_account(account.id)
            .await
            .unwrap();
        assert_eq!(stored, Some(account));
    }
}
