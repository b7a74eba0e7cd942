pub mod account;
pub mod token;
pub mod transfer;

pub use account::{Account, AccountSummary, CredentialHash, NewAccount, StoredCredential};
pub use token::AuthToken;
pub use transfer::{NewTransfer, Transfer};
