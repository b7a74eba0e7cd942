//! Domain-level command types.
//! These structs are used by services inside the domain layer and are **not**
//! exposed over the public API. The REST layer maps the DTOs from the `shared`
//! crate onto them.

pub mod accounts {
    /// Input for opening a new account.
    #[derive(Debug, Clone)]
    pub struct CreateAccountCommand {
        pub name: String,
        pub external_id: String,
        pub secret: String,
        pub initial_balance: i64,
    }

    /// Input for checking a login.
    #[derive(Debug, Clone)]
    pub struct AuthenticateCommand {
        pub external_id: String,
        pub secret: String,
    }
}

pub mod transfers {
    /// Input for moving money between two accounts.
    ///
    /// `origin_account_id` must already be bound to the authenticated caller.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CreateTransferCommand {
        pub origin_account_id: i64,
        pub destination_account_id: i64,
        pub amount: i64,
    }
}
