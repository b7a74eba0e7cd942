//! Wire types exchanged between the ledger HTTP API and its clients.
//!
//! Field names follow the public JSON contract (`cpf`, `account_origin_id`, ...),
//! so these structs are deliberately kept separate from the backend's domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /accounts`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    pub name: String,
    /// External credential key (national ID)
    pub cpf: String,
    /// Raw secret, hashed by the backend and never stored
    pub secret: String,
    /// Opening balance in minor currency units
    #[serde(default)]
    pub balance: i64,
}

/// Public view of an account. The credential hash never leaves the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub id: i64,
    pub name: String,
    pub cpf: String,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
}

/// Response of `GET /accounts/:id/balance`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub id: i64,
    pub balance: i64,
}

/// Body of `POST /login`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub cpf: String,
    pub secret: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Body of `POST /transfers`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTransferRequest {
    /// Ignored in favour of the authenticated account when it disagrees
    #[serde(default)]
    pub account_origin_id: Option<i64>,
    pub account_destination_id: i64,
    pub amount: i64,
}

/// A persisted transfer as returned by `POST /transfers` and `GET /transfers`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub id: i64,
    pub account_origin_id: i64,
    pub account_destination_id: i64,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// Error body returned with every non-2xx response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}
