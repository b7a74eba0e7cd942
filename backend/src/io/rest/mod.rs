//! # REST API Interface Layer
//!
//! HTTP endpoints of the ledger. Handlers decode the `shared` DTOs, call one
//! domain service and encode the result; [`errors::ApiError`] turns every
//! [`LedgerError`](crate::domain::LedgerError) into a status code and a JSON
//! error body. Bodies and paths are decoded with [`errors::ApiJson`] and
//! [`errors::ApiPath`] so malformed input gets the same error body.

pub mod account_apis;
pub mod auth_apis;
pub mod errors;
pub mod mappers;
pub mod transfer_apis;

#[cfg(test)]
pub(crate) mod test_support;

pub use errors::{ApiError, ApiJson, ApiPath};
