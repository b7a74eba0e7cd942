//! Conversions between the `shared` wire DTOs and domain types.

pub mod account_mapper;
pub mod transfer_mapper;

pub use account_mapper::AccountMapper;
pub use transfer_mapper::TransferMapper;
