//! # IO Module
//!
//! Adapter layer between HTTP clients and the domain services. Only REST is
//! exposed today.

pub mod rest;

pub use rest::*;
