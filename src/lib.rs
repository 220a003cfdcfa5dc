//! mw-bank Library
//!
//! Retail banking ledger: customers, accounts, transfers, and rule-driven
//! automatic transfers. Re-exports modules for integration testing and
//! external use.

pub mod api;
pub mod domain;
pub mod handlers;
pub mod idgen;
pub mod store;

// Modules primarily used by the binary
pub mod config;
pub mod db;
mod error;

pub use config::Config;
pub use domain::{Amount, AmountError, DomainError};
pub use error::{AppError, AppResult};
