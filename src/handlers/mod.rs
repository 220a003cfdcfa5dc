//! Command Handlers module
//!
//! Handlers orchestrate the ledger operations over an injected store handle.
//! Each handler owns one boundary operation.

mod account_handler;
mod commands;
mod customer_handler;
mod history_handler;
mod rule_handler;
mod transfer_handler;

pub use account_handler::CreateAccountHandler;
pub use commands::*;
pub use customer_handler::CreateCustomerHandler;
pub use history_handler::TransferHistoryHandler;
pub use rule_handler::{CreateRuleHandler, RuleEvaluator};
pub use transfer_handler::TransferHandler;
