//! Domain types
//!
//! Pure ledger domain: validated monetary amounts, the four persisted record
//! types, and business-rule errors. Nothing in here touches the database or
//! the HTTP layer.

mod amount;
mod error;
mod model;

pub use amount::{Amount, AmountError};
pub use error::DomainError;
pub use model::{
    Account, AccountId, AutoTransferRule, Customer, CustomerId, RuleId, RuleKind, TransferId,
    TransferRecord,
};
