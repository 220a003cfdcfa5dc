//! Domain Error Types
//!
//! Business-rule violations, independent of the web and storage layers.

use thiserror::Error;

use super::{AccountId, CustomerId};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Sender balance does not cover the transfer amount
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        required: rust_decimal::Decimal,
        available: rust_decimal::Decimal,
    },

    /// Transfer references an account that does not exist
    #[error("Invalid account: {0}")]
    InvalidAccount(AccountId),

    /// Invalid transfer amount (zero, negative, or unparseable)
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Transfer where sender and receiver are the same account
    #[error("Cannot transfer to the same account")]
    SameAccountTransfer,

    /// Customer lookup missed
    #[error("Customer not found: {0}")]
    CustomerNotFound(CustomerId),

    /// Account lookup missed
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Unknown auto-transfer rule kind
    #[error("Invalid rule type: {0}. Must be 'ZERO_BALANCE' or 'TARGET_BALANCE'")]
    InvalidRuleKind(String),

    /// Rule kind and threshold do not agree
    #[error("{0}")]
    InvalidRuleThreshold(String),
}

impl DomainError {
    /// Create an insufficient balance error
    pub fn insufficient_balance(
        required: rust_decimal::Decimal,
        available: rust_decimal::Decimal,
    ) -> Self {
        Self::InsufficientBalance {
            required,
            available,
        }
    }

    /// Check if this is a missing-record error (maps to 404 at the boundary)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::CustomerNotFound(_) | Self::AccountNotFound(_)
        )
    }
}
