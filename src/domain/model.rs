//! Ledger record types
//!
//! The four persisted record shapes: customers, accounts, transfer history
//! rows, and auto-transfer rules. Customer and account identifiers are
//! generated six-digit numbers; transfer and rule identifiers are UUIDs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::DomainError;

pub type CustomerId = i64;
pub type AccountId = i64;
pub type TransferId = Uuid;
pub type RuleId = Uuid;

/// A bank customer. Owns zero or more accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zipcode: i32,
    pub email: String,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

/// A customer account holding a balance.
///
/// The balance is a plain decimal: transfers keep it non-negative via the
/// executor's balance check, but an account may be opened with any balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: AccountId,
    pub customer_id: CustomerId,
    pub balance: Decimal,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

/// Immutable record of a completed transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub transfer_id: TransferId,
    pub sender_account_id: AccountId,
    pub receiver_account_id: AccountId,
    pub amount: Decimal,
    pub transfer_time: DateTime<Utc>,
}

impl TransferRecord {
    /// Build a new record with a fresh transfer id and the current time.
    pub fn new(sender: AccountId, receiver: AccountId, amount: Decimal) -> Self {
        Self {
            transfer_id: Uuid::new_v4(),
            sender_account_id: sender,
            receiver_account_id: receiver,
            amount,
            transfer_time: Utc::now(),
        }
    }
}

/// The two supported auto-transfer rule kinds.
///
/// `ZeroBalance` sweeps the primary account's entire positive balance into
/// the linked account. `TargetBalance` tops the primary account up from the
/// linked account until it reaches the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleKind {
    ZeroBalance,
    TargetBalance,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::ZeroBalance => "ZERO_BALANCE",
            RuleKind::TargetBalance => "TARGET_BALANCE",
        }
    }

    /// Validate the kind/threshold combination.
    ///
    /// A zero-balance rule always fires against a threshold of 0; a
    /// target-balance rule is meaningless with one.
    pub fn validate_threshold(&self, threshold: Decimal) -> Result<(), DomainError> {
        match self {
            RuleKind::ZeroBalance if threshold != Decimal::ZERO => {
                Err(DomainError::InvalidRuleThreshold(
                    "For ZERO_BALANCE rules the threshold must be 0".to_string(),
                ))
            }
            RuleKind::TargetBalance if threshold == Decimal::ZERO => {
                Err(DomainError::InvalidRuleThreshold(
                    "For TARGET_BALANCE rules the threshold must be non-zero".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ZERO_BALANCE" => Ok(RuleKind::ZeroBalance),
            "TARGET_BALANCE" => Ok(RuleKind::TargetBalance),
            other => Err(DomainError::InvalidRuleKind(other.to_string())),
        }
    }
}

/// A standing auto-transfer instruction.
///
/// Rules persist indefinitely and are re-evaluated on every execution cycle;
/// there is no expiry or disable flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoTransferRule {
    pub rule_id: RuleId,
    pub kind: RuleKind,
    pub primary_account_id: AccountId,
    pub threshold: Decimal,
    pub linked_account_id: AccountId,
    pub notes: String,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}
