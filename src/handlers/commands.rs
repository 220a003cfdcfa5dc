//! Command and result definitions
//!
//! Commands represent intentions to change the ledger; results are the typed
//! payloads handlers return to the boundary. Each operation has its own
//! success shape instead of one untyped response envelope.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{AccountId, CustomerId, RuleId, RuleKind, TransferId, TransferRecord};

/// Command to register a new customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCustomerCommand {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zipcode: i32,
    pub email: String,
}

/// Command to open an account for an existing customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountCommand {
    pub customer_id: CustomerId,
    /// Opening balance; may be zero or negative
    pub opening_balance: Decimal,
}

/// Command to move funds between two accounts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferCommand {
    pub sender_account_id: AccountId,
    pub receiver_account_id: AccountId,
    pub amount: Decimal,
}

/// Command to create a standing auto-transfer rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRuleCommand {
    pub kind: RuleKind,
    pub primary_account_id: AccountId,
    pub threshold: Decimal,
    pub linked_account_id: AccountId,
    pub notes: String,
}

/// Result of a successful transfer: the persisted history record plus a
/// human-readable status message.
#[derive(Debug, Clone, Serialize)]
pub struct TransferOutcome {
    pub record: TransferRecord,
    pub message: String,
}

/// How a single rule fared during an evaluation run.
///
/// Skipped and no-op are normal per-rule results, not errors; a failed rule
/// never aborts the rest of the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleDisposition {
    /// The rule fired and a transfer was executed
    Applied,
    /// The rule's condition did not call for a transfer
    NoOp,
    /// The rule references at least one missing account
    Skipped,
    /// The executor rejected the attempted transfer
    Failed,
}

/// Per-rule outcome of an evaluation run, keyed by rule id.
#[derive(Debug, Clone, Serialize)]
pub struct RuleOutcome {
    pub rule_id: RuleId,
    pub disposition: RuleDisposition,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_id: Option<TransferId>,
}

/// One entry of an account's transfer history, tagged by direction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HistoryEntry {
    Sent {
        transfer_id: TransferId,
        to: AccountId,
        amount: Decimal,
        date: DateTime<Utc>,
    },
    Received {
        transfer_id: TransferId,
        from: AccountId,
        amount: Decimal,
        date: DateTime<Utc>,
    },
}

impl HistoryEntry {
    pub fn date(&self) -> DateTime<Utc> {
        match self {
            HistoryEntry::Sent { date, .. } | HistoryEntry::Received { date, .. } => *date,
        }
    }
}

/// An account's ordered transfer history with its current balance.
#[derive(Debug, Clone, Serialize)]
pub struct AccountHistory {
    pub account_id: AccountId,
    pub current_balance: Decimal,
    pub transfers: Vec<HistoryEntry>,
}
