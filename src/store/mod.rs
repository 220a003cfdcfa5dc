//! Ledger Store
//!
//! The storage seam of the service. Handlers receive a store handle through
//! their constructor instead of reaching for a module-level connection
//! factory, so the same engine code runs against Postgres in production and
//! the in-memory store in tests.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Account, AccountId, AutoTransferRule, Customer, CustomerId, TransferRecord};

mod memory;
mod postgres;

pub use memory::MemoryLedgerStore;
pub use postgres::PgLedgerStore;

/// Which record type a generated six-digit identifier will key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdNamespace {
    Customer,
    Account,
}

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        required: rust_decimal::Decimal,
        available: rust_decimal::Decimal,
    },

    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Durable storage for the four ledger record types.
///
/// `apply_transfer` is the store's atomic read-modify-write contract: the
/// balance check, both balance mutations, and the history insert happen in
/// one transaction, or not at all.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn insert_customer(&self, customer: &Customer) -> Result<(), StoreError>;

    async fn customer(&self, customer_id: CustomerId) -> Result<Option<Customer>, StoreError>;

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError>;

    async fn account(&self, account_id: AccountId) -> Result<Option<Account>, StoreError>;

    /// Whether a generated identifier is already present in the given namespace.
    async fn id_taken(&self, namespace: IdNamespace, id: i64) -> Result<bool, StoreError>;

    /// Atomically debit the sender, credit the receiver, and persist the
    /// history row. Fails with `AccountNotFound` or `InsufficientBalance`
    /// without any partial effect.
    async fn apply_transfer(&self, record: &TransferRecord) -> Result<(), StoreError>;

    /// All transfers where the account appears as sender or receiver, in
    /// store order (ascending transfer time).
    async fn transfers_for_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<TransferRecord>, StoreError>;

    async fn insert_rule(&self, rule: &AutoTransferRule) -> Result<(), StoreError>;

    /// All auto-transfer rules, ordered by creation time then rule id so
    /// evaluation order is deterministic across runs.
    async fn rules(&self) -> Result<Vec<AutoTransferRule>, StoreError>;
}
