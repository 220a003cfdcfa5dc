//! In-memory ledger store
//!
//! Used by the test suite and for local development without Postgres. A
//! single mutex stands in for the database transaction: `apply_transfer`
//! checks and mutates under one lock, so the atomicity contract matches the
//! Postgres implementation.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::domain::{
    Account, AccountId, AutoTransferRule, Customer, CustomerId, TransferRecord,
};

use super::{IdNamespace, LedgerStore, StoreError};

#[derive(Debug, Default)]
struct Inner {
    customers: HashMap<CustomerId, Customer>,
    accounts: HashMap<AccountId, Account>,
    transfers: Vec<TransferRecord>,
    rules: Vec<AutoTransferRule>,
}

/// Ledger store held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedgerStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock means a panicking test; propagate the panic.
        self.inner.lock().expect("memory store lock poisoned")
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn insert_customer(&self, customer: &Customer) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.customers.values().any(|c| c.email == customer.email) {
            return Err(StoreError::DuplicateEmail(customer.email.clone()));
        }
        inner.customers.insert(customer.customer_id, customer.clone());
        Ok(())
    }

    async fn customer(&self, customer_id: CustomerId) -> Result<Option<Customer>, StoreError> {
        Ok(self.lock().customers.get(&customer_id).cloned())
    }

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        self.lock().accounts.insert(account.account_id, account.clone());
        Ok(())
    }

    async fn account(&self, account_id: AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.lock().accounts.get(&account_id).cloned())
    }

    async fn id_taken(&self, namespace: IdNamespace, id: i64) -> Result<bool, StoreError> {
        let inner = self.lock();
        Ok(match namespace {
            IdNamespace::Customer => inner.customers.contains_key(&id),
            IdNamespace::Account => inner.accounts.contains_key(&id),
        })
    }

    async fn apply_transfer(&self, record: &TransferRecord) -> Result<(), StoreError> {
        let mut inner = self.lock();

        let available = inner
            .accounts
            .get(&record.sender_account_id)
            .ok_or(StoreError::AccountNotFound(record.sender_account_id))?
            .balance;
        if !inner.accounts.contains_key(&record.receiver_account_id) {
            return Err(StoreError::AccountNotFound(record.receiver_account_id));
        }
        if available < record.amount {
            return Err(StoreError::InsufficientBalance {
                required: record.amount,
                available,
            });
        }

        let now = record.transfer_time;
        {
            let sender = inner
                .accounts
                .get_mut(&record.sender_account_id)
                .ok_or(StoreError::AccountNotFound(record.sender_account_id))?;
            sender.balance -= record.amount;
            sender.updated_on = now;
        }
        {
            let receiver = inner
                .accounts
                .get_mut(&record.receiver_account_id)
                .ok_or(StoreError::AccountNotFound(record.receiver_account_id))?;
            receiver.balance += record.amount;
            receiver.updated_on = now;
        }

        inner.transfers.push(record.clone());
        Ok(())
    }

    async fn transfers_for_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<TransferRecord>, StoreError> {
        let inner = self.lock();
        let mut records: Vec<TransferRecord> = inner
            .transfers
            .iter()
            .filter(|t| {
                t.sender_account_id == account_id || t.receiver_account_id == account_id
            })
            .cloned()
            .collect();
        records.sort_by_key(|t| t.transfer_time);
        Ok(records)
    }

    async fn insert_rule(&self, rule: &AutoTransferRule) -> Result<(), StoreError> {
        self.lock().rules.push(rule.clone());
        Ok(())
    }

    async fn rules(&self) -> Result<Vec<AutoTransferRule>, StoreError> {
        let mut rules = self.lock().rules.clone();
        rules.sort_by_key(|r| (r.created_on, r.rule_id));
        Ok(rules)
    }
}
