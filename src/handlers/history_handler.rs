//! Transfer history query
//!
//! Merges an account's sent and received transfers into one sequence sorted
//! ascending by timestamp (stable, so ties keep merge order) and returns it
//! with the current balance.

use crate::domain::{AccountId, DomainError};
use crate::error::AppError;
use crate::store::LedgerStore;

use super::{AccountHistory, HistoryEntry};

/// Handler for the per-account transfer history query
pub struct TransferHistoryHandler<S> {
    store: S,
}

impl<S: LedgerStore> TransferHistoryHandler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn execute(&self, account_id: AccountId) -> Result<AccountHistory, AppError> {
        let account = self
            .store
            .account(account_id)
            .await?
            .ok_or(DomainError::AccountNotFound(account_id))?;

        let records = self.store.transfers_for_account(account_id).await?;

        let mut transfers: Vec<HistoryEntry> = Vec::with_capacity(records.len());
        for record in records.iter().filter(|r| r.sender_account_id == account_id) {
            transfers.push(HistoryEntry::Sent {
                transfer_id: record.transfer_id,
                to: record.receiver_account_id,
                amount: record.amount,
                date: record.transfer_time,
            });
        }
        for record in records
            .iter()
            .filter(|r| r.receiver_account_id == account_id)
        {
            transfers.push(HistoryEntry::Received {
                transfer_id: record.transfer_id,
                from: record.sender_account_id,
                amount: record.amount,
                date: record.transfer_time,
            });
        }
        transfers.sort_by_key(|entry| entry.date());

        Ok(AccountHistory {
            account_id,
            current_balance: account.balance,
            transfers,
        })
    }
}
