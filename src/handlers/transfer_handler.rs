//! Transfer executor
//!
//! Validates and executes a single transfer between two accounts. The store
//! re-checks existence and balance under its row locks, so the pre-checks
//! here only decide which error the caller sees and in what order.

use crate::domain::{Amount, DomainError, TransferRecord};
use crate::error::AppError;
use crate::store::{LedgerStore, StoreError};

use super::{TransferCommand, TransferOutcome};

/// Handler for money transfers between accounts
pub struct TransferHandler<S> {
    store: S,
}

impl<S: LedgerStore> TransferHandler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Execute the transfer command.
    ///
    /// Precondition order: amount validity, distinct accounts, account
    /// existence, then sender balance. On success exactly one history row is
    /// persisted and both balances move atomically.
    pub async fn execute(&self, command: TransferCommand) -> Result<TransferOutcome, AppError> {
        let amount = Amount::new(command.amount)
            .map_err(|e| DomainError::InvalidAmount(e.to_string()))?;

        if command.sender_account_id == command.receiver_account_id {
            return Err(DomainError::SameAccountTransfer.into());
        }

        if self.store.account(command.sender_account_id).await?.is_none() {
            return Err(DomainError::InvalidAccount(command.sender_account_id).into());
        }
        if self
            .store
            .account(command.receiver_account_id)
            .await?
            .is_none()
        {
            return Err(DomainError::InvalidAccount(command.receiver_account_id).into());
        }

        let record = TransferRecord::new(
            command.sender_account_id,
            command.receiver_account_id,
            amount.value(),
        );

        self.store
            .apply_transfer(&record)
            .await
            .map_err(|e| match e {
                // An account can disappear between the pre-check and the
                // locked read; keep the executor's error vocabulary either way.
                StoreError::AccountNotFound(id) => {
                    AppError::from(DomainError::InvalidAccount(id))
                }
                StoreError::InsufficientBalance {
                    required,
                    available,
                } => AppError::from(DomainError::insufficient_balance(required, available)),
                other => AppError::from(other),
            })?;

        tracing::info!(
            transfer_id = %record.transfer_id,
            sender = record.sender_account_id,
            receiver = record.receiver_account_id,
            amount = %record.amount,
            "Transfer executed"
        );

        Ok(TransferOutcome {
            record,
            message: "Transfer successful".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Account;
    use crate::store::MemoryLedgerStore;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    async fn seed_account(store: &MemoryLedgerStore, account_id: i64, balance: Decimal) {
        let now = Utc::now();
        store
            .insert_account(&Account {
                account_id,
                customer_id: 500000,
                balance,
                created_on: now,
                updated_on: now,
            })
            .await
            .unwrap();
    }

    fn command(sender: i64, receiver: i64, amount: Decimal) -> TransferCommand {
        TransferCommand {
            sender_account_id: sender,
            receiver_account_id: receiver,
            amount,
        }
    }

    #[tokio::test]
    async fn test_successful_transfer_moves_exact_amount() {
        let store = MemoryLedgerStore::new();
        seed_account(&store, 100001, dec!(500)).await;
        seed_account(&store, 100002, dec!(100)).await;
        let handler = TransferHandler::new(store.clone());

        let outcome = handler
            .execute(command(100001, 100002, dec!(150)))
            .await
            .unwrap();

        assert_eq!(outcome.message, "Transfer successful");
        assert_eq!(outcome.record.amount, dec!(150));
        assert_eq!(store.account(100001).await.unwrap().unwrap().balance, dec!(350));
        assert_eq!(store.account(100002).await.unwrap().unwrap().balance, dec!(250));

        let history = store.transfers_for_account(100001).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].amount, dec!(150));
    }

    #[tokio::test]
    async fn test_insufficient_balance_leaves_state_untouched() {
        let store = MemoryLedgerStore::new();
        seed_account(&store, 100001, dec!(100)).await;
        seed_account(&store, 100002, dec!(0)).await;
        let handler = TransferHandler::new(store.clone());

        let err = handler
            .execute(command(100001, 100002, dec!(150)))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Domain(DomainError::InsufficientBalance { .. })
        ));
        assert_eq!(store.account(100001).await.unwrap().unwrap().balance, dec!(100));
        assert_eq!(store.account(100002).await.unwrap().unwrap().balance, dec!(0));
        assert!(store.transfers_for_account(100001).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_sender_rejected_before_balance_check() {
        let store = MemoryLedgerStore::new();
        seed_account(&store, 100002, dec!(0)).await;
        let handler = TransferHandler::new(store);

        let err = handler
            .execute(command(999999, 100002, dec!(10)))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Domain(DomainError::InvalidAccount(999999))
        ));
    }

    #[tokio::test]
    async fn test_unknown_receiver_rejected() {
        let store = MemoryLedgerStore::new();
        seed_account(&store, 100001, dec!(500)).await;
        let handler = TransferHandler::new(store.clone());

        let err = handler
            .execute(command(100001, 999999, dec!(10)))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Domain(DomainError::InvalidAccount(999999))
        ));
        assert_eq!(store.account(100001).await.unwrap().unwrap().balance, dec!(500));
    }

    #[tokio::test]
    async fn test_non_positive_amount_rejected() {
        let store = MemoryLedgerStore::new();
        seed_account(&store, 100001, dec!(500)).await;
        seed_account(&store, 100002, dec!(0)).await;
        let handler = TransferHandler::new(store);

        for amount in [dec!(0), dec!(-25)] {
            let err = handler
                .execute(command(100001, 100002, amount))
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                AppError::Domain(DomainError::InvalidAmount(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_self_transfer_rejected() {
        let store = MemoryLedgerStore::new();
        seed_account(&store, 100001, dec!(500)).await;
        let handler = TransferHandler::new(store);

        let err = handler
            .execute(command(100001, 100001, dec!(10)))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Domain(DomainError::SameAccountTransfer)
        ));
    }

    #[tokio::test]
    async fn test_exact_balance_transfer_succeeds() {
        let store = MemoryLedgerStore::new();
        seed_account(&store, 100001, dec!(100)).await;
        seed_account(&store, 100002, dec!(0)).await;
        let handler = TransferHandler::new(store.clone());

        handler
            .execute(command(100001, 100002, dec!(100)))
            .await
            .unwrap();

        assert_eq!(store.account(100001).await.unwrap().unwrap().balance, dec!(0));
        assert_eq!(store.account(100002).await.unwrap().unwrap().balance, dec!(100));
    }
}
