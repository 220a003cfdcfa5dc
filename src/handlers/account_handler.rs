//! Account creation handler

use chrono::Utc;

use crate::domain::{Account, DomainError};
use crate::error::AppError;
use crate::idgen;
use crate::store::{IdNamespace, LedgerStore};

use super::CreateAccountCommand;

/// Handler for opening accounts
pub struct CreateAccountHandler<S> {
    store: S,
}

impl<S: LedgerStore> CreateAccountHandler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn execute(&self, command: CreateAccountCommand) -> Result<Account, AppError> {
        // Every account must reference an existing customer.
        if self.store.customer(command.customer_id).await?.is_none() {
            return Err(DomainError::CustomerNotFound(command.customer_id).into());
        }

        let account_id = idgen::generate_unique_id(
            &self.store,
            IdNamespace::Account,
            idgen::random_candidate,
        )
        .await?;

        let now = Utc::now();
        let account = Account {
            account_id,
            customer_id: command.customer_id,
            balance: command.opening_balance,
            created_on: now,
            updated_on: now,
        };

        self.store.insert_account(&account).await?;

        tracing::info!(
            account_id,
            customer_id = command.customer_id,
            opening_balance = %command.opening_balance,
            "Account created"
        );
        Ok(account)
    }
}
