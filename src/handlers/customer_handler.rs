//! Customer creation handler

use chrono::Utc;

use crate::domain::Customer;
use crate::error::AppError;
use crate::idgen;
use crate::store::{IdNamespace, LedgerStore};

use super::CreateCustomerCommand;

/// Handler for registering customers
pub struct CreateCustomerHandler<S> {
    store: S,
}

impl<S: LedgerStore> CreateCustomerHandler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn execute(&self, command: CreateCustomerCommand) -> Result<Customer, AppError> {
        let customer_id = idgen::generate_unique_id(
            &self.store,
            IdNamespace::Customer,
            idgen::random_candidate,
        )
        .await?;

        let now = Utc::now();
        let customer = Customer {
            customer_id,
            first_name: command.first_name,
            last_name: command.last_name,
            address: command.address,
            city: command.city,
            state: command.state,
            zipcode: command.zipcode,
            email: command.email,
            created_on: now,
            updated_on: now,
        };

        self.store.insert_customer(&customer).await?;

        tracing::info!(customer_id, email = %customer.email, "Customer created");
        Ok(customer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryLedgerStore;

    fn command(email: &str) -> CreateCustomerCommand {
        CreateCustomerCommand {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            address: "12 Analytical St".to_string(),
            city: "London".to_string(),
            state: "LN".to_string(),
            zipcode: 10001,
            email: email.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_customer_assigns_six_digit_id() {
        let store = MemoryLedgerStore::new();
        let handler = CreateCustomerHandler::new(store.clone());

        let customer = handler.execute(command("ada@example.com")).await.unwrap();
        assert!((100_000..=999_999).contains(&customer.customer_id));
        assert!(store.customer(customer.customer_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryLedgerStore::new();
        let handler = CreateCustomerHandler::new(store);

        handler.execute(command("ada@example.com")).await.unwrap();
        let err = handler.execute(command("ada@example.com")).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Store(crate::store::StoreError::DuplicateEmail(_))
        ));
    }
}
