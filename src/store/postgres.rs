//! Postgres-backed ledger store
//!
//! Transfers run in a single transaction with `SELECT ... FOR UPDATE` row
//! locks on both accounts, taken in ascending account-id order so two
//! concurrent transfers over the same pair cannot deadlock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::{
    Account, AccountId, AutoTransferRule, Customer, CustomerId, RuleKind, TransferRecord,
};

use super::{IdNamespace, LedgerStore, StoreError};

/// Ledger store backed by a Postgres connection pool.
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

type CustomerRow = (
    i64,
    String,
    String,
    String,
    String,
    String,
    i32,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
);

type RuleRow = (
    Uuid,
    String,
    i64,
    Decimal,
    i64,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn customer_from_row(row: CustomerRow) -> Customer {
    let (customer_id, first_name, last_name, address, city, state, zipcode, email, created_on, updated_on) =
        row;
    Customer {
        customer_id,
        first_name,
        last_name,
        address,
        city,
        state,
        zipcode,
        email,
        created_on,
        updated_on,
    }
}

fn rule_from_row(row: RuleRow) -> Result<AutoTransferRule, StoreError> {
    let (rule_id, kind, primary_account_id, threshold, linked_account_id, notes, created_on, updated_on) =
        row;
    // A rule row with an unknown kind means the table was written outside
    // this service; surface it as a decode error rather than skipping it.
    let kind = RuleKind::from_str(&kind).map_err(|e| {
        StoreError::Database(sqlx::Error::Decode(e.to_string().into()))
    })?;
    Ok(AutoTransferRule {
        rule_id,
        kind,
        primary_account_id,
        threshold,
        linked_account_id,
        notes,
        created_on,
        updated_on,
    })
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn insert_customer(&self, customer: &Customer) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO customers
                (customer_id, first_name, last_name, address, city, state, zipcode, email,
                 created_on, updated_on)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(customer.customer_id)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.address)
        .bind(&customer.city)
        .bind(&customer.state)
        .bind(customer.zipcode)
        .bind(&customer.email)
        .bind(customer.created_on)
        .bind(customer.updated_on)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::DuplicateEmail(customer.email.clone())
            }
            _ => StoreError::Database(e),
        })?;

        Ok(())
    }

    async fn customer(&self, customer_id: CustomerId) -> Result<Option<Customer>, StoreError> {
        let row: Option<CustomerRow> = sqlx::query_as(
            r#"
            SELECT customer_id, first_name, last_name, address, city, state, zipcode, email,
                   created_on, updated_on
            FROM customers
            WHERE customer_id = $1
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(customer_from_row))
    }

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (account_id, customer_id, balance, created_on, updated_on)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(account.account_id)
        .bind(account.customer_id)
        .bind(account.balance)
        .bind(account.created_on)
        .bind(account.updated_on)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn account(&self, account_id: AccountId) -> Result<Option<Account>, StoreError> {
        let row: Option<(i64, i64, Decimal, DateTime<Utc>, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT account_id, customer_id, balance, created_on, updated_on
            FROM accounts
            WHERE account_id = $1
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(
            |(account_id, customer_id, balance, created_on, updated_on)| Account {
                account_id,
                customer_id,
                balance,
                created_on,
                updated_on,
            },
        ))
    }

    async fn id_taken(&self, namespace: IdNamespace, id: i64) -> Result<bool, StoreError> {
        let query = match namespace {
            IdNamespace::Customer => {
                "SELECT EXISTS (SELECT 1 FROM customers WHERE customer_id = $1)"
            }
            IdNamespace::Account => {
                "SELECT EXISTS (SELECT 1 FROM accounts WHERE account_id = $1)"
            }
        };

        let taken: bool = sqlx::query_scalar(query)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(taken)
    }

    async fn apply_transfer(&self, record: &TransferRecord) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        // Lock both rows in ascending id order to avoid lock-order deadlocks.
        let first = record.sender_account_id.min(record.receiver_account_id);
        let second = record.sender_account_id.max(record.receiver_account_id);

        let mut sender_balance = None;
        for account_id in [first, second] {
            let balance: Option<Decimal> = sqlx::query_scalar(
                "SELECT balance FROM accounts WHERE account_id = $1 FOR UPDATE",
            )
            .bind(account_id)
            .fetch_optional(&mut *tx)
            .await?;

            let balance = balance.ok_or(StoreError::AccountNotFound(account_id))?;
            if account_id == record.sender_account_id {
                sender_balance = Some(balance);
            }
        }

        let available = sender_balance.ok_or(StoreError::AccountNotFound(record.sender_account_id))?;
        if available < record.amount {
            return Err(StoreError::InsufficientBalance {
                required: record.amount,
                available,
            });
        }

        sqlx::query(
            "UPDATE accounts SET balance = balance - $1, updated_on = NOW() WHERE account_id = $2",
        )
        .bind(record.amount)
        .bind(record.sender_account_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE accounts SET balance = balance + $1, updated_on = NOW() WHERE account_id = $2",
        )
        .bind(record.amount)
        .bind(record.receiver_account_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO transfer_history
                (transfer_id, sender_account_id, receiver_account_id, amount, transfer_time)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.transfer_id)
        .bind(record.sender_account_id)
        .bind(record.receiver_account_id)
        .bind(record.amount)
        .bind(record.transfer_time)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn transfers_for_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<TransferRecord>, StoreError> {
        let rows: Vec<(Uuid, i64, i64, Decimal, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT transfer_id, sender_account_id, receiver_account_id, amount, transfer_time
            FROM transfer_history
            WHERE sender_account_id = $1 OR receiver_account_id = $1
            ORDER BY transfer_time, transfer_id
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(transfer_id, sender_account_id, receiver_account_id, amount, transfer_time)| {
                    TransferRecord {
                        transfer_id,
                        sender_account_id,
                        receiver_account_id,
                        amount,
                        transfer_time,
                    }
                },
            )
            .collect())
    }

    async fn insert_rule(&self, rule: &AutoTransferRule) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO auto_transfer_rules
                (rule_id, rule_type, primary_account_id, threshold, linked_account_id, notes,
                 created_on, updated_on)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(rule.rule_id)
        .bind(rule.kind.as_str())
        .bind(rule.primary_account_id)
        .bind(rule.threshold)
        .bind(rule.linked_account_id)
        .bind(&rule.notes)
        .bind(rule.created_on)
        .bind(rule.updated_on)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn rules(&self) -> Result<Vec<AutoTransferRule>, StoreError> {
        let rows: Vec<RuleRow> = sqlx::query_as(
            r#"
            SELECT rule_id, rule_type, primary_account_id, threshold, linked_account_id, notes,
                   created_on, updated_on
            FROM auto_transfer_rules
            ORDER BY created_on, rule_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(rule_from_row).collect()
    }
}
