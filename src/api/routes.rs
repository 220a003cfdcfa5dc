//! API Routes
//!
//! HTTP endpoint definitions. Monetary fields travel as strings on the wire
//! and are parsed into validated decimals at this boundary.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::{AccountId, AutoTransferRule, CustomerId, DomainError, RuleKind};
use crate::error::AppError;
use crate::handlers::{
    AccountHistory, CreateAccountCommand, CreateAccountHandler, CreateCustomerCommand,
    CreateCustomerHandler, CreateRuleCommand, CreateRuleHandler, RuleEvaluator, RuleOutcome,
    TransferCommand, TransferHandler, TransferHistoryHandler,
};
use crate::store::LedgerStore;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCustomerRequest {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zipcode: i32,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CustomerResponse {
    pub customer_id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_on: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    pub customer_id: CustomerId,
    /// Opening balance as a string for precise decimal handling
    pub opening_balance: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub account_id: AccountId,
    pub customer_id: CustomerId,
    pub balance: Decimal,
    pub created_on: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransferRequest {
    pub sender_account_id: AccountId,
    pub receiver_account_id: AccountId,
    /// Amount as a string for precise decimal handling
    pub amount: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransferResponse {
    pub transfer_id: Uuid,
    pub sender_account_id: AccountId,
    pub receiver_account_id: AccountId,
    pub amount: Decimal,
    pub transfer_time: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub account_id: AccountId,
    pub balance: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRuleRequest {
    pub rule_type: RuleKind,
    pub primary_account_id: AccountId,
    /// Threshold as a string for precise decimal handling
    pub threshold: String,
    pub linked_account_id: AccountId,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RuleResponse {
    pub rule_id: Uuid,
    pub rule_type: RuleKind,
    pub primary_account_id: AccountId,
    pub threshold: Decimal,
    pub linked_account_id: AccountId,
    pub notes: String,
    pub created_on: DateTime<Utc>,
}

impl From<AutoTransferRule> for RuleResponse {
    fn from(rule: AutoTransferRule) -> Self {
        Self {
            rule_id: rule.rule_id,
            rule_type: rule.kind,
            primary_account_id: rule.primary_account_id,
            threshold: rule.threshold,
            linked_account_id: rule.linked_account_id,
            notes: rule.notes,
            created_on: rule.created_on,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RunRulesResponse {
    pub message: String,
    pub results: Vec<RuleOutcome>,
}

#[derive(Debug, Serialize)]
pub struct WelcomeResponse {
    pub message: String,
}

fn parse_decimal(field: &str, value: &str) -> Result<Decimal, AppError> {
    Decimal::from_str(value)
        .map_err(|_| AppError::InvalidRequest(format!("Invalid decimal value for {field}")))
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router over any ledger store implementation.
pub fn create_router<S>() -> Router<S>
where
    S: LedgerStore + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health_check))
        .route("/customers", post(create_customer::<S>))
        .route("/accounts", post(create_account::<S>))
        .route("/transfer", post(transfer::<S>))
        .route("/accounts/:account_id/balance", get(get_balance::<S>))
        .route(
            "/accounts/:account_id/transfers",
            get(get_transfer_history::<S>),
        )
        .route("/auto-transfer-rules", post(create_rule::<S>))
        .route("/auto-transfer-rules/run", post(run_rules::<S>))
}

async fn welcome() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to MW-bank".to_string(),
    })
}

async fn health_check() -> &'static str {
    "OK"
}

// =========================================================================
// POST /customers
// =========================================================================

async fn create_customer<S>(
    State(store): State<S>,
    Json(request): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<CustomerResponse>), AppError>
where
    S: LedgerStore + Clone + Send + Sync + 'static,
{
    let handler = CreateCustomerHandler::new(store);
    let customer = handler
        .execute(CreateCustomerCommand {
            first_name: request.first_name,
            last_name: request.last_name,
            address: request.address,
            city: request.city,
            state: request.state,
            zipcode: request.zipcode,
            email: request.email,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CustomerResponse {
            customer_id: customer.customer_id,
            first_name: customer.first_name,
            last_name: customer.last_name,
            email: customer.email,
            created_on: customer.created_on,
        }),
    ))
}

// =========================================================================
// POST /accounts
// =========================================================================

async fn create_account<S>(
    State(store): State<S>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), AppError>
where
    S: LedgerStore + Clone + Send + Sync + 'static,
{
    let opening_balance = parse_decimal("opening_balance", &request.opening_balance)?;

    let handler = CreateAccountHandler::new(store);
    let account = handler
        .execute(CreateAccountCommand {
            customer_id: request.customer_id,
            opening_balance,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AccountResponse {
            account_id: account.account_id,
            customer_id: account.customer_id,
            balance: account.balance,
            created_on: account.created_on,
        }),
    ))
}

// =========================================================================
// POST /transfer
// =========================================================================

async fn transfer<S>(
    State(store): State<S>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TransferResponse>, AppError>
where
    S: LedgerStore + Clone + Send + Sync + 'static,
{
    let amount = parse_decimal("amount", &request.amount)?;

    let handler = TransferHandler::new(store);
    let outcome = handler
        .execute(TransferCommand {
            sender_account_id: request.sender_account_id,
            receiver_account_id: request.receiver_account_id,
            amount,
        })
        .await?;

    Ok(Json(TransferResponse {
        transfer_id: outcome.record.transfer_id,
        sender_account_id: outcome.record.sender_account_id,
        receiver_account_id: outcome.record.receiver_account_id,
        amount: outcome.record.amount,
        transfer_time: outcome.record.transfer_time,
        message: outcome.message,
    }))
}

// =========================================================================
// GET /accounts/:account_id/balance
// =========================================================================

async fn get_balance<S>(
    State(store): State<S>,
    Path(account_id): Path<AccountId>,
) -> Result<Json<BalanceResponse>, AppError>
where
    S: LedgerStore + Clone + Send + Sync + 'static,
{
    let account = store
        .account(account_id)
        .await?
        .ok_or(DomainError::AccountNotFound(account_id))?;

    Ok(Json(BalanceResponse {
        account_id,
        balance: account.balance,
    }))
}

// =========================================================================
// GET /accounts/:account_id/transfers
// =========================================================================

async fn get_transfer_history<S>(
    State(store): State<S>,
    Path(account_id): Path<AccountId>,
) -> Result<Json<AccountHistory>, AppError>
where
    S: LedgerStore + Clone + Send + Sync + 'static,
{
    let handler = TransferHistoryHandler::new(store);
    let history = handler.execute(account_id).await?;
    Ok(Json(history))
}

// =========================================================================
// POST /auto-transfer-rules
// =========================================================================

async fn create_rule<S>(
    State(store): State<S>,
    Json(request): Json<CreateRuleRequest>,
) -> Result<(StatusCode, Json<RuleResponse>), AppError>
where
    S: LedgerStore + Clone + Send + Sync + 'static,
{
    let threshold = parse_decimal("threshold", &request.threshold)?;

    let handler = CreateRuleHandler::new(store);
    let rule = handler
        .execute(CreateRuleCommand {
            kind: request.rule_type,
            primary_account_id: request.primary_account_id,
            threshold,
            linked_account_id: request.linked_account_id,
            notes: request.notes.unwrap_or_default(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(RuleResponse::from(rule))))
}

// =========================================================================
// POST /auto-transfer-rules/run
// =========================================================================

async fn run_rules<S>(State(store): State<S>) -> Result<Json<RunRulesResponse>, AppError>
where
    S: LedgerStore + Clone + Send + Sync + 'static,
{
    let evaluator = RuleEvaluator::new(store);
    let results = evaluator.run_all().await?;

    let message = if results.is_empty() {
        "No auto transfer rules found".to_string()
    } else {
        "Auto transfer execution completed".to_string()
    };

    Ok(Json(RunRulesResponse { message, results }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_request_deserialize() {
        let json = r#"{
            "sender_account_id": 100001,
            "receiver_account_id": 100002,
            "amount": "100.50"
        }"#;

        let request: TransferRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.sender_account_id, 100001);
        assert_eq!(request.amount, "100.50");
    }

    #[test]
    fn test_create_rule_request_deserialize() {
        let json = r#"{
            "rule_type": "TARGET_BALANCE",
            "primary_account_id": 100001,
            "threshold": "500",
            "linked_account_id": 100002
        }"#;

        let request: CreateRuleRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.rule_type, RuleKind::TargetBalance);
        assert!(request.notes.is_none());
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        assert!(parse_decimal("amount", "12.5").is_ok());
        let err = parse_decimal("amount", "abc").unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }
}
