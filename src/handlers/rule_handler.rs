//! Auto-transfer rules
//!
//! Rule creation and the on-demand evaluator. The evaluator has no internal
//! scheduler; the triggering cadence (cron, operator call) is the caller's
//! concern. Rules are evaluated independently, in creation order, with
//! best-effort partial-success semantics: one bad rule never aborts the run.

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{AccountId, AutoTransferRule, DomainError, RuleKind};
use crate::error::AppError;
use crate::store::LedgerStore;

use super::{
    CreateRuleCommand, RuleDisposition, RuleOutcome, TransferCommand, TransferHandler,
};

/// Handler for creating standing auto-transfer rules
pub struct CreateRuleHandler<S> {
    store: S,
}

impl<S: LedgerStore> CreateRuleHandler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn execute(&self, command: CreateRuleCommand) -> Result<AutoTransferRule, AppError> {
        command.kind.validate_threshold(command.threshold)?;

        if self
            .store
            .account(command.primary_account_id)
            .await?
            .is_none()
        {
            return Err(DomainError::AccountNotFound(command.primary_account_id).into());
        }
        if self
            .store
            .account(command.linked_account_id)
            .await?
            .is_none()
        {
            return Err(DomainError::AccountNotFound(command.linked_account_id).into());
        }

        let now = Utc::now();
        let rule = AutoTransferRule {
            rule_id: Uuid::new_v4(),
            kind: command.kind,
            primary_account_id: command.primary_account_id,
            threshold: command.threshold,
            linked_account_id: command.linked_account_id,
            notes: command.notes,
            created_on: now,
            updated_on: now,
        };

        self.store.insert_rule(&rule).await?;

        tracing::info!(
            rule_id = %rule.rule_id,
            kind = %rule.kind,
            primary = rule.primary_account_id,
            linked = rule.linked_account_id,
            "Auto-transfer rule created"
        );
        Ok(rule)
    }
}

/// Evaluates all standing rules against current balances.
pub struct RuleEvaluator<S> {
    store: S,
    transfers: TransferHandler<S>,
}

impl<S: LedgerStore + Clone> RuleEvaluator<S> {
    pub fn new(store: S) -> Self {
        Self {
            transfers: TransferHandler::new(store.clone()),
            store,
        }
    }

    /// Run every rule once, in creation order, and report per-rule outcomes.
    ///
    /// Evaluation never modifies a rule; a rule that is skipped or fails this
    /// run is simply re-evaluated from scratch on the next invocation.
    pub async fn run_all(&self) -> Result<Vec<RuleOutcome>, AppError> {
        let rules = self.store.rules().await?;
        let mut outcomes = Vec::with_capacity(rules.len());
        for rule in &rules {
            tracing::info!(rule_id = %rule.rule_id, kind = %rule.kind, "Processing rule");
            outcomes.push(self.evaluate(rule).await);
        }
        Ok(outcomes)
    }

    async fn evaluate(&self, rule: &AutoTransferRule) -> RuleOutcome {
        let accounts = tokio::try_join!(
            self.store.account(rule.primary_account_id),
            self.store.account(rule.linked_account_id),
        );
        let (primary, linked) = match accounts {
            Ok(pair) => pair,
            Err(e) => return Self::failed(rule, e.to_string()),
        };
        let (Some(primary), Some(linked)) = (primary, linked) else {
            tracing::warn!(rule_id = %rule.rule_id, "Skipping rule: invalid account(s)");
            return RuleOutcome {
                rule_id: rule.rule_id,
                disposition: RuleDisposition::Skipped,
                message: "Invalid account(s)".to_string(),
                transfer_id: None,
            };
        };

        match rule.kind {
            RuleKind::ZeroBalance => {
                // Sweep the entire primary balance to the linked account.
                if primary.balance > rule.threshold {
                    self.fire(rule, primary.account_id, linked.account_id, primary.balance)
                        .await
                } else {
                    Self::no_op(rule, "No funds to transfer")
                }
            }
            RuleKind::TargetBalance => {
                // Top the primary account up to the threshold from the
                // linked account, if the linked account can cover it.
                let deficit = rule.threshold - primary.balance;
                if deficit > Decimal::ZERO && linked.balance >= deficit {
                    self.fire(rule, linked.account_id, primary.account_id, deficit)
                        .await
                } else {
                    Self::no_op(rule, "Insufficient linked account balance or no deficit")
                }
            }
        }
    }

    async fn fire(
        &self,
        rule: &AutoTransferRule,
        sender: AccountId,
        receiver: AccountId,
        amount: Decimal,
    ) -> RuleOutcome {
        let command = TransferCommand {
            sender_account_id: sender,
            receiver_account_id: receiver,
            amount,
        };
        match self.transfers.execute(command).await {
            Ok(outcome) => {
                tracing::info!(
                    rule_id = %rule.rule_id,
                    transfer_id = %outcome.record.transfer_id,
                    amount = %amount,
                    "Rule applied"
                );
                RuleOutcome {
                    rule_id: rule.rule_id,
                    disposition: RuleDisposition::Applied,
                    message: outcome.message,
                    transfer_id: Some(outcome.record.transfer_id),
                }
            }
            Err(e) => Self::failed(rule, e.to_string()),
        }
    }

    fn no_op(rule: &AutoTransferRule, message: &str) -> RuleOutcome {
        tracing::info!(rule_id = %rule.rule_id, message, "Rule not applicable");
        RuleOutcome {
            rule_id: rule.rule_id,
            disposition: RuleDisposition::NoOp,
            message: message.to_string(),
            transfer_id: None,
        }
    }

    fn failed(rule: &AutoTransferRule, message: String) -> RuleOutcome {
        tracing::warn!(rule_id = %rule.rule_id, %message, "Rule evaluation failed");
        RuleOutcome {
            rule_id: rule.rule_id,
            disposition: RuleDisposition::Failed,
            message,
            transfer_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Account;
    use crate::store::MemoryLedgerStore;
    use chrono::{DateTime, Duration};
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

    async fn seed_rule(
        store: &MemoryLedgerStore,
        kind: RuleKind,
        primary: i64,
        threshold: Decimal,
        linked: i64,
        created_on: DateTime<Utc>,
    ) -> Uuid {
        let rule = AutoTransferRule {
            rule_id: Uuid::new_v4(),
            kind,
            primary_account_id: primary,
            threshold,
            linked_account_id: linked,
            notes: "test rule".to_string(),
            created_on,
            updated_on: created_on,
        };
        store.insert_rule(&rule).await.unwrap();
        rule.rule_id
    }

    #[tokio::test]
    async fn test_create_rule_validates_threshold() {
        let store = MemoryLedgerStore::new();
        seed_account(&store, 100001, dec!(0)).await;
        seed_account(&store, 100002, dec!(0)).await;
        let handler = CreateRuleHandler::new(store);

        let err = handler
            .execute(CreateRuleCommand {
                kind: RuleKind::ZeroBalance,
                primary_account_id: 100001,
                threshold: dec!(5),
                linked_account_id: 100002,
                notes: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Domain(DomainError::InvalidRuleThreshold(_))
        ));

        let err = handler
            .execute(CreateRuleCommand {
                kind: RuleKind::TargetBalance,
                primary_account_id: 100001,
                threshold: dec!(0),
                linked_account_id: 100002,
                notes: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Domain(DomainError::InvalidRuleThreshold(_))
        ));
    }

    #[tokio::test]
    async fn test_create_rule_requires_both_accounts() {
        let store = MemoryLedgerStore::new();
        seed_account(&store, 100001, dec!(0)).await;
        let handler = CreateRuleHandler::new(store);

        let err = handler
            .execute(CreateRuleCommand {
                kind: RuleKind::TargetBalance,
                primary_account_id: 100001,
                threshold: dec!(500),
                linked_account_id: 999999,
                notes: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Domain(DomainError::AccountNotFound(999999))
        ));
    }

    #[tokio::test]
    async fn test_zero_balance_rule_sweeps_entire_balance() {
        let store = MemoryLedgerStore::new();
        seed_account(&store, 100001, dec!(500)).await;
        seed_account(&store, 100002, dec!(100)).await;
        let rule_id = seed_rule(
            &store,
            RuleKind::ZeroBalance,
            100001,
            dec!(0),
            100002,
            Utc::now(),
        )
        .await;

        let outcomes = RuleEvaluator::new(store.clone()).run_all().await.unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].rule_id, rule_id);
        assert_eq!(outcomes[0].disposition, RuleDisposition::Applied);
        assert!(outcomes[0].transfer_id.is_some());

        assert_eq!(store.account(100001).await.unwrap().unwrap().balance, dec!(0));
        assert_eq!(store.account(100002).await.unwrap().unwrap().balance, dec!(600));
        let history = store.transfers_for_account(100001).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].amount, dec!(500));
    }

    #[tokio::test]
    async fn test_zero_balance_rule_no_funds() {
        let store = MemoryLedgerStore::new();
        seed_account(&store, 100001, dec!(0)).await;
        seed_account(&store, 100002, dec!(100)).await;
        seed_rule(
            &store,
            RuleKind::ZeroBalance,
            100001,
            dec!(0),
            100002,
            Utc::now(),
        )
        .await;

        let outcomes = RuleEvaluator::new(store.clone()).run_all().await.unwrap();

        assert_eq!(outcomes[0].disposition, RuleDisposition::NoOp);
        assert_eq!(outcomes[0].message, "No funds to transfer");
        assert_eq!(store.account(100002).await.unwrap().unwrap().balance, dec!(100));
    }

    #[tokio::test]
    async fn test_target_balance_rule_tops_up_deficit() {
        let store = MemoryLedgerStore::new();
        seed_account(&store, 100001, dec!(200)).await;
        seed_account(&store, 100002, dec!(1000)).await;
        seed_rule(
            &store,
            RuleKind::TargetBalance,
            100001,
            dec!(500),
            100002,
            Utc::now(),
        )
        .await;

        let outcomes = RuleEvaluator::new(store.clone()).run_all().await.unwrap();

        assert_eq!(outcomes[0].disposition, RuleDisposition::Applied);
        assert_eq!(store.account(100001).await.unwrap().unwrap().balance, dec!(500));
        assert_eq!(store.account(100002).await.unwrap().unwrap().balance, dec!(700));
    }

    #[tokio::test]
    async fn test_target_balance_rule_linked_cannot_cover_deficit() {
        let store = MemoryLedgerStore::new();
        seed_account(&store, 100001, dec!(200)).await;
        seed_account(&store, 100002, dec!(100)).await;
        seed_rule(
            &store,
            RuleKind::TargetBalance,
            100001,
            dec!(500),
            100002,
            Utc::now(),
        )
        .await;

        let outcomes = RuleEvaluator::new(store.clone()).run_all().await.unwrap();

        assert_eq!(outcomes[0].disposition, RuleDisposition::NoOp);
        assert_eq!(
            outcomes[0].message,
            "Insufficient linked account balance or no deficit"
        );
        assert_eq!(store.account(100001).await.unwrap().unwrap().balance, dec!(200));
        assert_eq!(store.account(100002).await.unwrap().unwrap().balance, dec!(100));
    }

    #[tokio::test]
    async fn test_target_balance_rule_no_deficit() {
        let store = MemoryLedgerStore::new();
        seed_account(&store, 100001, dec!(600)).await;
        seed_account(&store, 100002, dec!(1000)).await;
        seed_rule(
            &store,
            RuleKind::TargetBalance,
            100001,
            dec!(500),
            100002,
            Utc::now(),
        )
        .await;

        let outcomes = RuleEvaluator::new(store.clone()).run_all().await.unwrap();

        assert_eq!(outcomes[0].disposition, RuleDisposition::NoOp);
        assert_eq!(store.account(100001).await.unwrap().unwrap().balance, dec!(600));
    }

    #[tokio::test]
    async fn test_rule_with_missing_account_is_skipped() {
        let store = MemoryLedgerStore::new();
        seed_account(&store, 100001, dec!(500)).await;
        seed_rule(
            &store,
            RuleKind::ZeroBalance,
            100001,
            dec!(0),
            999999,
            Utc::now(),
        )
        .await;

        let outcomes = RuleEvaluator::new(store.clone()).run_all().await.unwrap();

        assert_eq!(outcomes[0].disposition, RuleDisposition::Skipped);
        assert_eq!(outcomes[0].message, "Invalid account(s)");
        assert_eq!(store.account(100001).await.unwrap().unwrap().balance, dec!(500));
    }

    #[tokio::test]
    async fn test_one_bad_rule_does_not_abort_the_run() {
        let store = MemoryLedgerStore::new();
        seed_account(&store, 100001, dec!(500)).await;
        seed_account(&store, 100002, dec!(100)).await;

        let base = Utc::now();
        // First rule is a self-transfer sweep, which the executor rejects.
        let bad = seed_rule(&store, RuleKind::ZeroBalance, 100001, dec!(0), 100001, base).await;
        let good = seed_rule(
            &store,
            RuleKind::ZeroBalance,
            100001,
            dec!(0),
            100002,
            base + Duration::seconds(1),
        )
        .await;

        let outcomes = RuleEvaluator::new(store.clone()).run_all().await.unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].rule_id, bad);
        assert_eq!(outcomes[0].disposition, RuleDisposition::Failed);
        assert_eq!(outcomes[1].rule_id, good);
        assert_eq!(outcomes[1].disposition, RuleDisposition::Applied);
        assert_eq!(store.account(100002).await.unwrap().unwrap().balance, dec!(600));
    }

    #[tokio::test]
    async fn test_rules_evaluated_in_creation_order() {
        let store = MemoryLedgerStore::new();
        seed_account(&store, 100001, dec!(0)).await;
        seed_account(&store, 100002, dec!(0)).await;

        let base = Utc::now();
        // Insert newest first; the evaluator must still run oldest first.
        let second = seed_rule(
            &store,
            RuleKind::ZeroBalance,
            100001,
            dec!(0),
            100002,
            base + Duration::seconds(5),
        )
        .await;
        let first = seed_rule(&store, RuleKind::ZeroBalance, 100001, dec!(0), 100002, base).await;

        let outcomes = RuleEvaluator::new(store).run_all().await.unwrap();
        assert_eq!(outcomes[0].rule_id, first);
        assert_eq!(outcomes[1].rule_id, second);
    }
}
