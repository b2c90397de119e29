//! Budget monitor: spend mutation + alert publication.
//!
//! Every spend re-evaluates the burn rate and publishes an alert, whether or not
//! the classification changed (level-triggered; no hysteresis, no rate limit).
//! Spend and subscribe for the same budget are serialized through a per-budget
//! lock; different budgets proceed independently.

use std::sync::Arc;

use serde::Serialize;

use budgetwatch_core::{Budget, BudgetId, DomainError, DomainResult};

use crate::alert::{AlertEvent, AlertKind};
use crate::broker::{AlertBroker, AlertSubscription};
use crate::burn_rate::{burn_rate, round2};
use crate::locks::KeyedLocks;
use crate::repository::BudgetRepository;

/// Result of a spend: the updated budget plus its (rounded) burn rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendOutcome {
    pub id: BudgetId,
    pub name: String,
    pub total: f64,
    pub spent: f64,
    pub percent_used: f64,
    #[serde(skip)]
    pub kind: AlertKind,
}

impl SpendOutcome {
    fn from_budget(budget: &Budget) -> Self {
        let raw = burn_rate(budget.spent, budget.total);
        Self {
            id: budget.id,
            name: budget.name.clone(),
            total: budget.total,
            spent: budget.spent,
            percent_used: round2(raw),
            kind: AlertKind::classify(raw),
        }
    }
}

#[derive(Debug)]
pub struct BudgetMonitor<R> {
    repo: R,
    broker: AlertBroker,
    locks: Arc<KeyedLocks<BudgetId>>,
}

impl<R> BudgetMonitor<R>
where
    R: BudgetRepository,
{
    pub fn new(repo: R, broker: AlertBroker) -> Self {
        Self {
            repo,
            broker,
            locks: Arc::new(KeyedLocks::new()),
        }
    }

    pub fn broker(&self) -> &AlertBroker {
        &self.broker
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Add `amount` to the budget's cumulative spend and publish the new state.
    pub fn apply_spend(&self, id: BudgetId, amount: f64) -> DomainResult<SpendOutcome> {
        if !(amount.is_finite() && amount > 0.0) {
            return Err(DomainError::invalid_input("amount must be a positive number"));
        }

        self.locks.with_lock(id, || {
            let budget = self.repo.get_budget(id)?.ok_or(DomainError::NotFound)?;
            let spent = budget.spent + amount;
            if !(spent.is_finite() && burn_rate(spent, budget.total).is_finite()) {
                return Err(DomainError::invalid_input("cumulative spend is out of range"));
            }
            let updated = self.repo.update_spent(id, spent)?;

            let event = AlertEvent::for_budget(&updated);
            let delivered = self.broker.publish(id, &event);

            let outcome = SpendOutcome::from_budget(&updated);
            tracing::info!(
                budget_id = %id,
                amount,
                spent = outcome.spent,
                percent_used = outcome.percent_used,
                kind = %event.kind,
                delivered,
                "spend applied"
            );
            Ok(outcome)
        })
    }

    /// Classified current state of a budget, without publishing it.
    pub fn current_state(&self, id: BudgetId) -> DomainResult<AlertEvent> {
        let budget = self.repo.get_budget(id)?.ok_or(DomainError::NotFound)?;
        Ok(AlertEvent::for_budget(&budget))
    }

    /// Register an observer and push the budget's current state to it first.
    ///
    /// Unknown budgets (or a failing store) yield a subscription that receives a
    /// single `error` event and is already unregistered, so its stream ends.
    pub fn subscribe(&self, id: BudgetId) -> AlertSubscription {
        self.locks.with_lock(id, || {
            let subscription = self.broker.subscribe(id);

            let initial = match self.repo.get_budget(id) {
                Ok(Some(budget)) => Ok(AlertEvent::for_budget(&budget)),
                Ok(None) => Err(AlertEvent::not_found()),
                Err(e) => Err(AlertEvent::error(e.to_string())),
            };

            match initial {
                Ok(event) => {
                    if let Err(e) = self.broker.send_to(id, subscription.id(), event) {
                        tracing::warn!(budget_id = %id, subscriber = %subscription.id(), "initial alert not delivered: {e}");
                    }
                }
                Err(event) => {
                    tracing::debug!(budget_id = %id, message = %event.payload.message, "rejecting alert subscription");
                    if let Err(e) = self.broker.send_to(id, subscription.id(), event) {
                        tracing::warn!(budget_id = %id, subscriber = %subscription.id(), "error alert not delivered: {e}");
                    }
                    self.broker.unsubscribe(id, subscription.id());
                }
            }

            subscription
        })
    }
}
