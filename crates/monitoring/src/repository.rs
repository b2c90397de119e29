//! Persistence seam consumed by the monitor.
//!
//! Budgets are owned by an external store; the monitor needs exactly two
//! primitives from it. Implementations live in infra.

use std::sync::Arc;

use budgetwatch_core::{Budget, BudgetId, DomainResult};

/// Calls are made synchronously while a per-budget lock is held, on whatever
/// thread drives the monitor (async worker threads included). Implementations
/// must return promptly and must not block on network or disk I/O; a store that
/// does should be driven from `tokio::task::spawn_blocking` by its caller.
pub trait BudgetRepository: Send + Sync {
    /// `Ok(None)` when the budget does not exist.
    fn get_budget(&self, id: BudgetId) -> DomainResult<Option<Budget>>;

    /// Persist a new cumulative spend and return the updated record.
    ///
    /// Fails with `DomainError::NotFound` for an unknown id.
    fn update_spent(&self, id: BudgetId, spent: f64) -> DomainResult<Budget>;
}

impl<R> BudgetRepository for Arc<R>
where
    R: BudgetRepository + ?Sized,
{
    fn get_budget(&self, id: BudgetId) -> DomainResult<Option<Budget>> {
        (**self).get_budget(id)
    }

    fn update_spent(&self, id: BudgetId, spent: f64) -> DomainResult<Budget> {
        (**self).update_spent(id, spent)
    }
}
