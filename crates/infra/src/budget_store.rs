use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use budgetwatch_core::{Budget, BudgetId, DomainError, DomainResult};
use budgetwatch_monitoring::BudgetRepository;

/// In-memory budget store for tests/dev.
///
/// Each call is atomic on its own; read-modify-write sequences (spend) must be
/// serialized by the caller.
#[derive(Debug, Default)]
pub struct InMemoryBudgetStore {
    inner: RwLock<HashMap<BudgetId, Budget>>,
}

impl InMemoryBudgetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and store a new budget with nothing spent.
    pub fn create(&self, name: impl Into<String>, total: f64) -> DomainResult<Budget> {
        let budget = Budget::new(BudgetId::new(), name, total, Utc::now())?;
        self.write()?.insert(budget.id, budget.clone());
        tracing::info!(budget_id = %budget.id, total = budget.total, "budget created");
        Ok(budget)
    }

    /// Insert (or replace) a budget as-is.
    pub fn insert(&self, budget: Budget) -> DomainResult<()> {
        self.write()?.insert(budget.id, budget);
        Ok(())
    }

    /// All budgets, oldest first.
    pub fn list(&self) -> DomainResult<Vec<Budget>> {
        let mut all: Vec<Budget> = self.read()?.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(all)
    }

    pub fn len(&self) -> usize {
        self.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> DomainResult<RwLockReadGuard<'_, HashMap<BudgetId, Budget>>> {
        self.inner
            .read()
            .map_err(|_| DomainError::storage("budget store lock poisoned"))
    }

    fn write(&self) -> DomainResult<RwLockWriteGuard<'_, HashMap<BudgetId, Budget>>> {
        self.inner
            .write()
            .map_err(|_| DomainError::storage("budget store lock poisoned"))
    }
}

impl BudgetRepository for InMemoryBudgetStore {
    fn get_budget(&self, id: BudgetId) -> DomainResult<Option<Budget>> {
        Ok(self.read()?.get(&id).cloned())
    }

    fn update_spent(&self, id: BudgetId, spent: f64) -> DomainResult<Budget> {
        let mut map = self.write()?;
        let budget = map.get_mut(&id).ok_or(DomainError::NotFound)?;
        *budget = budget.with_spent(spent, Utc::now());
        Ok(budget.clone())
    }
}
