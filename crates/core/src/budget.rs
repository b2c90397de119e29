//! The `Budget` entity.
//!
//! Budgets are owned by the persistence collaborator. The monitoring core only
//! reads them and moves `spent` forward through spend operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::BudgetId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: BudgetId,
    pub name: String,
    /// Total allocation. Always strictly positive.
    pub total: f64,
    /// Cumulative spend. Never negative.
    pub spent: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    /// Create a fresh budget with nothing spent yet.
    pub fn new(id: BudgetId, name: impl Into<String>, total: f64, now: DateTime<Utc>) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::invalid_input("name is required"));
        }
        if !(total.is_finite() && total > 0.0) {
            return Err(DomainError::invalid_input("total must be a positive number"));
        }

        Ok(Self {
            id,
            name,
            total,
            spent: 0.0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Copy of this budget with `spent` replaced.
    pub fn with_spent(&self, spent: f64, now: DateTime<Utc>) -> Self {
        Self {
            spent,
            updated_at: now,
            ..self.clone()
        }
    }
}
