//! `budgetwatch-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the `Budget` entity and the shared error model.

pub mod budget;
pub mod error;
pub mod id;

pub use budget::Budget;
pub use error::{DomainError, DomainResult};
pub use id::BudgetId;
