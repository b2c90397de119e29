//! Infrastructure layer: concrete stores behind the domain seams.

pub mod budget_store;

pub use budget_store::InMemoryBudgetStore;
