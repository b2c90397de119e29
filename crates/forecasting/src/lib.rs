//! `budgetwatch-forecasting`
//!
//! **Responsibility:** Monte Carlo spend projection.
//!
//! This crate is pure computation:
//! - It does not read or mutate budgets; callers pass the baseline in.
//! - It takes its randomness from the caller (any `rand::Rng`), so tests can seed it.
//! - It is CPU-bound; async callers should run it on a blocking pool.

pub mod engine;
pub mod request;

pub use engine::{ForecastEngine, DEFAULT_MAX_RUNS};
pub use request::{ForecastRequest, ForecastResult, DEFAULT_RUNS, DEFAULT_VARIABILITY_PCT};
