//! `budgetwatch-monitoring`
//!
//! Live burn-rate monitoring:
//!
//! ```text
//! spend update → burn_rate → classify → BudgetMonitor → AlertBroker::publish → subscribers
//! ```
//!
//! - `burn_rate`: pure percentage-used calculation.
//! - `alert`: alert kinds, payloads and push-stream framing.
//! - `broker`: per-budget subscriber registry with bounded, lossy fan-out.
//! - `repository`: the narrow persistence seam the monitor consumes.
//! - `monitor`: per-budget serialized spend mutation + publish.

pub mod alert;
pub mod broker;
pub mod burn_rate;
pub mod locks;
pub mod monitor;
pub mod repository;

pub use alert::{AlertEvent, AlertKind, AlertPayload, THRESHOLD_PCT};
pub use broker::{AlertBroker, AlertSubscription, DeliveryError, SubscriberId, DEFAULT_CHANNEL_CAPACITY};
pub use burn_rate::{burn_rate, round2};
pub use monitor::{BudgetMonitor, SpendOutcome};
pub use repository::BudgetRepository;
