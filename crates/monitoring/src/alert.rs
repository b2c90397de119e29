//! Alert events pushed to budget observers.
//!
//! Wire framing (one frame per event):
//!
//! ```text
//! event: threshold
//! data: {"percentUsed":90.0,"spent":900.0,"total":1000.0,"message":"..."}
//!
//! ```

use serde::{Deserialize, Serialize};

use budgetwatch_core::Budget;

use crate::burn_rate::{burn_rate, round2};

/// Burn rate (percent) at or above which a budget is in the `threshold` state.
pub const THRESHOLD_PCT: f64 = 90.0;

const OK_MESSAGE: &str = "Spending within limits";
const THRESHOLD_MESSAGE: &str = "Spending reached 90% of budget";
const NOT_FOUND_MESSAGE: &str = "Budget not found";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Ok,
    Threshold,
    Error,
}

impl AlertKind {
    /// Two-state classification on the unrounded burn rate; no hysteresis.
    pub fn classify(percent_used: f64) -> Self {
        if percent_used >= THRESHOLD_PCT {
            AlertKind::Threshold
        } else {
            AlertKind::Ok
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Ok => "ok",
            AlertKind::Threshold => "threshold",
            AlertKind::Error => "error",
        }
    }
}

impl core::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event body. Error events carry only `message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_used: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    pub message: String,
}

/// A single alert. Created per publish, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub kind: AlertKind,
    pub payload: AlertPayload,
}

impl AlertEvent {
    /// Classified snapshot of a budget's current burn rate.
    pub fn for_budget(budget: &Budget) -> Self {
        let raw = burn_rate(budget.spent, budget.total);
        let kind = AlertKind::classify(raw);
        let message = match kind {
            AlertKind::Threshold => THRESHOLD_MESSAGE,
            _ => OK_MESSAGE,
        };

        Self {
            kind,
            payload: AlertPayload {
                percent_used: Some(round2(raw)),
                spent: Some(budget.spent),
                total: Some(budget.total),
                message: message.to_string(),
            },
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::Error,
            payload: AlertPayload {
                percent_used: None,
                spent: None,
                total: None,
                message: message.into(),
            },
        }
    }

    pub fn not_found() -> Self {
        Self::error(NOT_FOUND_MESSAGE)
    }

    /// JSON body of the `data:` line.
    pub fn data_json(&self) -> String {
        serde_json::to_string(&self.payload).unwrap_or_else(|_| "{}".to_string())
    }

    /// Full push-stream frame: `event: <kind>\ndata: <json>\n\n`.
    pub fn to_sse_frame(&self) -> String {
        format!("event: {}\ndata: {}\n\n", self.kind, self.data_json())
    }
}
