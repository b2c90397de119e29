use serde::{Deserialize, Serialize};

/// Default spread of the simulated distribution, as a percentage of `base`.
pub const DEFAULT_VARIABILITY_PCT: f64 = 20.0;

/// Default number of Monte Carlo samples.
pub const DEFAULT_RUNS: usize = 10_000;

/// Input of a single forecast.
///
/// Ephemeral: one per forecast call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRequest {
    /// Baseline value (mean of the simulated distribution). Must be > 0.
    pub base: f64,
    pub variability_pct: f64,
    pub runs: usize,
    /// Lower clamp applied to every sample.
    pub floor: Option<f64>,
    /// Upper clamp applied to every sample (after `floor`, so `cap` wins if they cross).
    pub cap: Option<f64>,
}

impl ForecastRequest {
    pub fn new(base: f64) -> Self {
        Self {
            base,
            variability_pct: DEFAULT_VARIABILITY_PCT,
            runs: DEFAULT_RUNS,
            floor: None,
            cap: None,
        }
    }

    /// The fixed profile used to forecast a stored budget from its current total.
    pub fn for_budget_total(total: f64) -> Self {
        Self {
            base: total,
            variability_pct: 20.0,
            runs: 1_000,
            floor: Some(0.0),
            cap: Some((total * 1.5).min(f64::MAX)),
        }
    }

    pub fn with_variability_pct(mut self, variability_pct: f64) -> Self {
        self.variability_pct = variability_pct;
        self
    }

    pub fn with_runs(mut self, runs: usize) -> Self {
        self.runs = runs;
        self
    }

    pub fn with_floor(mut self, floor: f64) -> Self {
        self.floor = Some(floor);
        self
    }

    pub fn with_cap(mut self, cap: f64) -> Self {
        self.cap = Some(cap);
        self
    }
}

/// Three-point forecast band read off the sorted samples.
///
/// `min`, `likely` and `max` are the 10th, 50th and 90th percentiles, rounded
/// to the nearest integer. `min <= likely <= max` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResult {
    pub min: i64,
    pub likely: i64,
    pub max: i64,
    pub samples_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let req = ForecastRequest::new(500.0);
        assert_eq!(req.variability_pct, 20.0);
        assert_eq!(req.runs, 10_000);
        assert_eq!(req.floor, None);
        assert_eq!(req.cap, None);
    }

    #[test]
    fn stored_budget_profile_caps_at_one_and_a_half_times_total() {
        let req = ForecastRequest::for_budget_total(2000.0);
        assert_eq!(req.base, 2000.0);
        assert_eq!(req.variability_pct, 20.0);
        assert_eq!(req.runs, 1000);
        assert_eq!(req.floor, Some(0.0));
        assert_eq!(req.cap, Some(3000.0));
    }

    #[test]
    fn stored_budget_cap_saturates_for_huge_totals() {
        let req = ForecastRequest::for_budget_total(1.3e308);
        assert_eq!(req.cap, Some(f64::MAX));
    }

    #[test]
    fn result_uses_camel_case_on_the_wire() {
        let r = ForecastResult {
            min: 1,
            likely: 2,
            max: 3,
            samples_count: 4,
        };
        let json = serde_json::to_value(r).unwrap();
        assert_eq!(json, serde_json::json!({"min": 1, "likely": 2, "max": 3, "samplesCount": 4}));
    }
}
