use std::f64::consts::PI;

use rand::Rng;
use rand::distributions::{Distribution, Open01};

use budgetwatch_core::{DomainError, DomainResult};

use crate::request::{ForecastRequest, ForecastResult};

/// Default ceiling on `runs`; bounds worst-case latency and the `O(runs)` sample buffer.
pub const DEFAULT_MAX_RUNS: usize = 100_000;

const LOW_PERCENTILE: f64 = 0.10;
const LIKELY_PERCENTILE: f64 = 0.50;
const HIGH_PERCENTILE: f64 = 0.90;

/// Monte Carlo forecast engine.
///
/// Model:
/// - Draw `runs` samples from Normal(base, σ) with σ = variability_pct% of base
///   (Box–Muller over two independent uniform draws).
/// - Clamp each sample to `floor`, then to `cap`, then to a minimum of 0.
/// - Sort, then read the 10th/50th/90th percentiles as `sample[floor(p·n)]`.
///
/// The engine holds configuration only; it is `Copy` and safe to share.
#[derive(Debug, Clone, Copy)]
pub struct ForecastEngine {
    max_runs: usize,
}

impl ForecastEngine {
    pub fn new() -> Self {
        Self {
            max_runs: DEFAULT_MAX_RUNS,
        }
    }

    pub fn with_max_runs(mut self, max_runs: usize) -> Self {
        self.max_runs = max_runs;
        self
    }

    pub fn max_runs(&self) -> usize {
        self.max_runs
    }

    /// Run a forecast using the thread-local RNG.
    pub fn simulate(&self, request: &ForecastRequest) -> DomainResult<ForecastResult> {
        self.simulate_with(request, &mut rand::thread_rng())
    }

    /// Run a forecast drawing from `rng`.
    ///
    /// Output is reproducible for a seeded `rng`, and fully deterministic when
    /// `variability_pct` is 0.
    pub fn simulate_with<R: Rng + ?Sized>(
        &self,
        request: &ForecastRequest,
        rng: &mut R,
    ) -> DomainResult<ForecastResult> {
        self.validate(request)?;

        let sigma = (request.variability_pct / 100.0) * request.base;
        let mut samples: Vec<f64> = Vec::with_capacity(request.runs);
        for _ in 0..request.runs {
            let raw = request.base + standard_normal(rng) * sigma;
            samples.push(clamp_sample(raw, request.floor, request.cap));
        }
        samples.sort_by(f64::total_cmp);

        let result = ForecastResult {
            min: percentile(&samples, LOW_PERCENTILE).round() as i64,
            likely: percentile(&samples, LIKELY_PERCENTILE).round() as i64,
            max: percentile(&samples, HIGH_PERCENTILE).round() as i64,
            samples_count: request.runs,
        };

        tracing::debug!(
            base = request.base,
            runs = request.runs,
            min = result.min,
            likely = result.likely,
            max = result.max,
            "forecast simulated"
        );

        Ok(result)
    }

    fn validate(&self, request: &ForecastRequest) -> DomainResult<()> {
        if !(request.base.is_finite() && request.base > 0.0) {
            return Err(DomainError::invalid_input("base must be > 0"));
        }
        if !request.variability_pct.is_finite() {
            return Err(DomainError::invalid_input("variabilityPct must be a finite number"));
        }
        if request.runs == 0 {
            return Err(DomainError::invalid_input("runs must be > 0"));
        }
        if request.runs > self.max_runs {
            return Err(DomainError::invalid_input(format!(
                "runs must be <= {}",
                self.max_runs
            )));
        }
        if request.floor.is_some_and(|f| !f.is_finite()) {
            return Err(DomainError::invalid_input("floor must be a finite number"));
        }
        if request.cap.is_some_and(|c| !c.is_finite()) {
            return Err(DomainError::invalid_input("cap must be a finite number"));
        }
        Ok(())
    }
}

impl Default for ForecastEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// One standard-normal draw via Box–Muller.
///
/// `Open01` excludes 0, so `ln(u)` is always finite.
fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u: f64 = Open01.sample(rng);
    let v: f64 = Open01.sample(rng);
    (-2.0 * u.ln()).sqrt() * (2.0 * PI * v).cos()
}

fn clamp_sample(value: f64, floor: Option<f64>, cap: Option<f64>) -> f64 {
    let mut v = value;
    if let Some(f) = floor {
        v = v.max(f);
    }
    if let Some(c) = cap {
        v = v.min(c);
    }
    v.max(0.0)
}

/// `sorted[clamp(floor(p·n), 0, n-1)]`. `sorted` must be non-empty.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    let idx = (p * n as f64).floor().max(0.0) as usize;
    sorted[idx.min(n - 1)]
}
