//! Burn rate: how much of a budget's total is already spent.

/// Percentage of `total` consumed by `spent`.
///
/// Returns 0 when `total <= 0` (no meaningful rate), never an error.
pub fn burn_rate(spent: f64, total: f64) -> f64 {
    if total.is_nan() || total <= 0.0 {
        return 0.0;
    }
    100.0 * spent / total
}

/// Round to 2 decimals for display and alert payloads.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
