use serde::{de::Error as _, Deserialize, Deserializer, Serialize};

use budgetwatch_core::{Budget, BudgetId, DomainError, DomainResult};
use budgetwatch_forecasting::{ForecastRequest, ForecastResult, DEFAULT_RUNS, DEFAULT_VARIABILITY_PCT};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateBudgetRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total: Option<f64>,
}

impl CreateBudgetRequest {
    /// Presence checks; value checks happen in `Budget::new`.
    pub fn into_parts(self) -> DomainResult<(String, f64)> {
        let name = self
            .name
            .ok_or_else(|| DomainError::invalid_input("name is required"))?;
        let total = self
            .total
            .ok_or_else(|| DomainError::invalid_input("total must be a positive number"))?;
        Ok((name, total))
    }
}

#[derive(Debug, Deserialize)]
pub struct SpendRequest {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub amount: Option<f64>,
}

impl SpendRequest {
    pub fn amount(&self) -> DomainResult<f64> {
        self.amount
            .ok_or_else(|| DomainError::invalid_input("amount must be a positive number"))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRequestBody {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub base: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub variability_pct: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub runs: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub floor: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub cap: Option<f64>,
}

impl ForecastRequestBody {
    /// Fill defaults. Range checks on base/variability/bounds belong to the engine.
    pub fn into_request(self) -> DomainResult<ForecastRequest> {
        let base = self
            .base
            .ok_or_else(|| DomainError::invalid_input("base must be a positive number"))?;

        let runs = match self.runs {
            None => DEFAULT_RUNS,
            Some(r) if r.is_finite() && r >= 1.0 && r.fract() == 0.0 => r as usize,
            Some(r) => {
                return Err(DomainError::invalid_input(format!(
                    "runs must be a positive integer, got {r}"
                )));
            }
        };

        Ok(ForecastRequest {
            base,
            variability_pct: self.variability_pct.unwrap_or(DEFAULT_VARIABILITY_PCT),
            runs,
            floor: self.floor,
            cap: self.cap,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberLike {
    Num(f64),
    Text(String),
}

/// Accept a JSON number or a numeric string.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberLike>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberLike::Num(n)) => Ok(Some(n)),
        Some(NumberLike::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("{s:?} is not a number"))),
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetForecastResponse {
    pub budget_id: BudgetId,
    pub budget_name: String,
    pub current_total: f64,
    pub current_spent: f64,
    pub forecast: ForecastResult,
}

impl BudgetForecastResponse {
    pub fn new(budget: Budget, forecast: ForecastResult) -> Self {
        Self {
            budget_id: budget.id,
            budget_name: budget.name,
            current_total: budget.total,
            current_spent: budget.spent,
            forecast,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_and_numeric_strings_are_accepted() {
        let body: SpendRequest = serde_json::from_str(r#"{"amount": 12.5}"#).unwrap();
        assert_eq!(body.amount().unwrap(), 12.5);

        let body: SpendRequest = serde_json::from_str(r#"{"amount": " 40 "}"#).unwrap();
        assert_eq!(body.amount().unwrap(), 40.0);

        let body: SpendRequest = serde_json::from_str(r#"{"amount": 7}"#).unwrap();
        assert_eq!(body.amount().unwrap(), 7.0);
    }

    #[test]
    fn non_numeric_string_fails_to_deserialize() {
        assert!(serde_json::from_str::<SpendRequest>(r#"{"amount": "lots"}"#).is_err());
        assert!(serde_json::from_str::<SpendRequest>(r#"{"amount": true}"#).is_err());
    }

    #[test]
    fn missing_fields_are_invalid_input() {
        let body: SpendRequest = serde_json::from_str("{}").unwrap();
        assert!(matches!(body.amount(), Err(DomainError::InvalidInput(_))));

        let body: CreateBudgetRequest = serde_json::from_str(r#"{"total": 10}"#).unwrap();
        assert!(matches!(body.into_parts(), Err(DomainError::InvalidInput(_))));

        let body: CreateBudgetRequest = serde_json::from_str(r#"{"name": "Hiring"}"#).unwrap();
        assert!(matches!(body.into_parts(), Err(DomainError::InvalidInput(_))));
    }

    #[test]
    fn forecast_body_defaults() {
        let body: ForecastRequestBody = serde_json::from_str(r#"{"base": "1000"}"#).unwrap();
        let req = body.into_request().unwrap();
        assert_eq!(req.base, 1000.0);
        assert_eq!(req.variability_pct, DEFAULT_VARIABILITY_PCT);
        assert_eq!(req.runs, DEFAULT_RUNS);
        assert_eq!(req.floor, None);
        assert_eq!(req.cap, None);
    }

    #[test]
    fn zero_variability_is_kept() {
        let body: ForecastRequestBody =
            serde_json::from_str(r#"{"base": 1000, "variabilityPct": 0, "runs": 100}"#).unwrap();
        let req = body.into_request().unwrap();
        assert_eq!(req.variability_pct, 0.0);
        assert_eq!(req.runs, 100);
    }

    #[test]
    fn runs_must_be_a_positive_integer() {
        for raw in [r#"{"base": 1, "runs": 0}"#, r#"{"base": 1, "runs": -3}"#, r#"{"base": 1, "runs": 2.5}"#] {
            let body: ForecastRequestBody = serde_json::from_str(raw).unwrap();
            assert!(matches!(body.into_request(), Err(DomainError::InvalidInput(_))), "{raw}");
        }
    }

    #[test]
    fn missing_base_is_invalid_input() {
        let body: ForecastRequestBody = serde_json::from_str("{}").unwrap();
        assert!(matches!(body.into_request(), Err(DomainError::InvalidInput(_))));
    }
}
