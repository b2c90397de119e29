use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::app::routes::budgets::parse_budget_id;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(simulate))
        .route("/:id", get(forecast_budget))
}

/// Ad hoc forecast from caller-supplied parameters.
pub async fn simulate(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::ForecastRequestBody>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let request = match body.into_request() {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.forecast(request).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => errors::api_error_to_response(e),
    }
}

/// Forecast for a stored budget, from its current total.
pub async fn forecast_budget(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_budget_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.forecast_budget(id).await {
        Ok((budget, forecast)) => Json(dto::BudgetForecastResponse::new(budget, forecast)).into_response(),
        Err(e) => errors::api_error_to_response(e),
    }
}
