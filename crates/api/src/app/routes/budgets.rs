use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use budgetwatch_core::BudgetId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_budget).get(list_budgets))
        .route("/:id", get(get_budget))
        .route("/:id/spend", post(apply_spend))
}

pub(crate) fn parse_budget_id(raw: &str) -> Result<BudgetId, axum::response::Response> {
    raw.parse::<BudgetId>()
        .map_err(errors::domain_error_to_response)
}

pub async fn create_budget(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateBudgetRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let created = body
        .into_parts()
        .and_then(|(name, total)| services.store().create(name, total));

    match created {
        Ok(budget) => (StatusCode::CREATED, Json(budget)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_budgets(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.store().list() {
        Ok(items) => Json(dto::ListResponse { items }).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_budget(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_budget_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.get_budget(id) {
        Ok(budget) => Json(budget).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn apply_spend(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::SpendRequest>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_budget_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let outcome = body
        .amount()
        .and_then(|amount| services.monitor().apply_spend(id, amount));

    match outcome {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
