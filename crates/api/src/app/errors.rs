use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use thiserror::Error;

use budgetwatch_core::DomainError;

/// Errors surfaced by API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("forecast did not finish within {0:?}")]
    ForecastTimeout(Duration),

    #[error("internal error: {0}")]
    Internal(String),
}

pub fn api_error_to_response(err: ApiError) -> axum::response::Response {
    match err {
        ApiError::Domain(e) => domain_error_to_response(e),
        ApiError::ForecastTimeout(_) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "forecast_timeout", err.to_string())
        }
        ApiError::Internal(msg) => {
            tracing::error!("internal error: {msg}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::InvalidInput(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_input", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "Budget not found"),
        DomainError::Storage(msg) => {
            tracing::error!("storage failure: {msg}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", msg)
        }
    }
}

/// Malformed or mistyped JSON bodies are client errors (400), never 422.
pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_input", rejection.body_text())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
