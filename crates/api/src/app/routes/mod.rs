use axum::{routing::get, Router};

pub mod alerts;
pub mod budgets;
pub mod forecast;
pub mod system;

pub fn router() -> Router {
    Router::new()
        .nest("/budgets", budgets::router().route("/:id/alert", get(alerts::stream)))
        .nest("/forecast", forecast::router())
}
