//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store, monitor and forecast engine behind one shared handle
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: ApiConfig) -> Router {
    router_with(Arc::new(services::AppServices::new(config)))
}

/// Router over an existing set of services, so callers can keep a handle on them.
pub fn router_with(services: Arc<services::AppServices>) -> Router {
    Router::new()
        .route("/healthz", get(routes::system::health))
        .merge(routes::router())
        .layer(Extension(services))
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn(middleware::request_logging)))
}
