pub mod config;
pub mod modules;
pub mod services;

use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use modules::auth::{auth_routes, UserService};
use modules::metrics::metrics_routes;
use services::metrics::{metrics_middleware, MetricsRegistry};
use services::rate_limit::{create_rate_limiter, RateLimitLayer};
use services::security::security_headers;

pub struct AppState {
    pub user_service: UserService,
    pub metrics: Arc<MetricsRegistry>,
}

pub async fn create_app(state: AppState, rate_limit_burst: u32) -> Router {
    let metrics = state.metrics.clone();
    let state = Arc::new(state);

    let rate_limiter = create_rate_limiter(rate_limit_burst);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest(
            "/auth",
            auth_routes().route_layer(RateLimitLayer::new(rate_limiter)),
        )
        .merge(metrics_routes())
        .layer(middleware::from_fn_with_state(metrics, metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(RequestBodyLimitLayer::new(1024 * 100)) // 100KB max body
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> &'static str {
    "Lab Appointment System API"
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
