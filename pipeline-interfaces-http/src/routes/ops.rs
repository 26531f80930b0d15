use axum::Router;

use pipeline_application::AppState;

use crate::handlers::ops_handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/ops/health/live",
            axum::routing::get(ops_handlers::health_live),
        )
        .route(
            "/ops/health/ready",
            axum::routing::get(ops_handlers::health_ready),
        )
        .route(
            "/ops/metrics/prometheus",
            axum::routing::get(ops_handlers::metrics_prometheus),
        )
        .route("/ops/status", axum::routing::get(ops_handlers::status))
        .with_state(state)
}
