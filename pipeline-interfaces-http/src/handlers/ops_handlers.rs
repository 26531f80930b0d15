use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use tokio::time::{timeout, Duration};
use tracing::error;

use pipeline_application::{AppState, MetricsSnapshot};

use crate::error::HttpError;
use crate::middleware::authorize;

#[derive(Serialize)]
pub struct StatusBody {
    pub metrics: MetricsSnapshot,
    pub attribution_cache_entries: usize,
}

pub async fn health_live() -> StatusCode {
    StatusCode::OK
}

/// Ready once the sink answers a ping within the request timeout.
pub async fn health_ready(State(state): State<AppState>) -> Result<StatusCode, HttpError> {
    let timeout_secs = state.config.request_timeout_seconds.max(1);
    let timeout_duration = Duration::from_secs(timeout_secs);
    match timeout(timeout_duration, state.event_sink.ping()).await {
        Ok(Ok(_)) => Ok(StatusCode::OK),
        Ok(Err(err)) => {
            error!("ready check failed: {}", err);
            Err(HttpError::Unavailable(format!("sink unavailable: {}", err)))
        }
        Err(_) => {
            error!("ready check timeout after {}s", timeout_secs);
            Err(HttpError::Unavailable(format!(
                "sink ping timed out after {}s",
                timeout_secs
            )))
        }
    }
}

pub async fn metrics_prometheus(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if !authorize(&state.config, &headers) {
        return (StatusCode::UNAUTHORIZED, "unauthorized".to_string()).into_response();
    }
    let payload = state.metrics.render_prometheus();
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
    );
    (headers, payload).into_response()
}

pub async fn status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<StatusBody>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    Ok(Json(StatusBody {
        metrics: state.metrics.snapshot(),
        attribution_cache_entries: state.source_names.len().await,
    }))
}
