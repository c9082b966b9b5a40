//! API Router configuration

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::dispatch_handler::{dispatch_batch, get_campaign};
use super::metrics_handler::metrics_handler;
use super::scheduler_handler::run_scheduler;
use crate::application::{Dispatcher, RetryScheduler};
use crate::domain::campaign::CampaignRepository;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub scheduler: Arc<RetryScheduler>,
    pub campaigns: Arc<dyn CampaignRepository>,
}

/// Build the API router. The metrics route is only mounted when a Prometheus
/// recorder was installed (it is global, so tests pass `None`).
pub fn build_router(state: AppState, prometheus_handle: Option<PrometheusHandle>) -> Router {
    let metrics_routes = match prometheus_handle {
        Some(handle) => Router::new()
            .route("/metrics", get(metrics_handler))
            .with_state(handle),
        None => Router::new(),
    };

    Router::new()
        .route("/health", get(health_check))
        .route("/dispatch", post(dispatch_batch))
        .route("/scheduler/run", post(run_scheduler))
        .route("/campaigns/:id", get(get_campaign))
        .with_state(state)
        .merge(metrics_routes)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "service": "outdial" }))
}
