//! Prometheus metrics handler

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

/// Initialize the Prometheus metrics exporter
pub fn init_metrics() -> PrometheusHandle {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("dial_dispatch_duration_seconds".to_string()),
            &[0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0],
        )
        .unwrap()
        .install_recorder()
        .unwrap();

    describe_counter!(
        "dial_calls_total",
        "Total gateway calls placed, labeled by outcome"
    );
    describe_counter!(
        "dial_retries_total",
        "Total retry attempts initiated by the scheduler"
    );
    describe_histogram!(
        "dial_dispatch_duration_seconds",
        "Wall-clock duration of one dispatch batch"
    );

    handle
}

/// HTTP metrics handler
pub async fn metrics_handler(
    axum::extract::State(prometheus_handle): axum::extract::State<PrometheusHandle>,
) -> Response {
    let metrics = prometheus_handle.render();
    (StatusCode::OK, metrics).into_response()
}
