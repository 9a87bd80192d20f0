//! Prometheus metrics handler

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder. Call once per process.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    describe_counter!(
        "webhook_events_total",
        "Accepted webhook deliveries by event type"
    );
    describe_counter!(
        "webhook_rejected_total",
        "Webhook deliveries refused before processing"
    );
    describe_counter!(
        "backend_requests_total",
        "Backend requests by final outcome"
    );
    describe_counter!("backend_retries_total", "Backend request retries");
    describe_counter!(
        "call_transitions_total",
        "Accepted call state transitions by target state"
    );
    describe_counter!(
        "call_transition_failures_total",
        "Rejected call state transitions"
    );
    describe_gauge!("active_calls", "Calls currently held in the registry");

    Ok(handle)
}

/// HTTP metrics handler
pub async fn metrics_handler(
    axum::extract::State(prometheus_handle): axum::extract::State<PrometheusHandle>,
) -> Response {
    let metrics = prometheus_handle.render();
    (StatusCode::OK, metrics).into_response()
}
