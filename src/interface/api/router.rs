//! API Router configuration

use super::auth_handler::{login, logout, register, validate};
use super::calls_handler::{get_call, health_check, list_calls};
use super::metrics_handler::metrics_handler;
use super::orchestration_handler::{
    apply_credit_card, apply_loan, get_account, get_accounts, get_application_status,
    get_balance, get_statements, get_user, get_user_profile, load_context, transfer,
    update_state,
};
use super::state::AppState;
use super::webhook_handler::{receive_webhook, WEBHOOK_BODY_LIMIT};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the API router.
///
/// `request_timeout` bounds each orchestration request, backend retries
/// included. `/metrics` is only mounted when a Prometheus handle is given.
pub fn build_router(
    state: AppState,
    prometheus_handle: Option<PrometheusHandle>,
    request_timeout: Duration,
) -> Router {
    // Health check route (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    let webhook_routes = Router::new()
        .route("/webhook", post(receive_webhook))
        .layer(DefaultBodyLimit::max(WEBHOOK_BODY_LIMIT));

    // Read-only call inspection
    let admin_routes = Router::new()
        .route("/admin/calls", get(list_calls))
        .route("/admin/call", get(get_call));

    let orchestration_routes = Router::new()
        .route("/orchestrate/load-context", post(load_context))
        .route("/orchestrate/get-user", post(get_user))
        .route("/orchestrate/get-user-profile", post(get_user_profile))
        .route("/orchestrate/get-accounts", post(get_accounts))
        .route("/orchestrate/get-account", post(get_account))
        .route("/orchestrate/get-balance", post(get_balance))
        .route("/orchestrate/get-statements", post(get_statements))
        .route("/orchestrate/transfer", post(transfer))
        .route("/orchestrate/apply-loan", post(apply_loan))
        .route("/orchestrate/apply-credit-card", post(apply_credit_card))
        .route(
            "/orchestrate/get-application-status",
            post(get_application_status),
        )
        .route("/orchestrate/update-state", post(update_state))
        .layer(TimeoutLayer::new(request_timeout));

    let auth_routes = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/validate", post(validate))
        .route("/auth/register", post(register));

    let mut router = Router::new()
        .merge(health_routes)
        .merge(webhook_routes)
        .merge(admin_routes)
        .merge(orchestration_routes)
        .merge(auth_routes)
        .with_state(state);

    // Metrics route (separate state)
    if let Some(handle) = prometheus_handle {
        let metrics_routes = Router::new()
            .route("/metrics", get(metrics_handler))
            .with_state(handle);
        router = router.merge(metrics_routes);
    }

    router
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
