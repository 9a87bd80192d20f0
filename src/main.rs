use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use voicebank::application::{spawn_active_calls_gauge, spawn_stale_call_sweeper, SignatureVerifier};
use voicebank::config::Settings;
use voicebank::domain::auth::AuthService;
use voicebank::domain::call::CallStateMachine;
use voicebank::domain::user::UserRepository;
use voicebank::infrastructure::backend::BackendClient;
use voicebank::infrastructure::persistence::MemoryUserRepository;
use voicebank::interface::api::{build_router, init_metrics, AppState};

#[cfg(feature = "postgres")]
use voicebank::infrastructure::persistence::{open_user_store, DatabaseConfig, PgUserRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting voicebank orchestrator v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = settings.validate() {
        error!("Refusing to start: {}", e);
        return Err(e.into());
    }
    info!("Configuration loaded: {}", serde_json::to_string(&settings)?);

    let user_repository = build_user_repository(&settings).await?;
    let auth = Arc::new(AuthService::new(user_repository));
    if settings.seed_sample_users {
        auth.create_sample_users().await?;
    }

    // Initialize metrics exporter
    info!("Initializing Prometheus metrics exporter");
    let prometheus_handle = init_metrics()?;

    let backend = Arc::new(BackendClient::new(&settings.backend())?);
    match backend.is_healthy().await {
        Ok(true) => info!("Backend at {} is healthy", settings.backend_url),
        Ok(false) => warn!("Backend at {} reported unhealthy status", settings.backend_url),
        Err(e) => warn!("Backend health check failed: {}", e),
    }

    let calls = CallStateMachine::new();

    // Update the active calls gauge every 5 seconds
    spawn_active_calls_gauge(calls.clone(), Duration::from_secs(5));
    info!("Metrics updater task started");

    match settings.stale_call_timeout() {
        Some(max_age) => {
            spawn_stale_call_sweeper(calls.clone(), max_age, settings.stale_call_sweep_interval());
            info!("Stale call sweeper started (max age {:?})", max_age);
        }
        None => info!("Stale call sweeper disabled"),
    }

    let state = AppState::new(
        calls,
        backend,
        SignatureVerifier::new(&settings.retell_api_key),
        auth,
    );
    let app = build_router(state, Some(prometheus_handle), settings.request_timeout());

    let listener = tokio::net::TcpListener::bind(settings.bind_address()).await?;
    info!("Orchestrator listening on {}", settings.bind_address());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Orchestrator stopped");
    Ok(())
}

async fn build_user_repository(settings: &Settings) -> anyhow::Result<Arc<dyn UserRepository>> {
    match settings.user_store.as_str() {
        #[cfg(feature = "postgres")]
        "postgres" => {
            let pool = open_user_store(&DatabaseConfig::from_settings(settings)).await?;
            Ok(Arc::new(PgUserRepository::new(pool)))
        }
        _ => {
            info!("Using in-memory user store");
            Ok(Arc::new(MemoryUserRepository::new()))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutting down...");
}
