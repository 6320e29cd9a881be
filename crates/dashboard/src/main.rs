mod api;
mod config;
mod error;
mod state;

use anyhow::{Context, Result};
use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};

use crate::config::{DashboardConfig, LogFormat, LogOutput};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Phase 1: Basic tracing so we can log during config loading
    // Uses set_default (thread-local) so it can be replaced by Phase 2's global subscriber
    let _basic_tracing = init_tracing_basic();

    info!("Starting Tracedeck Dashboard v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = DashboardConfig::load().context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    // Phase 2: Re-initialize tracing with config (format, level)
    // Drop the phase-1 thread-local guard so the global subscriber slot is free
    drop(_basic_tracing);
    init_tracing_from_config(&config);

    info!("Configuration loaded successfully");
    info!("Server will bind to: {}", config.server.bind_address);

    // Create application state (session store)
    let state = AppState::new(config.clone());

    // Build the application router
    let app = build_router(state);

    // Parse bind address
    let addr: SocketAddr = config
        .server
        .bind_address
        .parse()
        .context("Invalid bind address")?;

    info!("Starting HTTP server...");
    info!("  - Upload endpoint: http://{}/api/logs", addr);
    info!("  - Health check: http://{}/health", addr);

    // Start server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    info!("✓ Tracedeck Dashboard is ready!");
    info!("Listening on: http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down gracefully");
    Ok(())
}

/// Build the application router
fn build_router(state: AppState) -> Router {
    // CORS configuration
    let cors = if state.config.server.enable_cors {
        // Use the actual origins from config
        let origins = state
            .config
            .server
            .cors_origins
            .iter()
            .filter_map(|s| s.parse::<axum::http::HeaderValue>().ok())
            .collect::<Vec<_>>();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        // When CORS is disabled, use a restrictive layer (same-origin only)
        CorsLayer::new()
    };

    // Request timeout from config
    let request_timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    // Uploaded log files are the only large bodies we accept
    let max_upload = state.config.server.max_upload_bytes;

    Router::new()
        // Health endpoint
        .route("/health", get(health_handler))
        // Root endpoint
        .route("/", get(root_handler))
        // Log sessions
        .route("/api/logs", post(api::upload::upload_log))
        .route(
            "/api/logs/{id}",
            get(api::session::get_session).delete(api::session::delete_session),
        )
        .route("/api/logs/{id}/columns", put(api::session::update_columns))
        .route("/api/logs/{id}/filters", get(api::session::filter_options))
        // Rendered views
        .route("/api/logs/{id}/overview", get(api::overview::overview))
        .route("/api/logs/{id}/variants", get(api::variants::variants))
        // Declared-but-unimplemented tabs
        .route("/api/logs/{id}/dfg", get(api::mining::dfg))
        .route("/api/logs/{id}/inductive", get(api::mining::inductive))
        .layer(
            ServiceBuilder::new()
                // Timeout for requests (prevents indefinitely hanging connections)
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    request_timeout,
                ))
                .layer(DefaultBodyLimit::max(max_upload))
                .layer(cors),
        )
        .with_state(state)
}

/// Root handler - shows API info
async fn root_handler() -> Json<serde_json::Value> {
    Json(json!({
        "name": "Tracedeck Dashboard API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "/api/logs",
            "session": "/api/logs/{id}",
            "columns": "/api/logs/{id}/columns",
            "filters": "/api/logs/{id}/filters",
            "overview": "/api/logs/{id}/overview",
            "variants": "/api/logs/{id}/variants",
            "dfg": "/api/logs/{id}/dfg",
            "inductive": "/api/logs/{id}/inductive",
            "health": "/health"
        }
    }))
}

/// Health check handler
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "sessions": state.sessions.count(),
        })),
    )
}

/// Phase 1: Basic tracing init so we can log during config loading.
/// Uses RUST_LOG env var or a sensible default.
fn init_tracing_basic() -> tracing::subscriber::DefaultGuard {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,dashboard=debug"));

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_default(subscriber)
}

/// Phase 2: Re-initialize tracing with configuration values.
/// This replaces the global subscriber with one that respects config.
fn init_tracing_from_config(config: &DashboardConfig) {
    use std::sync::Arc;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Prefer RUST_LOG env var, fall back to config level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match (&config.logging.format, &config.logging.output) {
        (LogFormat::Json, LogOutput::Stdout) => {
            let layer = fmt::layer().json().with_target(true).with_thread_ids(true);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        (LogFormat::Json, LogOutput::File { path }) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .unwrap_or_else(|e| panic!("Failed to open log file '{}': {}", path, e));
            let layer = fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(false)
                .with_writer(Arc::new(file));
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        (LogFormat::Pretty, LogOutput::Stdout) => {
            let layer = fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        (LogFormat::Pretty, LogOutput::File { path }) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .unwrap_or_else(|e| panic!("Failed to open log file '{}': {}", path, e));
            let layer = fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_ansi(false)
                .with_writer(Arc::new(file));
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
