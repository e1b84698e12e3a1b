//! Courier server binary.
//!
//! Wires configuration, tracing, the relay core and the WebSocket
//! transport together, and owns the liveness monitor's lifecycle: started
//! at startup, signalled and awaited at shutdown.

use std::sync::Arc;

use axum::{http::HeaderValue, routing::get, Json, Router};
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use courier::adapters::websocket::{relay_router, RelayState};
use courier::application::{ConnectionLifecycle, ConnectionRegistry, LivenessMonitor};
use courier::config::AppConfig;
use courier::ports::CloseReason;

fn init_tracing(directives: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins = config.server.cors_origins_list();
    if origins.is_empty() {
        return CorsLayer::new().allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new().allow_origin(AllowOrigin::list(origins))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}

#[tokio::main]
async fn main() {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = config.validate() {
        eprintln!("invalid configuration: {e}");
        std::process::exit(1);
    }

    init_tracing(&config.server.log_level);

    let registry = Arc::new(ConnectionRegistry::new());
    let lifecycle = Arc::new(ConnectionLifecycle::new(registry.clone()));

    // The zombie sweep runs for the lifetime of the process and is stopped
    // explicitly on shutdown.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let monitor = LivenessMonitor::new(
        registry.clone(),
        config.liveness.scan_interval(),
        config.liveness.idle_timeout(),
    );
    let monitor_task = tokio::spawn(async move { monitor.run(shutdown_rx).await });

    let app = Router::new()
        .merge(relay_router())
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config)),
        )
        .with_state(RelayState::new(lifecycle));

    let addr = config.server.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, "courier listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server error");
    }

    let _ = shutdown_tx.send(true);
    let _ = monitor_task.await;

    // Close whatever is still connected so every socket is released before
    // the process exits.
    for handle in registry.snapshot().await {
        if let Err(e) = handle.close(CloseReason::Normal) {
            tracing::debug!(user_id = %handle.user(), error = %e, "failed to close connection at shutdown");
        }
    }
    tracing::info!("courier stopped");
}
