//! Room Controller
//!
//! Stateful WebSocket coordinator for two-player grid game rooms.
//!
//! # Server
//!
//! One HTTP listener (default: 0.0.0.0:5174) serves:
//! - `/ws` - WebSocket gateway for room play
//! - `/api/*` - move suggestion and player settings
//! - `/health`, `/ready`, `/metrics` - probes and Prometheus scrape
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment
//! 2. Initialize Prometheus metrics recorder
//! 3. Spawn the room registry actor
//! 4. Bind the listener (fail fast on bind errors)
//! 5. Serve, mark ready
//! 6. Wait for shutdown signal, mark not ready, drain rooms, stop the server

#![warn(clippy::pedantic)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use room_controller::actors::{ActorMetrics, RoomRegistryHandle};
use room_controller::config::Config;
use room_controller::observability::{init_metrics_recorder, HealthState};
use room_controller::routes::{build_routes, AppState};
use room_controller::settings::PlayerSettingsStore;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long in-flight HTTP requests get after the shutdown signal.
const SERVER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "room_controller=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Room Controller");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        instance_id = %config.instance_id,
        bind_address = %config.bind_address,
        turn_duration_ticks = config.turn_duration_ticks,
        tick_interval_ms = config.tick_interval_ms,
        max_rooms = config.max_rooms,
        room_id_length = config.room_id_length,
        "Configuration loaded successfully"
    );

    // This must happen before any metrics are recorded
    info!("Initializing Prometheus metrics recorder...");
    let prometheus_handle = init_metrics_recorder().map_err(|e| {
        error!(error = %e, "Failed to install Prometheus metrics recorder");
        e
    })?;
    info!("Prometheus metrics recorder initialized");

    let health_state = Arc::new(HealthState::new());
    let actor_metrics = ActorMetrics::new();

    info!("Initializing room registry...");
    let registry = RoomRegistryHandle::new(
        config.instance_id.clone(),
        config.registry_settings(),
        Arc::clone(&actor_metrics),
    );
    info!("Room registry initialized");

    let bind_address: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!(error = %e, addr = %config.bind_address, "Invalid bind address");
        format!("Invalid bind address: {e}")
    })?;

    let state = Arc::new(AppState {
        config,
        registry: registry.clone(),
        players: Arc::new(PlayerSettingsStore::new()),
        health: Arc::clone(&health_state),
        metrics: actor_metrics,
    });

    let metrics_router = Router::new().route(
        "/metrics",
        get(move || {
            let handle = prometheus_handle.clone();
            async move { handle.render() }
        }),
    );
    let app = build_routes(state).merge(metrics_router);

    // Bind listener BEFORE spawning to fail fast on bind errors
    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .map_err(|e| {
            error!(error = %e, addr = %bind_address, "Failed to bind listener");
            format!("Failed to bind listener to {bind_address}: {e}")
        })?;
    info!(addr = %bind_address, "Listener bound successfully");

    let server_token = CancellationToken::new();
    let server_shutdown = server_token.clone();
    let server_task = tokio::spawn(async move {
        info!(addr = %bind_address, "HTTP server starting");
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            server_shutdown.cancelled().await;
            info!("HTTP server shutting down");
        });
        if let Err(e) = server.await {
            error!(error = %e, "HTTP server failed");
        }
    });

    health_state.set_ready();
    info!("Room Controller running - press Ctrl+C to shutdown");

    shutdown_signal().await;
    info!("Shutdown signal received, initiating graceful shutdown...");

    // Mark as not ready immediately so load balancers stop sending traffic
    health_state.set_not_ready();

    // Drain rooms first: cancels every room actor and turn timer
    if let Err(e) = registry.shutdown().await {
        warn!(error = %e, "Room registry shutdown error");
    }

    server_token.cancel();
    if tokio::time::timeout(SERVER_SHUTDOWN_TIMEOUT, server_task)
        .await
        .is_err()
    {
        warn!("HTTP server did not stop within timeout");
    }

    info!("Room Controller shutdown complete");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
