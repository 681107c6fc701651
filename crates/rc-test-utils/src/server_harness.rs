//! Test server harness for E2E testing
//!
//! Provides `TestRcServer` for spawning real RC server instances in tests.

use room_controller::actors::{ActorMetrics, RoomRegistryHandle};
use room_controller::config::Config;
use room_controller::observability::HealthState;
use room_controller::routes::{self, AppState};
use room_controller::settings::PlayerSettingsStore;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Test harness for spawning a Room Controller server in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health_flow_e2e() -> Result<(), anyhow::Error> {
///     let server = TestRcServer::spawn().await?;
///
///     let response = reqwest::get(&format!("{}/api/health", server.url())).await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestRcServer {
    addr: SocketAddr,
    config: Config,
    state: Arc<AppState>,
    _handle: JoinHandle<()>,
}

impl TestRcServer {
    /// Spawn a test server with default configuration.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with_vars(HashMap::new()).await
    }

    /// Spawn a test server, overriding configuration variables.
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Start the HTTP server in the background
    /// - Report ready on `/ready`
    ///
    /// # Arguments
    /// * `overrides` - Environment-style variables, e.g. `RC_TICK_INTERVAL_MS`
    ///
    /// # Returns
    /// * `Ok(TestRcServer)` - Running server instance
    /// * `Err(anyhow::Error)` - If server spawn fails
    pub async fn spawn_with_vars(overrides: HashMap<String, String>) -> Result<Self, anyhow::Error> {
        let mut vars = HashMap::from([
            ("RC_BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("RC_INSTANCE_ID".to_string(), "rc-test".to_string()),
        ]);
        vars.extend(overrides);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let metrics = ActorMetrics::new();
        let registry = RoomRegistryHandle::new(
            config.instance_id.clone(),
            config.registry_settings(),
            Arc::clone(&metrics),
        );
        let health = Arc::new(HealthState::new());

        let state = Arc::new(AppState {
            config: config.clone(),
            registry,
            players: Arc::new(PlayerSettingsStore::new()),
            health: Arc::clone(&health),
            metrics,
        });

        // Build routes using room-controller's real route builder
        let app = routes::build_routes(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind(config.bind_address.as_str())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        health.set_ready();

        Ok(Self {
            addr,
            config,
            state,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the WebSocket gateway URL.
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the room registry, for asserting on live rooms.
    pub fn registry(&self) -> &RoomRegistryHandle {
        &self.state.registry
    }

    /// Get the shared actor metrics.
    pub fn metrics(&self) -> &Arc<ActorMetrics> {
        &self.state.metrics
    }
}

impl Drop for TestRcServer {
    fn drop(&mut self) {
        // Stop every room and timer along with the HTTP task.
        self.state.registry.cancel();
        self._handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_spawns_successfully() -> Result<(), anyhow::Error> {
        let server = TestRcServer::spawn().await?;

        assert!(server.url().starts_with("http://127.0.0.1:"));
        assert!(server.ws_url().starts_with("ws://127.0.0.1:"));
        assert!(server.ws_url().ends_with("/ws"));

        let response = reqwest::get(&format!("{}/api/health", server.url())).await?;
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await?;
        assert_eq!(body["ok"], true);

        let response = reqwest::get(&format!("{}/ready", server.url())).await?;
        assert_eq!(response.status(), 200);

        Ok(())
    }

    #[tokio::test]
    async fn test_overrides_reach_config() -> Result<(), anyhow::Error> {
        let server = TestRcServer::spawn_with_vars(HashMap::from([(
            "RC_TICK_INTERVAL_MS".to_string(),
            "25".to_string(),
        )]))
        .await?;

        assert_eq!(server.config().tick_interval_ms, 25);
        assert_eq!(server.config().instance_id, "rc-test");
        assert_eq!(server.registry().get_status().await?.room_count, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_multiple_servers_different_ports() -> Result<(), anyhow::Error> {
        let server1 = TestRcServer::spawn().await?;
        let server2 = TestRcServer::spawn().await?;

        assert_ne!(server1.addr(), server2.addr());

        let response1 = reqwest::get(&format!("{}/health", server1.url())).await?;
        assert_eq!(response1.status(), 200);

        let response2 = reqwest::get(&format!("{}/health", server2.url())).await?;
        assert_eq!(response2.status(), 200);

        Ok(())
    }
}
