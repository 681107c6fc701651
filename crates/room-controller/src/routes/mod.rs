//! HTTP routes for the Room Controller.
//!
//! Defines the Axum router and application state.

use crate::actors::{ActorMetrics, RoomRegistryHandle};
use crate::config::Config;
use crate::gateway;
use crate::handlers;
use crate::observability::{health_router, HealthState};
use crate::settings::PlayerSettingsStore;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

/// Timeout for `/api/*` requests. WebSocket sessions are not bounded.
const API_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Owner of every live room.
    pub registry: RoomRegistryHandle,

    /// In-memory player settings.
    pub players: Arc<PlayerSettingsStore>,

    /// Liveness and readiness flags.
    pub health: Arc<HealthState>,

    /// Shared actor/connection counters.
    pub metrics: Arc<ActorMetrics>,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/ws` - WebSocket gateway
/// - `/api/health`, `/api/ai/move`, `/api/player...` - JSON API (30s timeout)
/// - `/health`, `/ready` - liveness and readiness probes
/// - TraceLayer for request logging, permissive CORS
///
/// `/metrics` is added by the binary, which owns the Prometheus recorder.
pub fn build_routes(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/api/health", get(handlers::api_health))
        .route("/api/ai/move", post(handlers::ai_move))
        .route("/api/player", post(handlers::create_player))
        .route(
            "/api/player/:id/settings",
            get(handlers::get_player_settings).put(handlers::update_player_settings),
        )
        .layer(TimeoutLayer::new(API_REQUEST_TIMEOUT));

    let ws_routes = Router::new().route("/ws", get(gateway::ws_handler));

    let health = health_router(Arc::clone(&state.health));

    // Layer order (bottom-to-top execution):
    // 1. CorsLayer - answer preflight, tag responses
    // 2. TraceLayer - log request details
    api_routes
        .merge(ws_routes)
        .with_state(state)
        .merge(health)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::actors::RegistrySettings;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use tower::ServiceExt;

    #[test]
    fn test_app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    fn test_state() -> Arc<AppState> {
        let metrics = ActorMetrics::new();
        let config = Config::from_vars(&HashMap::new()).unwrap();
        let registry = RoomRegistryHandle::new(
            config.instance_id.clone(),
            RegistrySettings::default(),
            Arc::clone(&metrics),
        );
        Arc::new(AppState {
            config,
            registry,
            players: Arc::new(PlayerSettingsStore::new()),
            health: Arc::new(HealthState::new()),
            metrics,
        })
    }

    async fn call(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                request = request.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = app.oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_api_health_route() {
        let state = test_state();
        let (status, body) = call(build_routes(Arc::clone(&state)), "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true}));
        state.registry.cancel();
    }

    #[tokio::test]
    async fn test_probes_are_merged() {
        let state = test_state();
        let app = build_routes(Arc::clone(&state));

        let (status, _) = call(app.clone(), "GET", "/ready", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        state.health.set_ready();
        let (status, body) = call(app, "GET", "/ready", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ready"}));
        state.registry.cancel();
    }

    #[tokio::test]
    async fn test_ai_move_route_rejects_bad_board() {
        let state = test_state();
        let (status, body) = call(
            build_routes(Arc::clone(&state)),
            "POST",
            "/api/ai/move",
            Some(json!({"board": [null, null]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid board");
        state.registry.cancel();
    }

    #[tokio::test]
    async fn test_player_settings_roundtrip() {
        let state = test_state();
        let app = build_routes(Arc::clone(&state));

        let (status, created) = call(app.clone(), "POST", "/api/player", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["settings"], json!({"music": true, "sound": true}));
        let player_id = created["playerId"].as_str().unwrap().to_string();
        let uri = format!("/api/player/{player_id}/settings");

        let (status, updated) = call(
            app.clone(),
            "PUT",
            &uri,
            Some(json!({"sound": false, "music": "loud"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated, json!({"music": true, "sound": false}));

        let (status, fetched) = call(app.clone(), "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, updated);

        let (status, missing) =
            call(app, "GET", "/api/player/unknown/settings", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(missing["error"], "Player not found");
        state.registry.cancel();
    }
}
