//! Player settings handlers.
//!
//! - `POST /api/player` - register a player with default settings
//! - `GET /api/player/{id}/settings` - read settings
//! - `PUT /api/player/{id}/settings` - partial update (`music`, `sound`)

use crate::errors::RcError;
use crate::routes::AppState;
use crate::settings::{PlayerSettings, SettingsUpdate};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Debug, Serialize)]
pub struct CreatePlayerResponse {
    #[serde(rename = "playerId")]
    pub player_id: String,
    pub settings: PlayerSettings,
}

/// Handler for POST /api/player
#[instrument(skip_all, name = "rc.api.create_player")]
pub async fn create_player(State(state): State<Arc<AppState>>) -> Json<CreatePlayerResponse> {
    let (player_id, settings) = state.players.create().await;

    info!(target: "rc.api", player_id = %player_id, "Player registered");

    Json(CreatePlayerResponse {
        player_id: player_id.to_string(),
        settings,
    })
}

/// Handler for GET /api/player/{id}/settings
///
/// - 200 OK: `{"music": true, "sound": true}`
/// - 404 Not Found: unknown player
#[instrument(skip_all, name = "rc.api.get_player_settings", fields(player_id = %player_id))]
pub async fn get_player_settings(
    State(state): State<Arc<AppState>>,
    Path(player_id): Path<String>,
) -> Result<Json<PlayerSettings>, RcError> {
    let settings = state.players.get(&player_id).await?;
    Ok(Json(settings))
}

/// Handler for PUT /api/player/{id}/settings
///
/// Fields that are absent or not booleans are left unchanged, and so is
/// everything when the body is not JSON.
#[instrument(skip_all, name = "rc.api.update_player_settings", fields(player_id = %player_id))]
pub async fn update_player_settings(
    State(state): State<Arc<AppState>>,
    Path(player_id): Path<String>,
    body: Bytes,
) -> Result<Json<PlayerSettings>, RcError> {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let settings = state
        .players
        .update(&player_id, SettingsUpdate::from_json(&body))
        .await?;
    Ok(Json(settings))
}
