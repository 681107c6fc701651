//! In-memory player settings.
//!
//! Players are identified by an opaque UUID handed out on creation. Nothing is
//! persisted; a restart forgets every player.

use crate::errors::RcError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Audio preferences for one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSettings {
    pub music: bool,
    pub sound: bool,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            music: true,
            sound: true,
        }
    }
}

/// Partial update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub music: Option<bool>,
    pub sound: Option<bool>,
}

impl SettingsUpdate {
    /// Read an update from an arbitrary JSON body. Non-boolean values are ignored.
    #[must_use]
    pub fn from_json(body: &Value) -> Self {
        Self {
            music: body.get("music").and_then(Value::as_bool),
            sound: body.get("sound").and_then(Value::as_bool),
        }
    }

    fn apply(self, current: PlayerSettings) -> PlayerSettings {
        PlayerSettings {
            music: self.music.unwrap_or(current.music),
            sound: self.sound.unwrap_or(current.sound),
        }
    }
}

#[derive(Debug, Default)]
pub struct PlayerSettingsStore {
    players: RwLock<HashMap<Uuid, PlayerSettings>>,
}

impl PlayerSettingsStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new player with default settings.
    pub async fn create(&self) -> (Uuid, PlayerSettings) {
        let player_id = Uuid::new_v4();
        let settings = PlayerSettings::default();
        self.players.write().await.insert(player_id, settings);
        (player_id, settings)
    }

    pub async fn get(&self, player_id: &str) -> Result<PlayerSettings, RcError> {
        let id = parse_player_id(player_id)?;
        self.players
            .read()
            .await
            .get(&id)
            .copied()
            .ok_or(RcError::PlayerNotFound)
    }

    pub async fn update(
        &self,
        player_id: &str,
        update: SettingsUpdate,
    ) -> Result<PlayerSettings, RcError> {
        let id = parse_player_id(player_id)?;
        let mut players = self.players.write().await;
        let current = players.get_mut(&id).ok_or(RcError::PlayerNotFound)?;
        *current = update.apply(*current);
        Ok(*current)
    }

    pub async fn len(&self) -> usize {
        self.players.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.players.read().await.is_empty()
    }
}

/// Ids that are not UUIDs cannot belong to any player.
fn parse_player_id(raw: &str) -> Result<Uuid, RcError> {
    Uuid::parse_str(raw).map_err(|_| RcError::PlayerNotFound)
}
