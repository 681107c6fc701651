//! HTTP request handlers for the Room Controller.

pub mod ai;
pub mod health;
pub mod players;

pub use ai::ai_move;
pub use health::api_health;
pub use players::{create_player, get_player_settings, update_player_settings};
