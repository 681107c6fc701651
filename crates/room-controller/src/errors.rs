//! Room Controller error types.
//!
//! Every error maps to a stable client-facing code and message. Room and
//! gateway errors travel back on the WebSocket acknowledgment channel; the
//! HTTP surface renders the same type through `IntoResponse`.
//! Internal details are logged server-side but not exposed to clients.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Room Controller error type.
///
/// Maps to client codes:
/// - Room lookups: `ROOM_NOT_FOUND`, `ROOM_FULL`, `ALREADY_IN_ROOM`
/// - Move validation: `NOT_IN_ROOM`, `WAITING_FOR_OPPONENT`, `GAME_OVER`,
///   `INVALID_MOVE`, `CELL_OCCUPIED`, `NOT_YOUR_TURN`
/// - Boundary validation: `INVALID_MESSAGE`, `INVALID_BOARD`
/// - Capacity: `CAPACITY_EXCEEDED`, `DRAINING`
/// - `RoomIdExhausted`, `Internal`: `INTERNAL_ERROR`
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RcError {
    /// No live room with this identifier.
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    /// Room already has two members.
    #[error("Room full")]
    RoomFull,

    /// The connection holds no mark in this room.
    #[error("Not in room")]
    NotInRoom,

    /// The room has fewer than two members.
    #[error("Waiting for opponent")]
    WaitingForOpponent,

    /// The game has a winner or is drawn; no further moves.
    #[error("Game over")]
    GameOver,

    /// Target cell already holds a mark.
    #[error("Cell occupied")]
    CellOccupied,

    /// Mover's mark is not the current turn.
    #[error("Not your turn")]
    NotYourTurn,

    /// Move index outside the board.
    #[error("Invalid move: {0}")]
    InvalidMove(String),

    /// Frame could not be parsed into a known request.
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Connection is already bound to a room.
    #[error("Already in a room")]
    AlreadyInRoom,

    /// RC is at its room limit.
    #[error("RC at capacity")]
    CapacityExceeded,

    /// RC is draining (graceful shutdown).
    #[error("RC is draining")]
    Draining,

    /// Room identifier allocation kept colliding.
    #[error("Room id allocation exhausted after {attempts} attempts")]
    RoomIdExhausted { attempts: u32 },

    /// Board payload is not 9 valid cells.
    #[error("Invalid board")]
    InvalidBoard,

    /// No settings stored for this player.
    #[error("Player not found")]
    PlayerNotFound,

    /// Internal error (actor channel failures and similar).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RcError {
    /// Returns the stable client-facing code for this error.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            RcError::RoomNotFound(_) => "ROOM_NOT_FOUND",
            RcError::RoomFull => "ROOM_FULL",
            RcError::NotInRoom => "NOT_IN_ROOM",
            RcError::WaitingForOpponent => "WAITING_FOR_OPPONENT",
            RcError::GameOver => "GAME_OVER",
            RcError::CellOccupied => "CELL_OCCUPIED",
            RcError::NotYourTurn => "NOT_YOUR_TURN",
            RcError::InvalidMove(_) => "INVALID_MOVE",
            RcError::InvalidMessage(_) => "INVALID_MESSAGE",
            RcError::AlreadyInRoom => "ALREADY_IN_ROOM",
            RcError::CapacityExceeded => "CAPACITY_EXCEEDED",
            RcError::Draining => "DRAINING",
            RcError::InvalidBoard => "INVALID_BOARD",
            RcError::PlayerNotFound => "PLAYER_NOT_FOUND",
            RcError::RoomIdExhausted { .. } | RcError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns a client-safe error message (no internal details).
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            RcError::RoomNotFound(_) => "Room not found".to_string(),
            RcError::InvalidMove(_) => "Invalid move".to_string(),
            RcError::InvalidMessage(_) => "Invalid message".to_string(),
            RcError::CapacityExceeded => "Server is at capacity, please try again".to_string(),
            RcError::Draining => "Server is shutting down".to_string(),
            RcError::RoomIdExhausted { .. } | RcError::Internal(_) => {
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            RcError::RoomNotFound(_) | RcError::PlayerNotFound => StatusCode::NOT_FOUND,
            RcError::RoomFull
            | RcError::AlreadyInRoom
            | RcError::CellOccupied
            | RcError::NotYourTurn
            | RcError::GameOver
            | RcError::WaitingForOpponent => StatusCode::CONFLICT,
            RcError::NotInRoom => StatusCode::FORBIDDEN,
            RcError::InvalidMove(_) | RcError::InvalidMessage(_) | RcError::InvalidBoard => {
                StatusCode::BAD_REQUEST
            }
            RcError::CapacityExceeded | RcError::Draining => StatusCode::SERVICE_UNAVAILABLE,
            RcError::RoomIdExhausted { .. } | RcError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

impl IntoResponse for RcError {
    fn into_response(self) -> Response {
        if let RcError::Internal(detail) = &self {
            tracing::error!(target: "rc.errors", error = %detail, "Internal error");
        }

        let body = ErrorResponse {
            error: self.client_message(),
            code: self.error_code(),
        };

        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        assert_eq!(
            RcError::RoomNotFound("abc123".to_string()).error_code(),
            "ROOM_NOT_FOUND"
        );
        assert_eq!(RcError::RoomFull.error_code(), "ROOM_FULL");
        assert_eq!(RcError::NotInRoom.error_code(), "NOT_IN_ROOM");
        assert_eq!(
            RcError::WaitingForOpponent.error_code(),
            "WAITING_FOR_OPPONENT"
        );
        assert_eq!(RcError::CellOccupied.error_code(), "CELL_OCCUPIED");
        assert_eq!(RcError::NotYourTurn.error_code(), "NOT_YOUR_TURN");
        assert_eq!(
            RcError::RoomIdExhausted { attempts: 8 }.error_code(),
            "INTERNAL_ERROR"
        );
        assert_eq!(
            RcError::Internal("channel closed".to_string()).error_code(),
            "INTERNAL_ERROR"
        );
    }

    #[test]
    fn test_client_messages_match_protocol_wording() {
        assert_eq!(
            RcError::RoomNotFound("abc123".to_string()).client_message(),
            "Room not found"
        );
        assert_eq!(RcError::RoomFull.client_message(), "Room full");
        assert_eq!(RcError::NotInRoom.client_message(), "Not in room");
        assert_eq!(
            RcError::WaitingForOpponent.client_message(),
            "Waiting for opponent"
        );
        assert_eq!(RcError::CellOccupied.client_message(), "Cell occupied");
        assert_eq!(RcError::NotYourTurn.client_message(), "Not your turn");
        assert_eq!(RcError::InvalidBoard.client_message(), "Invalid board");
        assert_eq!(RcError::PlayerNotFound.client_message(), "Player not found");
    }

    #[test]
    fn test_client_messages_hide_internal_details() {
        let err = RcError::Internal("receiver dropped at room ab12cd".to_string());
        assert!(!err.client_message().contains("ab12cd"));
        assert_eq!(err.client_message(), "An internal error occurred");

        let err = RcError::InvalidMessage("expected value at line 1 column 1".to_string());
        assert_eq!(err.client_message(), "Invalid message");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            RcError::RoomNotFound(String::new()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(RcError::PlayerNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(RcError::InvalidBoard.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            RcError::Draining.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            RcError::Internal(String::new()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_display_formatting() {
        assert_eq!(
            format!("{}", RcError::RoomNotFound("zz9".to_string())),
            "Room not found: zz9"
        );
        assert_eq!(
            format!("{}", RcError::RoomIdExhausted { attempts: 3 }),
            "Room id allocation exhausted after 3 attempts"
        );
    }
}
