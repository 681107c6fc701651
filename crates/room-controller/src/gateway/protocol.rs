//! JSON wire protocol for `/ws`.
//!
//! Every frame is a JSON object with an `event` discriminator.
//!
//! Client → server (each carries a client-chosen `ack` number):
//!
//! ```text
//! {"event":"room:create","ack":1}
//! {"event":"room:join","ack":2,"roomId":"ab12cd"}
//! {"event":"game:move","ack":3,"roomId":"ab12cd","index":4}
//! {"event":"room:leave","ack":4}
//! ```
//!
//! Server → client:
//!
//! ```text
//! {"event":"ack","ack":2,"result":{"roomId":"ab12cd","mark":"O"}}
//! {"event":"ack","ack":3,"result":{"ok":true}}
//! {"event":"ack","ack":3,"result":{"error":"Not your turn","code":"NOT_YOUR_TURN"}}
//! {"event":"room:state","board":["X",null,...],"turn":"O"}
//! {"event":"room:tick","remaining":29}
//! {"event":"room:game_over","winner":"X"}   or   {"event":"room:game_over","draw":true}
//! {"event":"room:player_left"}
//! ```

use crate::actors::RoomEvent;
use crate::board::{Board, GameResult, Mark};
use crate::errors::RcError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A request a client can make.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event")]
pub enum ClientRequest {
    #[serde(rename = "room:create")]
    CreateRoom {},

    #[serde(rename = "room:join")]
    JoinRoom {
        #[serde(rename = "roomId")]
        room_id: String,
    },

    /// `index` is signed so that negative values reach move validation
    /// instead of failing as malformed JSON.
    #[serde(rename = "game:move")]
    Move {
        #[serde(rename = "roomId")]
        room_id: String,
        index: i64,
    },

    #[serde(rename = "room:leave")]
    LeaveRoom {},
}

impl ClientRequest {
    /// Event name, for logs and metric labels.
    #[must_use]
    pub fn event_name(&self) -> &'static str {
        match self {
            ClientRequest::CreateRoom {} => "room:create",
            ClientRequest::JoinRoom { .. } => "room:join",
            ClientRequest::Move { .. } => "game:move",
            ClientRequest::LeaveRoom {} => "room:leave",
        }
    }
}

/// One parsed inbound frame.
///
/// The ack number is recovered even when the request itself is malformed,
/// so the error can still be correlated by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientFrame {
    pub ack: Option<u64>,
    pub request: Result<ClientRequest, RcError>,
}

/// Parse a text frame.
#[must_use]
pub fn parse_frame(text: &str) -> ClientFrame {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            return ClientFrame {
                ack: None,
                request: Err(RcError::InvalidMessage(e.to_string())),
            }
        }
    };

    let ack = value.get("ack").and_then(Value::as_u64);
    let request =
        serde_json::from_value(value).map_err(|e| RcError::InvalidMessage(e.to_string()));

    ClientFrame { ack, request }
}

/// Payload of an acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AckResult {
    Joined {
        #[serde(rename = "roomId")]
        room_id: String,
        mark: Mark,
    },
    Ok {
        ok: bool,
    },
    Error {
        error: String,
        code: &'static str,
    },
}

impl AckResult {
    #[must_use]
    pub fn ok() -> Self {
        AckResult::Ok { ok: true }
    }
}

impl From<&RcError> for AckResult {
    fn from(err: &RcError) -> Self {
        AckResult::Error {
            error: err.client_message(),
            code: err.error_code(),
        }
    }
}

impl From<Result<AckResult, RcError>> for AckResult {
    fn from(result: Result<AckResult, RcError>) -> Self {
        match result {
            Ok(ack) => ack,
            Err(err) => AckResult::from(&err),
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A frame sent to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event")]
pub enum ServerMessage {
    #[serde(rename = "ack")]
    Ack {
        #[serde(skip_serializing_if = "Option::is_none")]
        ack: Option<u64>,
        result: AckResult,
    },

    #[serde(rename = "room:state")]
    State { board: Board, turn: Mark },

    #[serde(rename = "room:tick")]
    Tick { remaining: u32 },

    #[serde(rename = "room:game_over")]
    GameOver {
        #[serde(skip_serializing_if = "Option::is_none")]
        winner: Option<Mark>,
        #[serde(skip_serializing_if = "is_false")]
        draw: bool,
    },

    #[serde(rename = "room:player_left")]
    PlayerLeft {},
}

impl From<RoomEvent> for ServerMessage {
    fn from(event: RoomEvent) -> Self {
        match event {
            RoomEvent::StateChanged { board, turn } => ServerMessage::State { board, turn },
            RoomEvent::Tick { remaining } => ServerMessage::Tick { remaining },
            RoomEvent::GameOver(GameResult::Winner(mark)) => ServerMessage::GameOver {
                winner: Some(mark),
                draw: false,
            },
            RoomEvent::GameOver(GameResult::Draw) => ServerMessage::GameOver {
                winner: None,
                draw: true,
            },
            RoomEvent::MemberLeft => ServerMessage::PlayerLeft {},
        }
    }
}
