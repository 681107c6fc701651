//! Move suggestion handler.
//!
//! - `POST /api/ai/move` - suggest a cell for the computer player
//!
//! The body is read as raw JSON so every malformed board answers with the same
//! `400 Invalid board`, whatever shape the client sent.

use crate::ai::suggest_move;
use crate::board::{Board, Mark, CELL_COUNT};
use crate::errors::RcError;
use axum::body::Bytes;
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct AiMoveResponse {
    /// Suggested cell; `null` when the board is full.
    #[serde(rename = "move")]
    pub index: Option<usize>,
}

/// Handler for POST /api/ai/move
///
/// # Request
///
/// ```json
/// { "board": [null, "X", "", "O", null, null, null, null, null], "aiMark": "O", "humanMark": "X" }
/// ```
///
/// # Response
///
/// - 200 OK: `{"move": 4}` or `{"move": null}`
/// - 400 Bad Request: board is not 9 valid cells, or the marks are unusable
#[instrument(skip_all, name = "rc.api.ai_move")]
pub async fn ai_move(body: Bytes) -> Result<Json<AiMoveResponse>, RcError> {
    let request: Value = serde_json::from_slice(&body).map_err(|e| {
        debug!(target: "rc.api", error = %e, "AI move body is not JSON");
        RcError::InvalidBoard
    })?;

    let board = parse_board(request.get("board"))?;
    let ai = parse_mark(request.get("aiMark"), Mark::O)?;
    let human = parse_mark(request.get("humanMark"), Mark::X)?;
    if ai == human {
        return Err(RcError::InvalidMessage(
            "aiMark and humanMark must differ".to_string(),
        ));
    }

    Ok(Json(AiMoveResponse {
        index: suggest_move(&board, ai, human),
    }))
}

fn parse_board(value: Option<&Value>) -> Result<Board, RcError> {
    let cells = value
        .and_then(Value::as_array)
        .filter(|cells| cells.len() == CELL_COUNT)
        .ok_or(RcError::InvalidBoard)?;

    let mut board = Board::new();
    for (index, cell) in cells.iter().enumerate() {
        match cell {
            Value::Null => {}
            Value::String(s) if s.is_empty() => {}
            Value::String(s) => {
                let mark: Mark = s.parse().map_err(|_| RcError::InvalidBoard)?;
                board.place(index, mark);
            }
            _ => return Err(RcError::InvalidBoard),
        }
    }
    Ok(board)
}

fn parse_mark(value: Option<&Value>, default: Mark) -> Result<Mark, RcError> {
    match value {
        None | Some(Value::Null) => Ok(default),
        Some(Value::String(s)) => s.parse::<Mark>().map_err(RcError::InvalidMessage),
        Some(other) => Err(RcError::InvalidMessage(format!("unknown mark: {other}"))),
    }
}
