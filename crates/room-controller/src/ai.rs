//! Move suggestion for single-player mode.
//!
//! Strategy: complete a line for the AI, else block the human's line,
//! else take the first empty cell.

use crate::board::{Board, Mark, WINNING_LINES};

/// Suggest a cell for `ai` to play, or `None` when the board is full.
#[must_use]
pub fn suggest_move(board: &Board, ai: Mark, human: Mark) -> Option<usize> {
    completing_cell(board, ai)
        .or_else(|| completing_cell(board, human))
        .or_else(|| board.first_empty())
}

/// First empty cell of a line where `mark` already holds the other two.
fn completing_cell(board: &Board, mark: Mark) -> Option<usize> {
    WINNING_LINES.iter().find_map(|line| {
        let held = line.iter().filter(|&&i| board.get(i) == Some(mark)).count();
        let empty = line.iter().copied().find(|&i| !board.is_occupied(i));
        if held == 2 {
            empty
        } else {
            None
        }
    })
}
