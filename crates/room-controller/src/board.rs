//! Pure board logic for the 3x3 grid.
//!
//! Nothing in this module holds state beyond the `Board` value itself; every
//! function returns the same answer for the same board.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of cells on the board.
pub const CELL_COUNT: usize = 9;

/// The eight canonical winning lines: 3 rows, 3 columns, 2 diagonals.
pub const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// One of the two exclusive symbols. The first room member plays `X`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    /// The other symbol.
    #[must_use]
    pub const fn opponent(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Mark::X => "X",
            Mark::O => "O",
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mark {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "X" => Ok(Mark::X),
            "O" => Ok(Mark::O),
            other => Err(format!("unknown mark: {other}")),
        }
    }
}

/// Terminal result of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    Winner(Mark),
    Draw,
}

/// Nine cells, each empty or holding one mark.
///
/// Serializes as a JSON array of nine `"X"`, `"O"` or `null` values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    cells: [Option<Mark>; CELL_COUNT],
}

impl Board {
    /// An empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_cells(cells: [Option<Mark>; CELL_COUNT]) -> Self {
        Self { cells }
    }

    #[must_use]
    pub fn cells(&self) -> &[Option<Mark>; CELL_COUNT] {
        &self.cells
    }

    /// Mark at `index`, `None` if empty or out of range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Mark> {
        self.cells.get(index).copied().flatten()
    }

    #[must_use]
    pub fn is_occupied(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Index of the first empty cell.
    #[must_use]
    pub fn first_empty(&self) -> Option<usize> {
        self.cells.iter().position(Option::is_none)
    }

    /// Write `mark` into an empty, in-range cell.
    ///
    /// Returns `false` without touching the board if the cell is out of range
    /// or already occupied; a written cell never changes.
    pub fn place(&mut self, index: usize, mark: Mark) -> bool {
        match self.cells.get_mut(index) {
            Some(cell @ None) => {
                *cell = Some(mark);
                true
            }
            _ => false,
        }
    }
}

/// The mark that owns a complete line, if any.
#[must_use]
pub fn winner(board: &Board) -> Option<Mark> {
    WINNING_LINES.iter().find_map(|[a, b, c]| {
        let first = board.get(*a)?;
        (board.get(*b) == Some(first) && board.get(*c) == Some(first)).then_some(first)
    })
}

/// True iff every cell is occupied and nobody has won.
#[must_use]
pub fn is_draw(board: &Board) -> bool {
    board.is_full() && winner(board).is_none()
}

/// Terminal result, if the game is decided.
#[must_use]
pub fn outcome(board: &Board) -> Option<GameResult> {
    if let Some(mark) = winner(board) {
        Some(GameResult::Winner(mark))
    } else if is_draw(board) {
        Some(GameResult::Draw)
    } else {
        None
    }
}

/// True iff `index` is on the board, the cell is empty, and the game is not decided.
#[must_use]
pub fn is_legal(board: &Board, index: usize) -> bool {
    index < CELL_COUNT && !board.is_occupied(index) && outcome(board).is_none()
}
