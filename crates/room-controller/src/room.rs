//! Room state machine.
//!
//! A `Room` is the state of one game session: membership, marks, board,
//! turn, countdown and the terminal flag. It performs no I/O; every mutation
//! returns an outcome describing what changed plus a [`TimerDirective`] that
//! the owning `RoomActor` applies to its turn timer.
//!
//! # Phases
//!
//! ```text
//! WaitingForOpponent --join--> Active --move (win/draw)--> GameOver
//!         ^                      |  ^                          |
//!         +------remove----------+  +--move / tick (loop)      |
//!   any phase --remove (last member)--> Destroyed  <-----------+
//! ```

use crate::board::{self, Board, GameResult, Mark, CELL_COUNT};
use crate::errors::RcError;
use std::collections::HashMap;

/// Maximum members per room.
pub const MAX_MEMBERS: usize = 2;

/// Default countdown length in ticks.
pub const DEFAULT_TURN_DURATION: u32 = 30;

/// Observable phase of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomPhase {
    /// One member, no timer.
    WaitingForOpponent,
    /// Two members, timer running.
    Active,
    /// Winner or draw determined; absorbing until deletion.
    GameOver,
    /// Last member left; awaiting registry deletion.
    Destroyed,
}

/// What the owning actor must do with the turn timer after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerDirective {
    /// Cancel any running countdown and start a fresh one.
    Restart,
    /// Cancel any running countdown.
    Stop,
    /// Leave the timer as it is.
    Keep,
}

/// Result of a successful join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinOutcome {
    pub mark: Mark,
    pub member_count: usize,
    pub timer: TimerDirective,
}

/// Result of an accepted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Game continues; `turn` is the next mover.
    Continue { board: Board, turn: Mark },
    /// Game ended with this move.
    Finished { board: Board, result: GameResult },
}

impl MoveOutcome {
    #[must_use]
    pub fn timer(&self) -> TimerDirective {
        match self {
            MoveOutcome::Continue { .. } => TimerDirective::Restart,
            MoveOutcome::Finished { .. } => TimerDirective::Stop,
        }
    }
}

/// Result of removing a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveOutcome {
    pub mark: Mark,
    pub remaining_members: usize,
    pub timer: TimerDirective,
}

/// Result of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Room is not active; nothing changed.
    Idle,
    /// Countdown decremented.
    Countdown { remaining: u32 },
    /// Countdown reached zero: turn passed to `turn` and the countdown was reset.
    ForcedPass { board: Board, turn: Mark },
}

/// Point-in-time view of a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomView {
    pub room_id: String,
    pub phase: RoomPhase,
    pub members: Vec<String>,
    pub board: Board,
    pub turn: Mark,
    pub remaining: u32,
    pub over: bool,
}

/// State of one game session.
#[derive(Debug)]
pub struct Room {
    id: String,
    members: Vec<String>,
    marks: HashMap<String, Mark>,
    board: Board,
    turn: Mark,
    remaining: u32,
    turn_duration: u32,
    over: bool,
    destroyed: bool,
}

impl Room {
    /// Create a room with `creator` as its first member holding `X`.
    #[must_use]
    pub fn new(id: impl Into<String>, creator: impl Into<String>, turn_duration: u32) -> Self {
        let creator = creator.into();
        let turn_duration = turn_duration.max(1);
        Self {
            id: id.into(),
            members: vec![creator.clone()],
            marks: HashMap::from([(creator, Mark::X)]),
            board: Board::new(),
            turn: Mark::X,
            remaining: turn_duration,
            turn_duration,
            over: false,
            destroyed: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn turn(&self) -> Mark {
        self.turn
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.over
    }

    #[must_use]
    pub fn members(&self) -> &[String] {
        &self.members
    }

    #[must_use]
    pub fn mark_of(&self, connection_id: &str) -> Option<Mark> {
        self.marks.get(connection_id).copied()
    }

    #[must_use]
    pub fn phase(&self) -> RoomPhase {
        if self.destroyed {
            RoomPhase::Destroyed
        } else if self.over {
            RoomPhase::GameOver
        } else if self.members.len() == MAX_MEMBERS {
            RoomPhase::Active
        } else {
            RoomPhase::WaitingForOpponent
        }
    }

    /// True when a turn timer is allowed to run.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase() == RoomPhase::Active
    }

    #[must_use]
    pub fn view(&self) -> RoomView {
        RoomView {
            room_id: self.id.clone(),
            phase: self.phase(),
            members: self.members.clone(),
            board: self.board,
            turn: self.turn,
            remaining: self.remaining,
            over: self.over,
        }
    }

    /// Seat a new member with whichever mark is free.
    pub fn join(&mut self, connection_id: &str) -> Result<JoinOutcome, RcError> {
        if self.destroyed {
            return Err(RcError::RoomNotFound(self.id.clone()));
        }
        if self.marks.contains_key(connection_id) {
            return Err(RcError::AlreadyInRoom);
        }
        if self.members.len() >= MAX_MEMBERS {
            return Err(RcError::RoomFull);
        }

        let mark = if self.marks.values().any(|m| *m == Mark::X) {
            Mark::O
        } else {
            Mark::X
        };

        self.members.push(connection_id.to_string());
        self.marks.insert(connection_id.to_string(), mark);

        let timer = if self.is_active() {
            self.remaining = self.turn_duration;
            TimerDirective::Restart
        } else {
            TimerDirective::Keep
        };

        Ok(JoinOutcome {
            mark,
            member_count: self.members.len(),
            timer,
        })
    }

    /// Validate and apply a move as one atomic step.
    pub fn apply_move(&mut self, connection_id: &str, index: usize) -> Result<MoveOutcome, RcError> {
        let mark = self.mark_of(connection_id).ok_or(RcError::NotInRoom)?;
        if self.members.len() < MAX_MEMBERS {
            return Err(RcError::WaitingForOpponent);
        }
        if self.over {
            return Err(RcError::GameOver);
        }
        if index >= CELL_COUNT {
            return Err(RcError::InvalidMove(format!(
                "index {index} outside 0..{CELL_COUNT}"
            )));
        }
        if self.board.is_occupied(index) {
            return Err(RcError::CellOccupied);
        }
        if self.turn != mark {
            return Err(RcError::NotYourTurn);
        }
        if !self.board.place(index, mark) {
            return Err(RcError::CellOccupied);
        }

        if let Some(result) = board::outcome(&self.board) {
            self.over = true;
            return Ok(MoveOutcome::Finished {
                board: self.board,
                result,
            });
        }

        self.turn = mark.opponent();
        self.remaining = self.turn_duration;
        Ok(MoveOutcome::Continue {
            board: self.board,
            turn: self.turn,
        })
    }

    /// Detach a member and its mark.
    pub fn remove(&mut self, connection_id: &str) -> Result<RemoveOutcome, RcError> {
        let mark = self.marks.remove(connection_id).ok_or(RcError::NotInRoom)?;
        self.members.retain(|m| m != connection_id);

        if self.members.is_empty() {
            self.destroyed = true;
        }

        Ok(RemoveOutcome {
            mark,
            remaining_members: self.members.len(),
            timer: TimerDirective::Stop,
        })
    }

    /// Advance the countdown by one unit.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_active() {
            return TickOutcome::Idle;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return TickOutcome::Countdown {
                remaining: self.remaining,
            };
        }

        self.turn = self.turn.opponent();
        self.remaining = self.turn_duration;
        TickOutcome::ForcedPass {
            board: self.board,
            turn: self.turn,
        }
    }
}
