//! Message types for actor communication.
//!
//! All inter-actor communication uses strongly-typed message passing via `tokio::sync::mpsc`.
//! Response patterns use `tokio::sync::oneshot` for request-reply semantics.

use crate::board::{Board, GameResult, Mark};
use crate::errors::RcError;
use crate::room::RoomView;

use super::connection::ConnectionHandle;
use super::room::RoomActorHandle;
use tokio::sync::oneshot;

/// Messages sent to `RoomRegistryActor`.
#[derive(Debug)]
pub enum RegistryMessage {
    /// Allocate an id and spawn a room with `creator` seated as `X`.
    CreateRoom {
        creator: ConnectionHandle,
        respond_to: oneshot::Sender<Result<CreatedRoom, RcError>>,
    },

    /// Look up a live room.
    GetRoom {
        room_id: String,
        respond_to: oneshot::Sender<Result<RoomActorHandle, RcError>>,
    },

    /// Cancel and forget a room. Absent ids are a no-op (`false`).
    RemoveRoom {
        room_id: String,
        respond_to: oneshot::Sender<bool>,
    },

    /// Current registry status (for health checks).
    GetStatus {
        respond_to: oneshot::Sender<RegistryStatus>,
    },

    /// Stop accepting rooms and cancel all room actors.
    Shutdown {
        respond_to: oneshot::Sender<Result<(), RcError>>,
    },
}

/// Messages sent to `RoomActor`.
#[derive(Debug)]
pub enum RoomMessage {
    /// Seat a new member.
    Join {
        member: ConnectionHandle,
        respond_to: oneshot::Sender<Result<Mark, RcError>>,
    },

    /// Validate and apply a move from a member.
    ApplyMove {
        connection_id: String,
        index: usize,
        respond_to: oneshot::Sender<Result<(), RcError>>,
    },

    /// Detach a member. Replies with the number of members left.
    Leave {
        connection_id: String,
        respond_to: oneshot::Sender<Result<usize, RcError>>,
    },

    /// One countdown unit elapsed on the timer with this generation.
    TimerTick { generation: u64 },

    /// Snapshot of the room (for debugging/tests).
    GetState {
        respond_to: oneshot::Sender<RoomView>,
    },
}

/// Events a room pushes to each member's outbound queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    /// Board or turn changed.
    StateChanged { board: Board, turn: Mark },
    /// Countdown progressed.
    Tick { remaining: u32 },
    /// Game finished.
    GameOver(GameResult),
    /// The other member left the room.
    MemberLeft,
}

// ----------------------------------------------------------------------------
// Supporting Types
// ----------------------------------------------------------------------------

/// Result of a successful `CreateRoom`.
#[derive(Debug, Clone)]
pub struct CreatedRoom {
    pub room_id: String,
    pub mark: Mark,
    pub handle: RoomActorHandle,
}

/// Status of the `RoomRegistryActor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStatus {
    pub room_count: usize,
    pub connection_count: usize,
    pub is_draining: bool,
    pub mailbox_depth: usize,
}
