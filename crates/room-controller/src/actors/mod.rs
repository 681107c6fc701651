//! Actor model implementation for the Room Controller.
//!
//! ```text
//! RoomRegistryActor (singleton per RC instance)
//! └── supervises N RoomActors
//!     └── RoomActor (one per live room)
//!         ├── owns the Room state machine
//!         ├── owns at most one TurnTimer task
//!         └── pushes RoomEvents into its members' ConnectionHandles
//! ```
//!
//! # Key Design Decisions
//!
//! - **One room per connection**: a session binds to at most one room
//! - **CancellationToken propagation**: registry root → room → timer
//! - **Generation-tagged ticks**: a tick from a replaced timer is ignored
//! - **Non-blocking broadcast**: bounded outbound queues, full queue drops
//!
//! # Modules
//!
//! - [`registry`] - `RoomRegistryActor`, owner of room lifetimes and ids
//! - [`room`] - `RoomActor`, one per room
//! - [`timer`] - `TurnTimer`, the per-room countdown task
//! - [`connection`] - `ConnectionHandle`, a session's outbound queue
//! - [`messages`] - Message types for actor communication
//! - [`metrics`] - Mailbox monitoring and actor metrics

pub mod connection;
pub mod messages;
pub mod metrics;
pub mod registry;
pub mod room;
pub mod timer;

pub use connection::{ConnectionHandle, OUTBOUND_QUEUE_CAPACITY};
pub use messages::*;
pub use metrics::{ActorMetrics, ActorType, MailboxMonitor};
pub use registry::{RegistrySettings, RoomRegistryHandle};
pub use room::{RoomActor, RoomActorHandle, RoomSettings};
pub use timer::TurnTimer;
