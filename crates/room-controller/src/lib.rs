//! Room Controller (RC) Service Library
//!
//! This library provides the core functionality for the Gridduel Room
//! Controller - a stateful WebSocket coordinator responsible for:
//!
//! - Two-player room lifecycle (create, join, leave, delete)
//! - Server-authoritative move validation and win/draw detection
//! - Per-room turn countdowns with forced pass on expiry
//! - Broadcasting room state to members and cleanup on disconnect
//! - A small HTTP surface (move suggestion, player settings, health, metrics)
//!
//! # Architecture
//!
//! The RC uses an actor model hierarchy:
//!
//! ```text
//! RoomRegistryActor (singleton per RC instance)
//! └── supervises N RoomActors
//!     └── RoomActor (one per live room)
//!         ├── owns room state (board, marks, turn, countdown)
//!         ├── owns at most one TurnTimer task
//!         └── broadcasts to ConnectionHandles of its members
//! ```
//!
//! Each WebSocket connection is driven by a gateway `Session` that holds
//! at most one room binding and forwards room broadcasts to its socket.
//!
//! # Modules
//!
//! - [`board`] - Pure board logic (winning lines, draw, legality)
//! - [`room`] - Synchronous room state machine
//! - [`actors`] - Registry, room, timer and connection actors
//! - [`gateway`] - WebSocket session protocol and dispatch
//! - [`handlers`] / [`routes`] - HTTP endpoints
//! - [`config`] - Service configuration from environment
//! - [`errors`] - Error types with client-facing codes

pub mod actors;
pub mod ai;
pub mod board;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod handlers;
pub mod observability;
pub mod room;
pub mod routes;
pub mod settings;
