//! WebSocket gateway.
//!
//! - [`protocol`] - JSON frames exchanged over `/ws`
//! - [`session`] - Per-connection dispatch and the upgrade handler

pub mod protocol;
pub mod session;

pub use protocol::{parse_frame, AckResult, ClientFrame, ClientRequest, ServerMessage};
pub use session::{ws_handler, Session};
