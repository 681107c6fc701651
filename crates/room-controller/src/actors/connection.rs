//! Outbound handle for one WebSocket session.
//!
//! A room holds one `ConnectionHandle` per member and pushes [`RoomEvent`]s
//! into it. Delivery never waits: the queue is bounded and a full queue drops
//! the event, so one slow client cannot stall its room.

use super::messages::RoomEvent;
use super::metrics::ActorMetrics;

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

/// Default capacity of a session's outbound event queue.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 64;

/// Sending half of a session's outbound event queue.
#[derive(Clone, Debug)]
pub struct ConnectionHandle {
    connection_id: String,
    sender: mpsc::Sender<RoomEvent>,
    metrics: Arc<ActorMetrics>,
}

impl ConnectionHandle {
    /// Create a handle and the receiver the session drains.
    #[must_use]
    pub fn channel(
        connection_id: impl Into<String>,
        capacity: usize,
        metrics: Arc<ActorMetrics>,
    ) -> (Self, mpsc::Receiver<RoomEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let handle = Self {
            connection_id: connection_id.into(),
            sender,
            metrics,
        };
        (handle, receiver)
    }

    #[must_use]
    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    /// Queue an event for the client. Returns `false` if it was not queued.
    pub fn deliver(&self, event: RoomEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                self.metrics.record_event_dropped();
                warn!(
                    target: "rc.actor.connection",
                    connection_id = %self.connection_id,
                    event = ?event,
                    "Outbound queue full, event dropped"
                );
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(
                    target: "rc.actor.connection",
                    connection_id = %self.connection_id,
                    "Outbound queue closed, session gone"
                );
                false
            }
        }
    }

    /// True once the session dropped its receiver.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
