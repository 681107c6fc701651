//! One WebSocket connection.
//!
//! A `Session` owns the connection's identity, its outbound queue and at most
//! one room binding. Request dispatch lives on `Session` so it can be driven
//! without a socket; [`ws_handler`] wires it to an upgraded connection.

use super::protocol::{parse_frame, AckResult, ClientRequest, ServerMessage};
use crate::actors::{
    ActorMetrics, ConnectionHandle, RoomActorHandle, RoomEvent, RoomRegistryHandle,
    OUTBOUND_QUEUE_CAPACITY,
};
use crate::board::Mark;
use crate::errors::RcError;
use crate::observability::metrics;
use crate::routes::AppState;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

/// Room a session is seated in.
#[derive(Debug, Clone)]
struct RoomBinding {
    room_id: String,
    mark: Mark,
    handle: RoomActorHandle,
}

/// Per-connection request state.
pub struct Session {
    connection_id: String,
    registry: RoomRegistryHandle,
    outbound: ConnectionHandle,
    binding: Option<RoomBinding>,
}

impl Session {
    /// Create a session with a fresh connection id.
    ///
    /// The returned receiver yields every room event addressed to this
    /// connection.
    #[must_use]
    pub fn new(
        registry: RoomRegistryHandle,
        metrics: Arc<ActorMetrics>,
    ) -> (Self, mpsc::Receiver<RoomEvent>) {
        Self::with_connection_id(uuid::Uuid::new_v4().to_string(), registry, metrics)
    }

    #[must_use]
    pub fn with_connection_id(
        connection_id: String,
        registry: RoomRegistryHandle,
        metrics: Arc<ActorMetrics>,
    ) -> (Self, mpsc::Receiver<RoomEvent>) {
        let (outbound, events) =
            ConnectionHandle::channel(connection_id.clone(), OUTBOUND_QUEUE_CAPACITY, metrics);
        let session = Self {
            connection_id,
            registry,
            outbound,
            binding: None,
        };
        (session, events)
    }

    #[must_use]
    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    /// Room this session is seated in, if any.
    #[must_use]
    pub fn room_id(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.room_id.as_str())
    }

    #[must_use]
    pub fn mark(&self) -> Option<Mark> {
        self.binding.as_ref().map(|b| b.mark)
    }

    /// Parse and dispatch one text frame, returning its acknowledgment.
    pub async fn handle_text(&mut self, text: &str) -> ServerMessage {
        let frame = parse_frame(text);
        let result = match frame.request {
            Ok(request) => {
                let event = request.event_name();
                let start = Instant::now();
                let result = self.handle_request(request).await;
                metrics::record_request_duration(event, start.elapsed());
                result
            }
            Err(err) => {
                debug!(
                    target: "rc.gateway",
                    connection_id = %self.connection_id,
                    error = %err,
                    "Rejected malformed frame"
                );
                Err(err)
            }
        };

        ServerMessage::Ack {
            ack: frame.ack,
            result: AckResult::from(result),
        }
    }

    /// Dispatch a parsed request.
    pub async fn handle_request(&mut self, request: ClientRequest) -> Result<AckResult, RcError> {
        match request {
            ClientRequest::CreateRoom {} => self.create_room().await,
            ClientRequest::JoinRoom { room_id } => self.join_room(room_id).await,
            ClientRequest::Move { room_id, index } => {
                self.make_move(room_id, index).await?;
                Ok(AckResult::ok())
            }
            ClientRequest::LeaveRoom {} => {
                self.leave_room().await?;
                Ok(AckResult::ok())
            }
        }
    }

    async fn create_room(&mut self) -> Result<AckResult, RcError> {
        if self.binding.is_some() {
            return Err(RcError::AlreadyInRoom);
        }

        let created = self.registry.create_room(self.outbound.clone()).await?;

        info!(
            target: "rc.gateway",
            connection_id = %self.connection_id,
            room_id = %created.room_id,
            "Room created"
        );

        self.binding = Some(RoomBinding {
            room_id: created.room_id.clone(),
            mark: created.mark,
            handle: created.handle,
        });

        Ok(AckResult::Joined {
            room_id: created.room_id,
            mark: created.mark,
        })
    }

    async fn join_room(&mut self, room_id: String) -> Result<AckResult, RcError> {
        if self.binding.is_some() {
            return Err(RcError::AlreadyInRoom);
        }

        let handle = self.registry.get_room(room_id.clone()).await?;
        let mark = handle.join(self.outbound.clone()).await?;

        info!(
            target: "rc.gateway",
            connection_id = %self.connection_id,
            room_id = %room_id,
            mark = %mark,
            "Joined room"
        );

        self.binding = Some(RoomBinding {
            room_id: room_id.clone(),
            mark,
            handle,
        });

        Ok(AckResult::Joined { room_id, mark })
    }

    async fn make_move(&mut self, room_id: String, index: i64) -> Result<(), RcError> {
        let index = usize::try_from(index)
            .map_err(|_| RcError::InvalidMove(format!("index {index} is negative")))?;

        // A move may name a room this session is not seated in; the room
        // itself then rejects it as NotInRoom.
        let handle = match &self.binding {
            Some(binding) if binding.room_id == room_id => binding.handle.clone(),
            _ => self.registry.get_room(room_id).await?,
        };

        handle.apply_move(self.connection_id.clone(), index).await
    }

    /// Leave the bound room, deleting it once empty.
    pub async fn leave_room(&mut self) -> Result<(), RcError> {
        let binding = self.binding.take().ok_or(RcError::NotInRoom)?;

        let remaining = match binding.handle.leave(self.connection_id.clone()).await {
            Ok(remaining) => remaining,
            Err(e) => {
                // The room is already gone; nothing left to clean up.
                debug!(
                    target: "rc.gateway",
                    connection_id = %self.connection_id,
                    room_id = %binding.room_id,
                    error = %e,
                    "Room unavailable on leave"
                );
                return Ok(());
            }
        };

        info!(
            target: "rc.gateway",
            connection_id = %self.connection_id,
            room_id = %binding.room_id,
            remaining,
            "Left room"
        );

        if remaining == 0 {
            self.registry.remove_room(binding.room_id).await?;
        }

        Ok(())
    }

    /// Release everything held by this connection.
    pub async fn close(&mut self) {
        if self.binding.is_none() {
            return;
        }
        if let Err(e) = self.leave_room().await {
            warn!(
                target: "rc.gateway",
                connection_id = %self.connection_id,
                error = %e,
                "Cleanup on disconnect failed"
            );
        }
    }
}

/// `GET /ws` upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| run_session(socket, state))
}

async fn run_session(socket: WebSocket, state: Arc<AppState>) {
    let (session, events) = Session::new(state.registry.clone(), Arc::clone(&state.metrics));
    state.metrics.connection_opened();

    drive(socket, session, events).await;

    state.metrics.connection_closed();
}

#[instrument(skip_all, name = "rc.gateway.session", fields(connection_id = %session.connection_id))]
async fn drive(socket: WebSocket, mut session: Session, mut events: mpsc::Receiver<RoomEvent>) {
    let (mut sink, mut stream) = socket.split();

    info!(target: "rc.gateway", "Client connected");

    loop {
        tokio::select! {
            frame = stream.next() => {
                let reply = match frame {
                    Some(Ok(Message::Text(text))) => session.handle_text(&text).await,
                    Some(Ok(Message::Binary(_))) => ServerMessage::Ack {
                        ack: None,
                        result: AckResult::from(&RcError::InvalidMessage(
                            "binary frames are not supported".to_string(),
                        )),
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        debug!(target: "rc.gateway", error = %e, "Socket read failed");
                        break;
                    }
                };
                if send_message(&mut sink, &reply).await.is_err() {
                    break;
                }
            }

            Some(event) = events.recv() => {
                if send_message(&mut sink, &ServerMessage::from(event)).await.is_err() {
                    break;
                }
            }
        }
    }

    session.close().await;

    info!(target: "rc.gateway", "Client disconnected");
}

async fn send_message(
    sink: &mut SplitSink<WebSocket, Message>,
    message: &ServerMessage,
) -> Result<(), axum::Error> {
    let text = match serde_json::to_string(message) {
        Ok(text) => text,
        Err(e) => {
            error!(target: "rc.gateway", error = %e, "Failed to encode server message");
            return Ok(());
        }
    };

    sink.send(Message::Text(text)).await.map_err(|e| {
        debug!(target: "rc.gateway", error = %e, "Socket write failed");
        e
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::actors::RegistrySettings;
    use std::time::Duration;
    use tokio::time::timeout;

    fn registry() -> (RoomRegistryHandle, Arc<ActorMetrics>) {
        let metrics = ActorMetrics::new();
        let handle = RoomRegistryHandle::new(
            "rc-test".to_string(),
            RegistrySettings::default(),
            Arc::clone(&metrics),
        );
        (handle, metrics)
    }

    fn session(
        id: &str,
        registry: &RoomRegistryHandle,
        metrics: &Arc<ActorMetrics>,
    ) -> (Session, mpsc::Receiver<RoomEvent>) {
        Session::with_connection_id(id.to_string(), registry.clone(), Arc::clone(metrics))
    }

    async fn next_event(events: &mut mpsc::Receiver<RoomEvent>) -> RoomEvent {
        timeout(Duration::from_secs(1), events.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed")
    }

    async fn create(session: &mut Session) -> String {
        match session.handle_request(ClientRequest::CreateRoom {}).await {
            Ok(AckResult::Joined { room_id, mark }) => {
                assert_eq!(mark, Mark::X);
                room_id
            }
            other => unreachable!("unexpected create result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_then_join() {
        let (registry, metrics) = registry();
        let (mut alice, _alice_events) = session("alice", &registry, &metrics);
        let (mut bob, mut bob_events) = session("bob", &registry, &metrics);

        let room_id = create(&mut alice).await;
        assert_eq!(alice.room_id(), Some(room_id.as_str()));
        assert_eq!(alice.mark(), Some(Mark::X));

        let result = bob
            .handle_request(ClientRequest::JoinRoom {
                room_id: room_id.clone(),
            })
            .await
            .unwrap();
        assert_eq!(
            result,
            AckResult::Joined {
                room_id,
                mark: Mark::O
            }
        );
        assert!(matches!(
            next_event(&mut bob_events).await,
            RoomEvent::StateChanged { turn: Mark::X, .. }
        ));

        registry.cancel();
    }

    #[tokio::test]
    async fn test_second_room_rejected() {
        let (registry, metrics) = registry();
        let (mut alice, _events) = session("alice", &registry, &metrics);
        let room_id = create(&mut alice).await;

        assert_eq!(
            alice.handle_request(ClientRequest::CreateRoom {}).await,
            Err(RcError::AlreadyInRoom)
        );
        assert_eq!(
            alice
                .handle_request(ClientRequest::JoinRoom { room_id })
                .await,
            Err(RcError::AlreadyInRoom)
        );

        registry.cancel();
    }

    #[tokio::test]
    async fn test_join_unknown_room() {
        let (registry, metrics) = registry();
        let (mut bob, _events) = session("bob", &registry, &metrics);

        let result = bob
            .handle_request(ClientRequest::JoinRoom {
                room_id: "nope".to_string(),
            })
            .await;
        assert!(matches!(result, Err(RcError::RoomNotFound(_))));
        assert_eq!(bob.room_id(), None);

        registry.cancel();
    }

    #[tokio::test]
    async fn test_move_validation() {
        let (registry, metrics) = registry();
        let (mut alice, _a) = session("alice", &registry, &metrics);
        let (mut bob, _b) = session("bob", &registry, &metrics);
        let (mut carol, _c) = session("carol", &registry, &metrics);

        let room_id = create(&mut alice).await;

        let waiting = alice
            .handle_request(ClientRequest::Move {
                room_id: room_id.clone(),
                index: 0,
            })
            .await;
        assert_eq!(waiting, Err(RcError::WaitingForOpponent));

        bob.handle_request(ClientRequest::JoinRoom {
            room_id: room_id.clone(),
        })
        .await
        .unwrap();

        let negative = alice
            .handle_request(ClientRequest::Move {
                room_id: room_id.clone(),
                index: -1,
            })
            .await;
        assert!(matches!(negative, Err(RcError::InvalidMove(_))));

        let outsider = carol
            .handle_request(ClientRequest::Move {
                room_id: room_id.clone(),
                index: 0,
            })
            .await;
        assert_eq!(outsider, Err(RcError::NotInRoom));

        let out_of_turn = bob
            .handle_request(ClientRequest::Move {
                room_id: room_id.clone(),
                index: 0,
            })
            .await;
        assert_eq!(out_of_turn, Err(RcError::NotYourTurn));

        let ok = alice
            .handle_request(ClientRequest::Move {
                room_id: room_id.clone(),
                index: 4,
            })
            .await;
        assert_eq!(ok, Ok(AckResult::ok()));

        let missing = alice
            .handle_request(ClientRequest::Move {
                room_id: "missing".to_string(),
                index: 0,
            })
            .await;
        assert!(matches!(missing, Err(RcError::RoomNotFound(_))));

        registry.cancel();
    }

    #[tokio::test]
    async fn test_last_leave_removes_room() {
        let (registry, metrics) = registry();
        let (mut alice, _a) = session("alice", &registry, &metrics);
        let (mut bob, mut bob_events) = session("bob", &registry, &metrics);

        let room_id = create(&mut alice).await;
        bob.handle_request(ClientRequest::JoinRoom {
            room_id: room_id.clone(),
        })
        .await
        .unwrap();
        let _ = next_event(&mut bob_events).await;

        alice.close().await;
        assert_eq!(alice.room_id(), None);
        assert_eq!(next_event(&mut bob_events).await, RoomEvent::MemberLeft);
        assert!(registry.get_room(room_id.clone()).await.is_ok());

        bob.handle_request(ClientRequest::LeaveRoom {})
            .await
            .unwrap();
        assert!(matches!(
            registry.get_room(room_id).await,
            Err(RcError::RoomNotFound(_))
        ));
        assert_eq!(registry.get_status().await.unwrap().room_count, 0);

        assert_eq!(
            bob.handle_request(ClientRequest::LeaveRoom {}).await,
            Err(RcError::NotInRoom)
        );

        registry.cancel();
    }

    #[tokio::test]
    async fn test_malformed_text_acks_error() {
        let (registry, metrics) = registry();
        let (mut alice, _events) = session("alice", &registry, &metrics);

        let reply = alice.handle_text(r#"{"event":"room:dance","ack":7}"#).await;
        assert_eq!(
            reply,
            ServerMessage::Ack {
                ack: Some(7),
                result: AckResult::Error {
                    error: "Invalid message".to_string(),
                    code: "INVALID_MESSAGE",
                },
            }
        );

        registry.cancel();
    }
}
