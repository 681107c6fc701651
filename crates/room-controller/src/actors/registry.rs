//! `RoomRegistryActor` - singleton supervisor for room actors.
//!
//! The registry is the top-level actor in the RC hierarchy:
//!
//! - Singleton per RC instance
//! - Sole owner of room lifetimes: creates, looks up and deletes rooms by id
//! - Allocates collision-free room ids with a bounded number of attempts
//! - Owns the root `CancellationToken` (rooms and their timers hang off it)
//! - Monitors child actor health (panic detection via `JoinHandle`)
//!
//! # Graceful Shutdown
//!
//! On SIGTERM the registry stops accepting rooms, then cancels the root token,
//! which stops every room actor and every turn timer.

use crate::errors::RcError;
use crate::observability::metrics as prom;

use super::connection::ConnectionHandle;
use super::messages::{CreatedRoom, RegistryMessage, RegistryStatus};
use super::metrics::{ActorMetrics, ActorType, MailboxMonitor};
use super::room::{RoomActor, RoomActorHandle, RoomSettings};

use crate::board::Mark;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Default channel buffer size for the registry mailbox.
const REGISTRY_CHANNEL_BUFFER: usize = 1000;

/// How long shutdown waits for each room task.
const ROOM_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Produces candidate room ids.
pub type IdSource = Box<dyn FnMut() -> String + Send>;

/// Registry limits and the settings handed to every room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrySettings {
    pub max_rooms: usize,
    pub room_id_length: usize,
    pub room_id_max_attempts: u32,
    pub room: RoomSettings,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            max_rooms: 10_000,
            room_id_length: 6,
            room_id_max_attempts: 8,
            room: RoomSettings::default(),
        }
    }
}

/// Random lowercase-hex id of `length` characters (at most 32).
#[must_use]
pub fn random_room_id(length: usize) -> String {
    uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(length)
        .collect()
}

/// Handle to the `RoomRegistryActor`.
#[derive(Clone)]
pub struct RoomRegistryHandle {
    sender: mpsc::Sender<RegistryMessage>,
    cancel_token: CancellationToken,
}

impl RoomRegistryHandle {
    /// Spawn the registry with random room ids.
    #[must_use]
    pub fn new(instance_id: String, settings: RegistrySettings, metrics: Arc<ActorMetrics>) -> Self {
        let length = settings.room_id_length;
        Self::with_id_source(
            instance_id,
            settings,
            metrics,
            Box::new(move || random_room_id(length)),
        )
    }

    /// Spawn the registry drawing candidate ids from `ids`.
    #[must_use]
    pub fn with_id_source(
        instance_id: String,
        settings: RegistrySettings,
        metrics: Arc<ActorMetrics>,
        ids: IdSource,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(REGISTRY_CHANNEL_BUFFER);
        let cancel_token = CancellationToken::new();

        let actor = RoomRegistryActor {
            mailbox: MailboxMonitor::new(ActorType::Registry, &instance_id),
            instance_id,
            receiver,
            cancel_token: cancel_token.clone(),
            rooms: HashMap::new(),
            accepting_new: true,
            settings,
            ids,
            metrics,
        };

        tokio::spawn(actor.run());

        Self {
            sender,
            cancel_token,
        }
    }

    /// Create a room with `creator` seated as `X`.
    pub async fn create_room(&self, creator: ConnectionHandle) -> Result<CreatedRoom, RcError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(RegistryMessage::CreateRoom {
                creator,
                respond_to: tx,
            })
            .await
            .map_err(|e| RcError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| RcError::Internal(format!("response receive failed: {e}")))?
    }

    /// Look up a live room.
    pub async fn get_room(&self, room_id: String) -> Result<RoomActorHandle, RcError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(RegistryMessage::GetRoom {
                room_id,
                respond_to: tx,
            })
            .await
            .map_err(|e| RcError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| RcError::Internal(format!("response receive failed: {e}")))?
    }

    /// Delete a room. Returns `false` if no such room existed.
    pub async fn remove_room(&self, room_id: String) -> Result<bool, RcError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(RegistryMessage::RemoveRoom {
                room_id,
                respond_to: tx,
            })
            .await
            .map_err(|e| RcError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| RcError::Internal(format!("response receive failed: {e}")))
    }

    pub async fn get_status(&self) -> Result<RegistryStatus, RcError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(RegistryMessage::GetStatus { respond_to: tx })
            .await
            .map_err(|e| RcError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| RcError::Internal(format!("response receive failed: {e}")))
    }

    /// Stop accepting rooms and cancel every room actor.
    pub async fn shutdown(&self) -> Result<(), RcError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(RegistryMessage::Shutdown { respond_to: tx })
            .await
            .map_err(|e| RcError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| RcError::Internal(format!("response receive failed: {e}")))?
    }

    /// Cancel the actor (for immediate shutdown).
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

/// Internal state for a managed room.
struct ManagedRoom {
    handle: RoomActorHandle,
    task_handle: JoinHandle<()>,
    created_at: i64,
}

/// The `RoomRegistryActor` implementation.
pub struct RoomRegistryActor {
    instance_id: String,
    receiver: mpsc::Receiver<RegistryMessage>,
    cancel_token: CancellationToken,
    rooms: HashMap<String, ManagedRoom>,
    accepting_new: bool,
    settings: RegistrySettings,
    ids: IdSource,
    metrics: Arc<ActorMetrics>,
    mailbox: MailboxMonitor,
}

impl RoomRegistryActor {
    #[instrument(skip_all, name = "rc.actor.registry", fields(instance_id = %self.instance_id))]
    async fn run(mut self) {
        info!(
            target: "rc.actor.registry",
            instance_id = %self.instance_id,
            max_rooms = self.settings.max_rooms,
            "RoomRegistryActor started"
        );

        loop {
            self.check_room_health().await;

            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "rc.actor.registry",
                        instance_id = %self.instance_id,
                        "RoomRegistryActor received cancellation signal"
                    );
                    self.graceful_shutdown().await;
                    break;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => {
                            self.mailbox.record_enqueue(self.receiver.len());
                            self.handle_message(message);
                            self.mailbox.record_dequeue();
                            self.metrics.record_message_processed();
                        }
                        None => {
                            info!(
                                target: "rc.actor.registry",
                                instance_id = %self.instance_id,
                                "RoomRegistryActor channel closed, exiting"
                            );
                            self.graceful_shutdown().await;
                            break;
                        }
                    }
                }
            }
        }

        info!(
            target: "rc.actor.registry",
            instance_id = %self.instance_id,
            messages_processed = self.mailbox.messages_processed(),
            "RoomRegistryActor stopped"
        );
    }

    fn handle_message(&mut self, message: RegistryMessage) {
        match message {
            RegistryMessage::CreateRoom {
                creator,
                respond_to,
            } => {
                let result = self.create_room(creator);
                let _ = respond_to.send(result);
            }

            RegistryMessage::GetRoom {
                room_id,
                respond_to,
            } => {
                let result = self
                    .rooms
                    .get(&room_id)
                    .map(|managed| managed.handle.clone())
                    .ok_or(RcError::RoomNotFound(room_id));
                let _ = respond_to.send(result);
            }

            RegistryMessage::RemoveRoom {
                room_id,
                respond_to,
            } => {
                let removed = self.remove_room(&room_id);
                let _ = respond_to.send(removed);
            }

            RegistryMessage::GetStatus { respond_to } => {
                let _ = respond_to.send(self.get_status());
            }

            RegistryMessage::Shutdown { respond_to } => {
                info!(
                    target: "rc.actor.registry",
                    instance_id = %self.instance_id,
                    room_count = self.rooms.len(),
                    "Initiating graceful shutdown"
                );
                self.accepting_new = false;
                self.cancel_token.cancel();
                let _ = respond_to.send(Ok(()));
            }
        }
    }

    fn create_room(&mut self, creator: ConnectionHandle) -> Result<CreatedRoom, RcError> {
        if !self.accepting_new {
            return Err(RcError::Draining);
        }
        if self.rooms.len() >= self.settings.max_rooms {
            warn!(
                target: "rc.actor.registry",
                instance_id = %self.instance_id,
                max_rooms = self.settings.max_rooms,
                "Room capacity reached"
            );
            return Err(RcError::CapacityExceeded);
        }

        let room_id = self.allocate_id()?;
        let creator_id = creator.connection_id().to_string();

        let (handle, task_handle) = RoomActor::spawn(
            room_id.clone(),
            creator,
            self.settings.room,
            self.cancel_token.child_token(),
            Arc::clone(&self.metrics),
        );

        self.rooms.insert(
            room_id.clone(),
            ManagedRoom {
                handle: handle.clone(),
                task_handle,
                created_at: chrono::Utc::now().timestamp(),
            },
        );
        self.metrics.room_created();

        info!(
            target: "rc.actor.registry",
            instance_id = %self.instance_id,
            room_id = %room_id,
            creator = %creator_id,
            total_rooms = self.rooms.len(),
            "Room created"
        );

        Ok(CreatedRoom {
            room_id,
            mark: Mark::X,
            handle,
        })
    }

    /// Draw candidate ids until one is free, up to the attempt limit.
    fn allocate_id(&mut self) -> Result<String, RcError> {
        let attempts = self.settings.room_id_max_attempts.max(1);
        for attempt in 1..=attempts {
            let candidate = (self.ids)();
            if !candidate.is_empty() && !self.rooms.contains_key(&candidate) {
                return Ok(candidate);
            }
            prom::record_room_id_collision();
            debug!(
                target: "rc.actor.registry",
                instance_id = %self.instance_id,
                attempt,
                "Room id collision, retrying"
            );
        }

        error!(
            target: "rc.actor.registry",
            instance_id = %self.instance_id,
            attempts,
            live_rooms = self.rooms.len(),
            "Room id allocation exhausted"
        );
        Err(RcError::RoomIdExhausted { attempts })
    }

    fn remove_room(&mut self, room_id: &str) -> bool {
        let Some(managed) = self.rooms.remove(room_id) else {
            return false;
        };

        managed.handle.cancel();
        self.metrics.room_removed();

        info!(
            target: "rc.actor.registry",
            instance_id = %self.instance_id,
            room_id = %room_id,
            lifetime_secs = chrono::Utc::now().timestamp() - managed.created_at,
            total_rooms = self.rooms.len(),
            "Room removed"
        );

        true
    }

    fn get_status(&self) -> RegistryStatus {
        RegistryStatus {
            room_count: self.rooms.len(),
            connection_count: self.metrics.connection_count(),
            is_draining: !self.accepting_new,
            mailbox_depth: self.mailbox.current_depth(),
        }
    }

    async fn graceful_shutdown(&mut self) {
        self.accepting_new = false;

        for managed in self.rooms.values() {
            managed.handle.cancel();
        }

        for (room_id, managed) in self.rooms.drain() {
            match tokio::time::timeout(ROOM_SHUTDOWN_TIMEOUT, managed.task_handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(
                        target: "rc.actor.registry",
                        instance_id = %self.instance_id,
                        room_id = %room_id,
                        error = ?e,
                        "Room actor task panicked during shutdown"
                    );
                }
                Err(_) => {
                    warn!(
                        target: "rc.actor.registry",
                        instance_id = %self.instance_id,
                        room_id = %room_id,
                        "Room actor shutdown timed out"
                    );
                }
            }
            self.metrics.room_removed();
        }

        info!(
            target: "rc.actor.registry",
            instance_id = %self.instance_id,
            "Graceful shutdown complete"
        );
    }

    /// Reap room tasks that ended without being removed.
    async fn check_room_health(&mut self) {
        let finished: Vec<String> = self
            .rooms
            .iter()
            .filter(|(_, managed)| managed.task_handle.is_finished())
            .map(|(room_id, _)| room_id.clone())
            .collect();

        for room_id in finished {
            let Some(managed) = self.rooms.remove(&room_id) else {
                continue;
            };

            match managed.task_handle.await {
                Ok(()) => {
                    info!(
                        target: "rc.actor.registry",
                        instance_id = %self.instance_id,
                        room_id = %room_id,
                        "Room actor exited"
                    );
                }
                Err(join_error) if join_error.is_panic() => {
                    error!(
                        target: "rc.actor.registry",
                        instance_id = %self.instance_id,
                        room_id = %room_id,
                        error = ?join_error,
                        "Room actor panicked"
                    );
                    self.metrics.record_panic(ActorType::Room);
                }
                Err(_) => {}
            }

            self.metrics.room_removed();
        }
    }
}
