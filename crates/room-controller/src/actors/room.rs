//! `RoomActor` - per-room actor that owns one game session.
//!
//! Each `RoomActor`:
//! - Owns the [`Room`] state machine (members, marks, board, turn, countdown)
//! - Holds the outbound [`ConnectionHandle`] of every member
//! - Owns at most one [`TurnTimer`]
//!
//! Join, move, leave and timer ticks all arrive through the mailbox, so each
//! one is applied atomically against the current state.
//!
//! # Timer generations
//!
//! Every timer start bumps `timer_generation`. A `TimerTick` whose generation
//! is not the current one was already in flight when its timer was replaced
//! or stopped, and is discarded.

use crate::board::{GameResult, Mark};
use crate::errors::RcError;
use crate::observability::metrics as prom;
use crate::room::{MoveOutcome, Room, RoomView, TickOutcome, TimerDirective, DEFAULT_TURN_DURATION};

use super::connection::ConnectionHandle;
use super::messages::{RoomEvent, RoomMessage};
use super::metrics::{ActorMetrics, ActorType, MailboxMonitor};
use super::timer::TurnTimer;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Default channel buffer size for the room mailbox.
const ROOM_CHANNEL_BUFFER: usize = 64;

/// Per-room timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomSettings {
    /// Countdown length in ticks.
    pub turn_duration: u32,
    /// Wall-clock length of one tick.
    pub tick_interval: Duration,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            turn_duration: DEFAULT_TURN_DURATION,
            tick_interval: Duration::from_secs(1),
        }
    }
}

/// Handle to a `RoomActor`.
#[derive(Clone, Debug)]
pub struct RoomActorHandle {
    sender: mpsc::Sender<RoomMessage>,
    cancel_token: CancellationToken,
    room_id: String,
}

impl RoomActorHandle {
    #[must_use]
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Seat `member` in the room, returning its mark.
    pub async fn join(&self, member: ConnectionHandle) -> Result<Mark, RcError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(RoomMessage::Join {
                member,
                respond_to: tx,
            })
            .await
            .map_err(|_| RcError::RoomNotFound(self.room_id.clone()))?;

        rx.await
            .map_err(|_| RcError::RoomNotFound(self.room_id.clone()))?
    }

    /// Submit a move on behalf of `connection_id`.
    pub async fn apply_move(&self, connection_id: String, index: usize) -> Result<(), RcError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(RoomMessage::ApplyMove {
                connection_id,
                index,
                respond_to: tx,
            })
            .await
            .map_err(|_| RcError::RoomNotFound(self.room_id.clone()))?;

        rx.await
            .map_err(|_| RcError::RoomNotFound(self.room_id.clone()))?
    }

    /// Remove `connection_id`, returning how many members remain.
    pub async fn leave(&self, connection_id: String) -> Result<usize, RcError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(RoomMessage::Leave {
                connection_id,
                respond_to: tx,
            })
            .await
            .map_err(|e| RcError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| RcError::Internal(format!("response receive failed: {e}")))?
    }

    pub async fn get_state(&self) -> Result<RoomView, RcError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(RoomMessage::GetState { respond_to: tx })
            .await
            .map_err(|e| RcError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| RcError::Internal(format!("response receive failed: {e}")))
    }

    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

/// The `RoomActor` implementation.
pub struct RoomActor {
    room: Room,
    members: Vec<ConnectionHandle>,
    receiver: mpsc::Receiver<RoomMessage>,
    /// Weak so the room's own handle never keeps its mailbox open.
    self_sender: mpsc::WeakSender<RoomMessage>,
    cancel_token: CancellationToken,
    settings: RoomSettings,
    timer: Option<TurnTimer>,
    timer_generation: u64,
    metrics: Arc<ActorMetrics>,
    mailbox: MailboxMonitor,
}

impl RoomActor {
    /// Spawn a room with `creator` seated as `X`.
    ///
    /// Returns a handle and the task join handle.
    pub fn spawn(
        room_id: String,
        creator: ConnectionHandle,
        settings: RoomSettings,
        cancel_token: CancellationToken,
        metrics: Arc<ActorMetrics>,
    ) -> (RoomActorHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(ROOM_CHANNEL_BUFFER);

        let actor = Self {
            room: Room::new(
                room_id.clone(),
                creator.connection_id(),
                settings.turn_duration,
            ),
            members: vec![creator],
            receiver,
            self_sender: sender.downgrade(),
            cancel_token: cancel_token.clone(),
            settings,
            timer: None,
            timer_generation: 0,
            metrics,
            mailbox: MailboxMonitor::new(ActorType::Room, &room_id),
        };

        let task_handle = tokio::spawn(actor.run());

        let handle = RoomActorHandle {
            sender,
            cancel_token,
            room_id,
        };

        (handle, task_handle)
    }

    #[instrument(skip_all, name = "rc.actor.room", fields(room_id = %self.room.id()))]
    async fn run(mut self) {
        info!(
            target: "rc.actor.room",
            room_id = %self.room.id(),
            "RoomActor started"
        );

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    debug!(
                        target: "rc.actor.room",
                        room_id = %self.room.id(),
                        "RoomActor received cancellation signal"
                    );
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
                        None => break,
                    }
                }
            }
        }

        self.stop_timer();

        info!(
            target: "rc.actor.room",
            room_id = %self.room.id(),
            members = self.members.len(),
            messages_processed = self.mailbox.messages_processed(),
            "RoomActor stopped"
        );
    }

    fn handle_message(&mut self, message: RoomMessage) {
        match message {
            RoomMessage::Join { member, respond_to } => {
                let result = self.handle_join(member);
                let _ = respond_to.send(result);
            }

            RoomMessage::ApplyMove {
                connection_id,
                index,
                respond_to,
            } => {
                let result = self.handle_move(&connection_id, index);
                let _ = respond_to.send(result);
            }

            RoomMessage::Leave {
                connection_id,
                respond_to,
            } => {
                let result = self.handle_leave(&connection_id);
                let _ = respond_to.send(result);
            }

            RoomMessage::TimerTick { generation } => self.handle_tick(generation),

            RoomMessage::GetState { respond_to } => {
                let _ = respond_to.send(self.room.view());
            }
        }
    }

    fn handle_join(&mut self, member: ConnectionHandle) -> Result<Mark, RcError> {
        let outcome = self.room.join(member.connection_id())?;

        info!(
            target: "rc.actor.room",
            room_id = %self.room.id(),
            connection_id = %member.connection_id(),
            mark = %outcome.mark,
            members = outcome.member_count,
            "Member joined"
        );

        self.members.push(member);
        self.apply_timer(outcome.timer);
        self.broadcast(&RoomEvent::StateChanged {
            board: *self.room.board(),
            turn: self.room.turn(),
        });

        Ok(outcome.mark)
    }

    fn handle_move(&mut self, connection_id: &str, index: usize) -> Result<(), RcError> {
        let outcome = match self.room.apply_move(connection_id, index) {
            Ok(outcome) => outcome,
            Err(e) => {
                prom::record_move("rejected");
                debug!(
                    target: "rc.actor.room",
                    room_id = %self.room.id(),
                    connection_id = %connection_id,
                    index,
                    error = %e,
                    "Move rejected"
                );
                return Err(e);
            }
        };

        self.apply_timer(outcome.timer());

        match outcome {
            MoveOutcome::Continue { board, turn } => {
                prom::record_move("accepted");
                self.broadcast(&RoomEvent::StateChanged { board, turn });
            }
            MoveOutcome::Finished { board, result } => {
                prom::record_move(match result {
                    GameResult::Winner(_) => "won",
                    GameResult::Draw => "draw",
                });
                info!(
                    target: "rc.actor.room",
                    room_id = %self.room.id(),
                    result = ?result,
                    "Game over"
                );
                self.broadcast(&RoomEvent::StateChanged {
                    board,
                    turn: self.room.turn(),
                });
                self.broadcast(&RoomEvent::GameOver(result));
            }
        }

        Ok(())
    }

    fn handle_leave(&mut self, connection_id: &str) -> Result<usize, RcError> {
        let outcome = self.room.remove(connection_id)?;
        self.members.retain(|m| m.connection_id() != connection_id);
        self.apply_timer(outcome.timer);

        info!(
            target: "rc.actor.room",
            room_id = %self.room.id(),
            connection_id = %connection_id,
            mark = %outcome.mark,
            remaining_members = outcome.remaining_members,
            "Member left"
        );

        self.broadcast(&RoomEvent::MemberLeft);
        Ok(outcome.remaining_members)
    }

    fn handle_tick(&mut self, generation: u64) {
        let current = self.timer.as_ref().map(TurnTimer::generation);
        if current != Some(generation) || self.room.is_over() {
            debug!(
                target: "rc.actor.room",
                room_id = %self.room.id(),
                generation,
                current = ?current,
                "Discarding stale timer tick"
            );
            return;
        }

        match self.room.tick() {
            TickOutcome::Idle => self.stop_timer(),
            TickOutcome::Countdown { remaining } => {
                self.broadcast(&RoomEvent::Tick { remaining });
            }
            TickOutcome::ForcedPass { board, turn } => {
                prom::record_turn_timeout();
                info!(
                    target: "rc.actor.room",
                    room_id = %self.room.id(),
                    turn = %turn,
                    "Turn timed out, passing turn"
                );
                self.broadcast(&RoomEvent::Tick { remaining: 0 });
                self.broadcast(&RoomEvent::StateChanged { board, turn });
                self.restart_timer();
            }
        }
    }

    fn apply_timer(&mut self, directive: TimerDirective) {
        match directive {
            TimerDirective::Restart => self.restart_timer(),
            TimerDirective::Stop => self.stop_timer(),
            TimerDirective::Keep => {}
        }
    }

    /// Cancel any running countdown, then start a fresh one.
    fn restart_timer(&mut self) {
        self.stop_timer();
        self.timer_generation += 1;
        self.timer = Some(TurnTimer::start(
            self.room.id().to_string(),
            self.timer_generation,
            self.settings.tick_interval,
            self.self_sender.clone(),
            &self.cancel_token,
        ));
    }

    fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.stop();
        }
    }

    fn broadcast(&self, event: &RoomEvent) {
        for member in &self.members {
            member.deliver(event.clone());
        }
    }
}
