//! `TurnTimer` - per-room repeating countdown task.
//!
//! A timer ticks every `period` and posts `RoomMessage::TimerTick` carrying
//! its generation to the owning room. It holds only a weak sender, so a room
//! whose mailbox is gone is never kept alive by its timer; the task exits on
//! the first tick it cannot deliver.

use super::messages::RoomMessage;

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// A running countdown. Dropping it stops the task.
#[derive(Debug)]
pub struct TurnTimer {
    generation: u64,
    cancel_token: CancellationToken,
    task: JoinHandle<()>,
}

impl TurnTimer {
    /// Spawn a timer whose first tick fires one `period` from now.
    ///
    /// `parent` is the room's token; cancelling the room cancels the timer.
    #[must_use]
    pub fn start(
        room_id: String,
        generation: u64,
        period: Duration,
        room: mpsc::WeakSender<RoomMessage>,
        parent: &CancellationToken,
    ) -> Self {
        let cancel_token = parent.child_token();
        let task = tokio::spawn(run(
            room_id,
            generation,
            period,
            room,
            cancel_token.clone(),
        ));

        Self {
            generation,
            cancel_token,
            task,
        }
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Stop the countdown.
    pub fn stop(self) {
        self.cancel_token.cancel();
        self.task.abort();
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TurnTimer {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

#[instrument(skip_all, name = "rc.actor.timer", fields(room_id = %room_id, generation = generation))]
async fn run(
    room_id: String,
    generation: u64,
    period: Duration,
    room: mpsc::WeakSender<RoomMessage>,
    cancel_token: CancellationToken,
) {
    let period = period.max(Duration::from_millis(1));
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel_token.cancelled() => break,
            _ = ticker.tick() => {
                let Some(sender) = room.upgrade() else {
                    debug!(
                        target: "rc.actor.timer",
                        room_id = %room_id,
                        generation,
                        "Room mailbox gone, timer exiting"
                    );
                    break;
                };
                if sender.send(RoomMessage::TimerTick { generation }).await.is_err() {
                    break;
                }
            }
        }
    }
}
