//! Polling state publisher.
//!
//! Each subscription runs its own task. On every tick the task looks the
//! room up, takes a snapshot under the room lock, pushes it to the
//! subscriber and sleeps for the poll interval. Identical consecutive
//! snapshots are pushed again; there is no deduplication.
//!
//! A subscription ends when:
//! - the room is no longer registered ([`Termination::RoomGone`]),
//! - a closed snapshot has been delivered ([`Termination::RoomClosed`]),
//! - the sink refuses a push ([`Termination::SubscriberGone`]),
//! - or the caller cancels it ([`Termination::Cancelled`]).

use crate::registry::Registry;
use crate::room::{RoomId, RoomSnapshot};
use crate::SessionError;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, Instrument};

/// The subscriber hung up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("Subscriber disconnected")]
pub struct SinkClosed;

/// Destination of published snapshots.
#[async_trait]
pub trait SnapshotSink: Send + 'static {
    /// Delivers one snapshot.
    ///
    /// Returning `Err` ends the subscription.
    async fn push(&mut self, snapshot: RoomSnapshot) -> Result<(), SinkClosed>;
}

#[async_trait]
impl SnapshotSink for mpsc::Sender<RoomSnapshot> {
    async fn push(&mut self, snapshot: RoomSnapshot) -> Result<(), SinkClosed> {
        self.send(snapshot).await.map_err(|_| SinkClosed)
    }
}

/// Why a subscription stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Termination {
    /// The room disappeared from the registry.
    #[display("room gone")]
    RoomGone,
    /// The final, closed snapshot was delivered.
    #[display("room closed")]
    RoomClosed,
    /// The sink refused a push.
    #[display("subscriber gone")]
    SubscriberGone,
    /// [`Subscription::cancel`] was called.
    #[display("cancelled")]
    Cancelled,
    /// The task panicked.
    #[display("failed")]
    Failed,
}

/// Handle to a running subscription.
///
/// Dropping the handle detaches the task; it still stops on its own once
/// the sink is closed.
#[derive(Debug)]
pub struct Subscription {
    room_id: RoomId,
    task: JoinHandle<Termination>,
}

impl Subscription {
    /// Room being observed.
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Stops the subscription at its next await point.
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// True once the task has stopped.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the task to stop and reports why.
    pub async fn finished(self) -> Termination {
        match self.task.await {
            Ok(reason) => reason,
            Err(err) if err.is_cancelled() => Termination::Cancelled,
            Err(err) => {
                error!(room_id = %self.room_id, error = %err, "Subscription task failed");
                Termination::Failed
            }
        }
    }
}

/// Starts polling subscriptions.
#[derive(Debug, Clone)]
pub struct StatePublisher {
    registry: Registry,
    interval: Duration,
}

impl StatePublisher {
    /// Creates a publisher sampling rooms every `interval`.
    pub fn new(registry: Registry, interval: Duration) -> Self {
        Self { registry, interval }
    }

    /// Poll interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Starts streaming snapshots of `room_id` into `sink`.
    ///
    /// Must be called inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// [`SessionError::RoomNotFound`] if the room does not exist now.
    #[instrument(skip(self, sink))]
    pub fn subscribe<S: SnapshotSink>(
        &self,
        room_id: &str,
        sink: S,
    ) -> Result<Subscription, SessionError> {
        self.registry.lookup(room_id)?;
        info!(interval_ms = self.interval.as_millis() as u64, "Starting subscription");

        let task = tokio::spawn(
            poll(self.registry.clone(), room_id.to_string(), sink, self.interval)
                .instrument(tracing::info_span!("subscription", room_id)),
        );
        Ok(Subscription {
            room_id: room_id.to_string(),
            task,
        })
    }
}

async fn poll<S: SnapshotSink>(
    registry: Registry,
    room_id: RoomId,
    mut sink: S,
    interval: Duration,
) -> Termination {
    let reason = loop {
        let Ok(room) = registry.lookup(&room_id) else {
            break Termination::RoomGone;
        };
        // The guard is released inside `snapshot`, before any await.
        let snapshot = room.snapshot();
        drop(room);

        let closed = snapshot.is_closed();
        if sink.push(snapshot).await.is_err() {
            break Termination::SubscriberGone;
        }
        if closed {
            break Termination::RoomClosed;
        }
        tokio::time::sleep(interval).await;
    };
    debug!(%reason, "Subscription ended");
    reason
}
