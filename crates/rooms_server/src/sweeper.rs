//! Expiry of idle rooms.

use crate::engine::SessionEngine;
use crate::room::RoomId;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, instrument};

/// Closes rooms that saw no join or move for longer than a time-to-live.
#[derive(Debug, Clone)]
pub struct ExpirySweeper {
    engine: SessionEngine,
    ttl: Duration,
    every: Duration,
}

impl ExpirySweeper {
    /// Creates a sweeper that runs every `every` and expires rooms idle for
    /// `ttl`.
    pub fn new(engine: SessionEngine, ttl: Duration, every: Duration) -> Self {
        Self { engine, ttl, every }
    }

    /// Runs one pass and returns the identifiers of the rooms it closed.
    ///
    /// Room handles are collected first and the registry lock released
    /// before any room is locked.
    #[instrument(skip(self))]
    pub fn sweep_once(&self) -> Vec<RoomId> {
        let now = Instant::now();
        let rooms = self.engine.registry().rooms();
        let mut expired = Vec::new();
        for room in rooms {
            if room.close_if_idle(self.ttl, now) {
                self.engine.retire(&room);
                expired.push(room.id().to_string());
            }
        }
        if !expired.is_empty() {
            info!(count = expired.len(), "Expired idle rooms");
        }
        expired
    }

    /// Spawns the periodic sweep onto the current runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        info!(
            ttl_secs = self.ttl.as_secs(),
            every_secs = self.every.as_secs(),
            "Starting room expiry"
        );
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + self.every, self.every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let expired = self.sweep_once();
                debug!(expired = expired.len(), "Sweep finished");
            }
        })
    }
}
