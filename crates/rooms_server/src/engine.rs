//! Session operations: create, join, move, snapshot, close.

use crate::registry::Registry;
use crate::room::{Outcome, Room, RoomId, RoomSnapshot, TurnPolicy};
use crate::SessionError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

/// Confirmation returned by a successful join.
pub const JOIN_CONFIRMATION: &str = "Successfully joined the room!";

/// One line of the room listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    /// Room identifier.
    pub room_id: RoomId,
    /// Names on the roster, in join order.
    pub players: Vec<String>,
    /// Current outcome.
    pub outcome: Outcome,
}

/// Entry point for every room mutation.
///
/// Each operation looks the room up (registry lock only), then validates and
/// mutates it under the room's own lock. The two locks are never held
/// together.
#[derive(Debug, Clone)]
pub struct SessionEngine {
    registry: Registry,
    policy: TurnPolicy,
}

fn checked_name(name: &str) -> Result<String, SessionError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(SessionError::InvalidName);
    }
    Ok(trimmed.to_string())
}

impl SessionEngine {
    /// Creates an engine over `registry`.
    #[instrument(skip(registry))]
    pub fn new(registry: Registry, policy: TurnPolicy) -> Self {
        info!(%policy, "Creating session engine");
        Self { registry, policy }
    }

    /// The registry this engine works on.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Turn policy applied to moves.
    pub fn policy(&self) -> TurnPolicy {
        self.policy
    }

    /// Creates a room with `participant` holding `X` and the first turn.
    #[instrument(skip(self))]
    pub fn create(&self, participant: &str) -> Result<RoomId, SessionError> {
        let name = checked_name(participant)?;
        let id = self.registry.create_room(name)?;
        info!(room_id = %id, "Room created");
        Ok(id)
    }

    /// Adds `participant` as the second player (`O`).
    ///
    /// # Errors
    ///
    /// `RoomNotFound`, `RoomClosed`, `InvalidName`, `RoomFull` or
    /// `DuplicateName`.
    #[instrument(skip(self))]
    pub fn join(&self, room_id: &str, participant: &str) -> Result<&'static str, SessionError> {
        let room = self.registry.lookup(room_id)?;
        let name = checked_name(participant)?;
        room.join(name)?;
        Ok(JOIN_CONFIRMATION)
    }

    /// Places `participant`'s mark at (`row`, `col`).
    ///
    /// Checks run in this order: room exists, room open, position in range,
    /// cell empty, game in progress, caller on the roster, then (strict
    /// policy only) opponent present and caller holds the turn.
    #[instrument(skip(self))]
    pub fn apply_move(
        &self,
        room_id: &str,
        participant: &str,
        row: i64,
        col: i64,
    ) -> Result<RoomSnapshot, SessionError> {
        let room = self.registry.lookup(room_id)?;
        let snapshot = room.apply_move(participant.trim(), row, col, self.policy)?;
        info!(
            room_id,
            participant,
            row,
            col,
            outcome = ?snapshot.outcome,
            "Move completed successfully"
        );
        Ok(snapshot)
    }

    /// Reads the current state of a room.
    #[instrument(skip(self))]
    pub fn snapshot(&self, room_id: &str) -> Result<RoomSnapshot, SessionError> {
        Ok(self.registry.lookup(room_id)?.snapshot())
    }

    /// Closes a room and drops it from the registry.
    ///
    /// The room is marked closed first, so a publisher that already holds it
    /// still pushes one final closed snapshot.
    #[instrument(skip(self))]
    pub fn close(&self, room_id: &str) -> Result<(), SessionError> {
        let room = self.registry.lookup(room_id)?;
        if !room.close() {
            return Err(SessionError::RoomClosed(room_id.to_string()));
        }
        self.registry.remove(&room);
        Ok(())
    }

    /// Removes an already closed room from the registry.
    pub(crate) fn retire(&self, room: &Arc<Room>) {
        self.registry.remove(room);
    }

    /// Summaries of all registered rooms, sorted by identifier.
    #[instrument(skip(self))]
    pub fn list(&self) -> Vec<RoomSummary> {
        let rooms = self.registry.rooms();
        let mut summaries: Vec<_> = rooms
            .iter()
            .map(|room| {
                let snap = room.snapshot();
                RoomSummary {
                    room_id: snap.room_id,
                    players: snap.players.into_iter().map(|p| p.name).collect(),
                    outcome: snap.outcome,
                }
            })
            .collect();
        summaries.sort_by(|a, b| a.room_id.cmp(&b.room_id));
        info!(count = summaries.len(), "Listed rooms");
        summaries
    }
}
