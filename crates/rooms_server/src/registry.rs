//! Process-wide room registry.

use crate::ids::{RandomRoomIds, RoomIdSource};
use crate::room::{Room, RoomId};
use crate::SessionError;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, instrument, warn};

/// Attempts at drawing a fresh identifier before giving up.
const MAX_ID_ATTEMPTS: usize = 16;

/// Maps room identifiers to rooms.
///
/// The registry lock guards the mapping only. Lookups hand out an
/// `Arc<Room>` and release the registry lock before the caller takes the
/// room lock, so a slow room never blocks lookups of other rooms.
///
/// Cloning is cheap and every clone shares the same mapping.
#[derive(Debug, Clone)]
pub struct Registry {
    rooms: Arc<RwLock<HashMap<RoomId, Arc<Room>>>>,
    ids: Arc<dyn RoomIdSource>,
}

impl Registry {
    /// Creates an empty registry with random identifiers.
    #[instrument]
    pub fn new() -> Self {
        Self::with_id_source(RandomRoomIds)
    }

    /// Creates an empty registry drawing identifiers from `ids`.
    #[instrument]
    pub fn with_id_source(ids: impl RoomIdSource + 'static) -> Self {
        info!("Creating room registry");
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            ids: Arc::new(ids),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<RoomId, Arc<Room>>> {
        self.rooms.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<RoomId, Arc<Room>>> {
        self.rooms.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates a room with `creator` as its first participant and returns
    /// its identifier.
    ///
    /// # Errors
    ///
    /// [`SessionError::IdSpaceExhausted`] if every drawn identifier collided.
    #[instrument(skip(self))]
    pub fn create_room(&self, creator: String) -> Result<RoomId, SessionError> {
        let (registered, collisions) = {
            let mut rooms = self.write();
            let mut collisions = 0;
            let mut registered = None;
            while registered.is_none() && collisions < MAX_ID_ATTEMPTS {
                let id = self.ids.next_id();
                if rooms.contains_key(&id) {
                    collisions += 1;
                    continue;
                }
                rooms.insert(id.clone(), Arc::new(Room::new(id.clone(), creator.clone())));
                registered = Some((id, rooms.len()));
            }
            (registered, collisions)
        };

        if collisions > 0 {
            debug!(collisions, "Identifier collisions while drawing");
        }
        match registered {
            Some((id, count)) => {
                info!(room_id = %id, rooms = count, "Registered room");
                Ok(id)
            }
            None => {
                warn!(attempts = MAX_ID_ATTEMPTS, "Room identifier space exhausted");
                Err(SessionError::IdSpaceExhausted(MAX_ID_ATTEMPTS))
            }
        }
    }

    /// Finds a room.
    #[instrument(skip(self))]
    pub fn lookup(&self, id: &str) -> Result<Arc<Room>, SessionError> {
        let found = self.read().get(id).cloned();
        found.ok_or_else(|| {
            debug!(room_id = id, "Room not found");
            SessionError::RoomNotFound(id.to_string())
        })
    }

    /// Removes `room` if it is still the one registered under its id.
    #[instrument(skip(self, room), fields(room_id = %room.id()))]
    pub fn remove(&self, room: &Arc<Room>) -> bool {
        let remaining = {
            let mut rooms = self.write();
            match rooms.get(room.id()) {
                Some(current) if Arc::ptr_eq(current, room) => {
                    rooms.remove(room.id());
                    Some(rooms.len())
                }
                _ => None,
            }
        };
        match remaining {
            Some(count) => {
                info!(rooms = count, "Removed room");
                true
            }
            None => false,
        }
    }

    /// All registered rooms, in no particular order.
    pub fn rooms(&self) -> Vec<Arc<Room>> {
        self.read().values().cloned().collect()
    }

    /// Number of registered rooms.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// True if no room is registered.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
