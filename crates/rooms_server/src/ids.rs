//! Room identifier sources.

use rand::Rng;
use rand::distributions::Alphanumeric;
use std::fmt::Debug;

/// Length of identifiers produced by [`RandomRoomIds`].
pub const ROOM_ID_LEN: usize = 8;

/// Supplies candidate room identifiers.
///
/// Candidates need not be unique; the registry rejects collisions and asks
/// again.
pub trait RoomIdSource: Debug + Send + Sync {
    /// Returns the next candidate identifier.
    fn next_id(&self) -> String;
}

/// Random alphanumeric identifiers, hard to guess.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomRoomIds;

impl RoomIdSource for RandomRoomIds {
    fn next_id(&self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(ROOM_ID_LEN)
            .map(char::from)
            .collect()
    }
}
