//! Session error types.

use crate::RoomId;
use rooms_board::{BoardError, Position};

/// Error returned by a session operation.
///
/// Every variant is raised before the room is mutated, so a failed call
/// leaves the room exactly as it found it.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum SessionError {
    /// No room is registered under the identifier.
    #[display("Room {_0} not found")]
    RoomNotFound(RoomId),

    /// The room has been closed and accepts no further changes.
    #[display("Room {_0} is closed")]
    RoomClosed(RoomId),

    /// The room already has two participants.
    #[display("Room {_0} is full")]
    RoomFull(RoomId),

    /// A participant with this name is already in the room.
    #[display("{_0} is already in the room")]
    DuplicateName(String),

    /// Display names must contain a non-whitespace character.
    #[display("Participant name must not be empty")]
    InvalidName,

    /// Row or column outside the board.
    #[display("Position ({row}, {col}) is out of range")]
    OutOfRange {
        /// Requested row.
        row: i64,
        /// Requested column.
        col: i64,
    },

    /// The target cell already holds a mark.
    #[display("Cell {_0} is already occupied")]
    CellOccupied(Position),

    /// The room's outcome is already decided.
    #[display("Game is already over")]
    GameOver,

    /// The caller is not on the room's roster.
    #[display("{_0} is not a participant in this room")]
    NotInRoom(String),

    /// Another participant holds the turn.
    #[display("Not your turn. Waiting for {_0}")]
    NotYourTurn(String),

    /// The room still waits for its second participant.
    #[display("Waiting for an opponent to join")]
    AwaitingOpponent,

    /// The identifier source kept returning identifiers already in use.
    #[display("Could not allocate a unique room identifier after {_0} attempts")]
    IdSpaceExhausted(usize),
}

impl std::error::Error for SessionError {}

impl SessionError {
    /// Stable snake_case name of the error kind.
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

impl From<BoardError> for SessionError {
    fn from(err: BoardError) -> Self {
        match err {
            BoardError::OutOfRange { row, col } => SessionError::OutOfRange {
                row: i64::try_from(row).unwrap_or(i64::MAX),
                col: i64::try_from(col).unwrap_or(i64::MAX),
            },
            BoardError::CellOccupied(pos) => SessionError::CellOccupied(pos),
        }
    }
}
