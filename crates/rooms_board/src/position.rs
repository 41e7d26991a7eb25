//! Range-checked board coordinates.

use crate::{BoardError, SIZE};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A position on the board, addressed by row and column (both `0..3`).
///
/// A `Position` can only be built through [`Position::new`] or
/// [`Position::from_index`], so every value is in range. Deserialization
/// goes through [`Position::new`] as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(try_from = "RawPosition")]
#[display("({row}, {col})")]
pub struct Position {
    row: usize,
    col: usize,
}

/// Unchecked wire form of a [`Position`].
#[derive(Deserialize)]
struct RawPosition {
    row: usize,
    col: usize,
}

impl TryFrom<RawPosition> for Position {
    type Error = BoardError;

    fn try_from(raw: RawPosition) -> Result<Self, Self::Error> {
        Self::new(raw.row, raw.col)
    }
}

impl Position {
    /// Creates a position from a row and column.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::OutOfRange`] if either coordinate is `>= 3`.
    #[instrument]
    pub fn new(row: usize, col: usize) -> Result<Self, BoardError> {
        if row >= SIZE || col >= SIZE {
            return Err(BoardError::OutOfRange { row, col });
        }
        Ok(Self { row, col })
    }

    /// Creates a position from a row-major board index (0-8).
    pub fn from_index(index: usize) -> Option<Self> {
        (index < SIZE * SIZE).then(|| Self {
            row: index / SIZE,
            col: index % SIZE,
        })
    }

    /// Converts position to board index (0-8).
    pub fn index(self) -> usize {
        self.row * SIZE + self.col
    }

    /// Row of this position.
    pub fn row(self) -> usize {
        self.row
    }

    /// Column of this position.
    pub fn col(self) -> usize {
        self.col
    }

    /// All 9 positions in row-major order.
    pub const ALL: [Position; SIZE * SIZE] = [
        Position { row: 0, col: 0 },
        Position { row: 0, col: 1 },
        Position { row: 0, col: 2 },
        Position { row: 1, col: 0 },
        Position { row: 1, col: 1 },
        Position { row: 1, col: 2 },
        Position { row: 2, col: 0 },
        Position { row: 2, col: 1 },
        Position { row: 2, col: 2 },
    ];
}
