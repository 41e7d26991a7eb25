//! Core domain types for the board.

use crate::{Position, SIZE};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Mark placed by a participant.
///
/// The first participant in a room plays `X`, the second plays `O`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum Mark {
    /// First mark (room creator).
    X,
    /// Second mark (joining participant).
    O,
}

impl Mark {
    /// Returns the other mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

/// A square on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Square {
    /// Empty square.
    #[default]
    Empty,
    /// Square occupied by a mark.
    Occupied(Mark),
}

impl Square {
    /// Returns the mark in this square, if any.
    pub fn mark(self) -> Option<Mark> {
        match self {
            Square::Empty => None,
            Square::Occupied(mark) => Some(mark),
        }
    }

    /// Text symbol for this square; empty squares render as `""`.
    pub fn symbol(self) -> &'static str {
        match self {
            Square::Empty => "",
            Square::Occupied(Mark::X) => "X",
            Square::Occupied(Mark::O) => "O",
        }
    }
}

/// Errors raised by board operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum BoardError {
    /// Row or column outside `0..3`.
    #[display("Position ({row}, {col}) is out of range")]
    OutOfRange {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
    },

    /// The target square already holds a mark.
    #[display("Cell {_0} is already occupied")]
    CellOccupied(Position),
}

impl std::error::Error for BoardError {}

/// 3x3 board.
///
/// Once a square is occupied it stays occupied: [`Board::place`] is the
/// only mutator and it refuses occupied squares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// Squares in row-major order (0-8).
    squares: [Square; SIZE * SIZE],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the square at the given position.
    pub fn get(&self, pos: Position) -> Square {
        self.squares[pos.index()]
    }

    /// Checks if a square is empty.
    pub fn is_empty(&self, pos: Position) -> bool {
        self.get(pos) == Square::Empty
    }

    /// Places `mark` at `pos`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::CellOccupied`] if the square already holds a mark.
    #[instrument(skip(self))]
    pub fn place(&mut self, pos: Position, mark: Mark) -> Result<(), BoardError> {
        if !self.is_empty(pos) {
            return Err(BoardError::CellOccupied(pos));
        }
        self.squares[pos.index()] = Square::Occupied(mark);
        Ok(())
    }

    /// Returns all squares in row-major order.
    pub fn squares(&self) -> &[Square; SIZE * SIZE] {
        &self.squares
    }

    /// Returns the board as rows of squares.
    pub fn rows(&self) -> [[Square; SIZE]; SIZE] {
        let mut rows = [[Square::Empty; SIZE]; SIZE];
        for pos in Position::ALL {
            rows[pos.row()][pos.col()] = self.get(pos);
        }
        rows
    }

    /// Number of occupied squares.
    pub fn occupied(&self) -> usize {
        self.squares.iter().filter(|s| **s != Square::Empty).count()
    }

    /// True if every occupied square of `earlier` holds the same mark here.
    ///
    /// Used to check that a board only ever gains marks.
    pub fn extends(&self, earlier: &Board) -> bool {
        earlier
            .squares
            .iter()
            .zip(self.squares.iter())
            .all(|(before, after)| *before == Square::Empty || before == after)
    }

    /// Formats the board as a human-readable string.
    pub fn render(&self) -> String {
        let mut result = String::new();
        for (r, row) in self.rows().iter().enumerate() {
            let cells: Vec<&str> = row
                .iter()
                .map(|sq| match sq {
                    Square::Empty => ".",
                    occupied => occupied.symbol(),
                })
                .collect();
            result.push_str(&cells.join("|"));
            if r < SIZE - 1 {
                result.push_str("\n-+-+-\n");
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(row: usize, col: usize) -> Position {
        Position::new(row, col).unwrap()
    }

    #[test]
    fn test_place_rejects_occupied() {
        let mut board = Board::new();
        board.place(pos(1, 1), Mark::X).unwrap();
        let err = board.place(pos(1, 1), Mark::O).unwrap_err();
        assert_eq!(err, BoardError::CellOccupied(pos(1, 1)));
        assert_eq!(board.get(pos(1, 1)), Square::Occupied(Mark::X));
    }

    #[test]
    fn test_rows_are_row_major() {
        let mut board = Board::new();
        board.place(pos(0, 2), Mark::X).unwrap();
        board.place(pos(2, 0), Mark::O).unwrap();
        let rows = board.rows();
        assert_eq!(rows[0][2], Square::Occupied(Mark::X));
        assert_eq!(rows[2][0], Square::Occupied(Mark::O));
        assert_eq!(board.occupied(), 2);
    }

    #[test]
    fn test_extends_detects_reverted_square() {
        let mut earlier = Board::new();
        earlier.place(pos(0, 0), Mark::X).unwrap();

        let mut later = earlier.clone();
        later.place(pos(0, 1), Mark::O).unwrap();
        assert!(later.extends(&earlier));
        assert!(!Board::new().extends(&earlier));
    }

    #[test]
    fn test_render() {
        let mut board = Board::new();
        board.place(pos(0, 0), Mark::X).unwrap();
        board.place(pos(1, 1), Mark::O).unwrap();
        assert_eq!(board.render(), "X|.|.\n-+-+-\n.|O|.\n-+-+-\n.|.|.");
    }

    #[test]
    fn test_opponent() {
        assert_eq!(Mark::X.opponent(), Mark::O);
        assert_eq!(Mark::O.opponent(), Mark::X);
        assert_eq!(Mark::X.to_string(), "X");
    }
}
