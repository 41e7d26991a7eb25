//! Pure board logic for two-player tic-tac-toe rooms.
//!
//! This crate holds everything about the 3x3 grid that does not depend on
//! who the participants are or how rooms are shared between threads:
//!
//! - [`Mark`] and [`Square`]: what a cell can contain
//! - [`Position`]: a range-checked (row, col) pair
//! - [`Board`]: the grid itself, with monotonic placement
//! - [`rules`]: win and draw evaluation, combined into a [`Verdict`]
//!
//! # Example
//!
//! ```
//! use rooms_board::{Board, Mark, Position, Verdict};
//!
//! let mut board = Board::new();
//! for col in 0..3 {
//!     let pos = Position::new(0, col).unwrap();
//!     board.place(pos, Mark::X).unwrap();
//! }
//! assert!(board.has_win(Mark::X));
//! assert_eq!(rooms_board::rules::evaluate(&board, Mark::X), Verdict::Win);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod position;
pub mod rules;
mod types;

pub use position::Position;
pub use rules::Verdict;
pub use types::{Board, BoardError, Mark, Square};

/// Number of rows and columns on the board.
pub const SIZE: usize = 3;
