//! Game rules for the board.
//!
//! Pure functions over [`Board`](crate::Board). Rules are kept apart from
//! board storage so the room layer can combine them in the order it needs:
//! a win for the mark just placed first, then a draw.

pub mod draw;
pub mod win;

pub use draw::is_full;
pub use win::has_win;

use crate::{Board, Mark};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// What a placement did to the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// No line completed and empty squares remain.
    Continue,
    /// The mark just placed completed a line.
    Win,
    /// The board is full and the last placement completed no line.
    Draw,
}

/// Evaluates the board after `last` was placed.
///
/// Only `last` is checked for a win: a placement can only complete a line
/// for its own mark.
#[instrument(skip(board))]
pub fn evaluate(board: &Board, last: Mark) -> Verdict {
    if has_win(board, last) {
        Verdict::Win
    } else if is_full(board) {
        Verdict::Draw
    } else {
        Verdict::Continue
    }
}

impl Board {
    /// True iff a row, column or diagonal is entirely `mark`.
    pub fn has_win(&self, mark: Mark) -> bool {
        has_win(self, mark)
    }

    /// True iff no empty square remains.
    pub fn is_full(&self) -> bool {
        is_full(self)
    }
}
