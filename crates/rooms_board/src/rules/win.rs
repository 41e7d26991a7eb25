//! Win detection.

use crate::{Board, Mark, Position, Square};
use tracing::instrument;

/// Every line that wins: rows, then columns, then the two diagonals.
const LINES: [[(usize, usize); 3]; 8] = [
    // Rows
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    // Columns
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    // Diagonals
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

/// Checks whether `mark` holds a full row, column or diagonal.
#[instrument(skip(board))]
pub fn has_win(board: &Board, mark: Mark) -> bool {
    let target = Square::Occupied(mark);
    LINES.iter().any(|line| {
        line.iter().all(|&(row, col)| {
            Position::new(row, col).is_ok_and(|pos| board.get(pos) == target)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with(marks: &[(usize, usize, Mark)]) -> Board {
        let mut board = Board::new();
        for &(row, col, mark) in marks {
            board.place(Position::new(row, col).unwrap(), mark).unwrap();
        }
        board
    }

    #[test]
    fn test_no_winner_empty_board() {
        let board = Board::new();
        assert!(!has_win(&board, Mark::X));
        assert!(!has_win(&board, Mark::O));
    }

    #[test]
    fn test_winner_top_row() {
        let board = board_with(&[(0, 0, Mark::X), (0, 1, Mark::X), (0, 2, Mark::X)]);
        assert!(has_win(&board, Mark::X));
        assert!(!has_win(&board, Mark::O));
    }

    #[test]
    fn test_winner_column() {
        let board = board_with(&[(0, 2, Mark::O), (1, 2, Mark::O), (2, 2, Mark::O)]);
        assert!(has_win(&board, Mark::O));
    }

    #[test]
    fn test_winner_anti_diagonal() {
        let board = board_with(&[(0, 2, Mark::O), (1, 1, Mark::O), (2, 0, Mark::O)]);
        assert!(has_win(&board, Mark::O));
    }

    #[test]
    fn test_mixed_line_is_not_a_win() {
        let board = board_with(&[(0, 0, Mark::X), (0, 1, Mark::O), (0, 2, Mark::X)]);
        assert!(!has_win(&board, Mark::X));
    }
}
