use itertools::Itertools;
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fmt, ops::Deref};

pub const EMPTY: u8 = 0;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Mark {
    First = 1,
    Second = 2,
}

/// Where a disc landed. Row 0 is the bottom of the board.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

/// A `size_y x size_x` grid filled bottom-up, one column at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: Array2<u8>,
}

impl Mark {
    pub fn other(self) -> Self {
        match self {
            Self::First => Mark::Second,
            Self::Second => Mark::First,
        }
    }
    pub fn as_cell(self) -> u8 {
        self as u8
    }
    /// Slot of this mark in per-player arrays.
    pub fn index(self) -> usize {
        self as usize - 1
    }
    /// The mark whose turn it is after `plies` half-moves.
    pub fn to_move(plies: usize) -> Self {
        if plies % 2 == 0 {
            Mark::First
        } else {
            Mark::Second
        }
    }
    pub fn as_char(self) -> char {
        match self {
            Self::First => 'X',
            Self::Second => 'O',
        }
    }
}

impl Deref for Board {
    type Target = Array2<u8>;
    fn deref(&self) -> &Self::Target {
        &self.cells
    }
}

impl From<Array2<u8>> for Board {
    fn from(cells: Array2<u8>) -> Self {
        Board { cells }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in self.cells.outer_iter().rev() {
            writeln!(f, "| {} |", row.iter().map(|&cell| cell_char(cell)).join(" "))?;
        }
        write!(f, "+{}+", "-".repeat(self.size_x() * 2 + 1))
    }
}

fn cell_char(cell: u8) -> char {
    match cell {
        1 => Mark::First.as_char(),
        2 => Mark::Second.as_char(),
        _ => '.',
    }
}

impl Board {
    pub fn new(size_x: usize, size_y: usize) -> Self {
        Board {
            cells: Array2::zeros((size_y, size_x)),
        }
    }

    /// Builds a board from bottom-first rows of cell values.
    pub fn from_rows(rows: &[Vec<u8>]) -> Result<Self, ndarray::ShapeError> {
        let size_x = rows.first().map_or(0, Vec::len);
        let flat: Vec<u8> = rows.iter().flatten().copied().collect();
        let cells = Array2::from_shape_vec((rows.len(), size_x), flat)?;
        Ok(Board { cells })
    }

    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.cells.outer_iter().map(|row| row.to_vec()).collect()
    }

    pub fn size_x(&self) -> usize {
        self.cells.ncols()
    }

    pub fn size_y(&self) -> usize {
        self.cells.nrows()
    }

    pub fn column_height(&self, column: usize) -> usize {
        self.cells
            .column(column)
            .iter()
            .take_while(|&&cell| cell != EMPTY)
            .count()
    }

    /// How many discs each column holds.
    pub fn column_heights(&self) -> Vec<usize> {
        (0..self.size_x()).map(|c| self.column_height(c)).collect()
    }

    pub fn is_legal(&self, column: usize) -> bool {
        column < self.size_x() && self.column_height(column) < self.size_y()
    }

    pub fn legal_columns(&self) -> Vec<usize> {
        (0..self.size_x()).filter(|&c| self.is_legal(c)).collect()
    }

    /// Drops a disc into `column`. The column must have room.
    pub fn drop_disc(&mut self, column: usize, mark: Mark) -> Position {
        let row = self.column_height(column);
        assert!(row < self.size_y(), "column {column} is full");
        self.cells[[row, column]] = mark.as_cell();
        Position { row, column }
    }

    pub fn is_full(&self) -> bool {
        (0..self.size_x()).all(|c| self.column_height(c) == self.size_y())
    }

    pub fn plies(&self) -> usize {
        self.cells.iter().filter(|&&cell| cell != EMPTY).count()
    }

    /// Canonical content key: one digit per cell, bottom row first.
    pub fn to_state_key(&self) -> String {
        self.cells
            .iter()
            .map(|&cell| char::from(b'0' + cell))
            .collect::<String>()
    }

    pub fn draw(&self) {
        println!("{self}");
        println!("  {}", (0..self.size_x()).join(" "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discs_fall_to_the_bottom() {
        let mut board = Board::new(3, 2);
        assert_eq!(board.drop_disc(1, Mark::First), Position { row: 0, column: 1 });
        assert_eq!(board.drop_disc(1, Mark::Second), Position { row: 1, column: 1 });
        assert_eq!(board.column_heights(), vec![0, 2, 0]);
        assert_eq!(board.plies(), 2);
    }

    #[test]
    fn full_columns_are_not_legal() {
        let mut board = Board::new(3, 2);
        board.drop_disc(0, Mark::First);
        board.drop_disc(0, Mark::Second);
        assert_eq!(board.legal_columns(), vec![1, 2]);
        assert!(!board.is_legal(0));
        assert!(!board.is_legal(3));
    }

    #[test]
    #[should_panic(expected = "column 0 is full")]
    fn dropping_into_full_column_panics() {
        let mut board = Board::new(1, 1);
        board.drop_disc(0, Mark::First);
        board.drop_disc(0, Mark::Second);
    }

    #[test]
    fn is_full_working() {
        let mut board = Board::new(2, 1);
        assert!(!board.is_full());
        board.drop_disc(0, Mark::First);
        board.drop_disc(1, Mark::Second);
        assert!(board.is_full());
        assert!(board.legal_columns().is_empty());
    }

    #[test]
    fn state_key_reflects_content() {
        let mut a = Board::new(2, 2);
        let mut b = Board::new(2, 2);
        a.drop_disc(0, Mark::First);
        a.drop_disc(1, Mark::Second);
        b.drop_disc(1, Mark::Second);
        b.drop_disc(0, Mark::First);
        assert_eq!(a.to_state_key(), "1200");
        assert_eq!(a.to_state_key(), b.to_state_key());
    }

    #[test]
    fn rows_round_trip() {
        let mut board = Board::new(3, 2);
        board.drop_disc(2, Mark::Second);
        board.drop_disc(2, Mark::First);
        let rows = board.to_rows();
        assert_eq!(rows, vec![vec![0, 0, 2], vec![0, 0, 1]]);
        assert_eq!(Board::from_rows(&rows).unwrap(), board);
    }

    #[test]
    fn marks_alternate() {
        assert_eq!(Mark::First.other(), Mark::Second);
        assert_eq!(Mark::to_move(0), Mark::First);
        assert_eq!(Mark::to_move(3), Mark::Second);
        assert_eq!(Mark::Second.index(), 1);
        assert_eq!(Mark::Second.as_cell(), 2);
    }

    #[test]
    fn display_draws_top_row_first() {
        let mut board = Board::new(2, 2);
        board.drop_disc(0, Mark::First);
        assert_eq!(board.to_string(), "| . . |\n| X . |\n+-----+");
    }
}
