//! Shadow buffer of the last color sent to (or assumed on) each key.

use crate::grid::{Color, GridCoord};
use crate::{COLUMNS, ROWS};

/// Last known color of every key, indexed `[row][column]`.
///
/// Wire commands carry column before row; only [`GridCoord`] crosses that
/// boundary, so the array order never leaks into the protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorCache {
    cells: [[Color; COLUMNS]; ROWS],
}

impl ColorCache {
    /// An all-black cache.
    pub fn new() -> Self {
        Self {
            cells: [[Color::BLACK; COLUMNS]; ROWS],
        }
    }

    /// Set every entry back to black.
    pub fn reset(&mut self) {
        self.cells = [[Color::BLACK; COLUMNS]; ROWS];
    }

    pub fn get(&self, coord: GridCoord) -> Color {
        self.cells[coord.row() as usize][coord.column() as usize]
    }

    pub fn set(&mut self, coord: GridCoord, color: Color) {
        self.cells[coord.row() as usize][coord.column() as usize] = color;
    }

    /// Non-black entries in row-major order.
    pub fn lit(&self) -> impl Iterator<Item = (GridCoord, Color)> + '_ {
        GridCoord::all()
            .map(move |coord| (coord, self.get(coord)))
            .filter(|(_, color)| !color.is_black())
    }

    pub fn is_blank(&self) -> bool {
        self.lit().next().is_none()
    }
}

impl Default for ColorCache {
    fn default() -> Self {
        Self::new()
    }
}
