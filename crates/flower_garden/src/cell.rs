use std::fmt::{self, Display, Formatter};

use bevy::prelude::*;

/// A discrete location on the board, compared by value.
///
/// Coordinates are signed so that points outside the board still map to a
/// cell; the board decides whether that cell is in bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<IVec2> for Cell {
    fn from(v: IVec2) -> Self {
        Self::new(v.x, v.y)
    }
}

impl From<Cell> for IVec2 {
    fn from(cell: Cell) -> Self {
        Self::new(cell.x, cell.y)
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_compare_by_value() {
        let a = Cell::new(2, 2);
        let b = Cell::from(IVec2::new(2, 2));
        assert_eq!(a, b, "cells with equal coordinates must be equal");
        assert_ne!(a, Cell::new(2, 1), "different rows must not compare equal");
    }

    #[test]
    fn display_shows_coordinates() {
        assert_eq!(Cell::new(-1, 3).to_string(), "(-1, 3)", "unexpected format");
    }
}
