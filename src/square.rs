use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ChessError;

/// A square on the 8×8 board.
///
/// `x` runs left to right (file), `y` top to bottom: `y = 0` is Black's home
/// rank and `y = 7` is White's.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
#[serde(try_from = "RawSquare")]
pub struct Square {
    x: u8,
    y: u8,
}

/// Unchecked wire form, validated on the way in.
#[derive(Deserialize)]
struct RawSquare {
    x: i32,
    y: i32,
}

impl TryFrom<RawSquare> for Square {
    type Error = ChessError;

    fn try_from(raw: RawSquare) -> Result<Self, Self::Error> {
        Square::new(raw.x, raw.y)
    }
}

impl Square {
    /// Validate external coordinates. Out-of-range values are rejected, never clamped.
    pub fn new(x: i32, y: i32) -> Result<Square, ChessError> {
        if Self::in_bounds(x, y) {
            Ok(Square { x: x as u8, y: y as u8 })
        } else {
            Err(ChessError::InvalidCoordinate { x, y })
        }
    }

    /// Build a square from coordinates already known to be on the board.
    pub(crate) const fn at(x: usize, y: usize) -> Square {
        debug_assert!(x < 8 && y < 8);
        Square { x: x as u8, y: y as u8 }
    }

    pub fn x(self) -> usize {
        self.x as usize
    }

    pub fn y(self) -> usize {
        self.y as usize
    }

    fn in_bounds(x: i32, y: i32) -> bool {
        (0..8).contains(&x) && (0..8).contains(&y)
    }

    /// The square `(dx, dy)` away, or `None` if that falls off the board.
    pub fn offset(self, dx: i32, dy: i32) -> Option<Square> {
        let x = self.x as i32 + dx;
        let y = self.y as i32 + dy;
        if Self::in_bounds(x, y) {
            Some(Square { x: x as u8, y: y as u8 })
        } else {
            None
        }
    }

    /// All 64 squares, row by row from `y = 0`.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..8u8).flat_map(|y| (0..8u8).map(move |x| Square { x, y }))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
