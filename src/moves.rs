use std::fmt;

use serde::{Deserialize, Serialize};

use crate::square::Square;

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct Move {
    pub from: Square,
    pub to: Square,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Move { from, to }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum CastleSide {
    /// With the rook on `x = 0`.
    Queenside,
    /// With the rook on `x = 7`.
    Kingside,
}

impl CastleSide {
    pub fn rook_file(self) -> usize {
        match self {
            CastleSide::Queenside => 0,
            CastleSide::Kingside => 7,
        }
    }

    /// Where the king lands.
    pub fn king_target_file(self) -> usize {
        match self {
            CastleSide::Queenside => 2,
            CastleSide::Kingside => 6,
        }
    }

    /// Where the rook lands.
    pub fn rook_target_file(self) -> usize {
        match self {
            CastleSide::Queenside => 3,
            CastleSide::Kingside => 5,
        }
    }

    /// Files strictly between the king and the rook.
    pub fn between_files(self) -> &'static [usize] {
        match self {
            CastleSide::Queenside => &[1, 2, 3],
            CastleSide::Kingside => &[5, 6],
        }
    }

    /// Files the king stands on, crosses, or lands on. None may be attacked.
    pub fn king_path_files(self) -> &'static [usize] {
        match self {
            CastleSide::Queenside => &[4, 3, 2],
            CastleSide::Kingside => &[4, 5, 6],
        }
    }
}

impl fmt::Display for CastleSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CastleSide::Queenside => write!(f, "queenside"),
            CastleSide::Kingside => write!(f, "kingside"),
        }
    }
}
