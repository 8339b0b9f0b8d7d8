use std::fmt;

use serde::{Deserialize, Serialize};

use crate::square::Square;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Forward direction along `y` for this colour's pawns.
    pub fn pawn_direction(self) -> i32 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    /// Rank the king and rooks start on.
    pub fn home_rank(self) -> usize {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    pub fn pawn_start_rank(self) -> usize {
        match self {
            Color::White => 6,
            Color::Black => 1,
        }
    }

    /// Rank on which this colour's pawns promote.
    pub fn promotion_rank(self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub enum PieceType {
    Pawn,
    Rook,
    Bishop,
    Knight,
    Queen,
    King,
}

impl PieceType {
    /// Single-letter code used in position signatures.
    pub fn code(self) -> char {
        match self {
            PieceType::Pawn => 'P',
            PieceType::Rook => 'R',
            PieceType::Bishop => 'B',
            PieceType::Knight => 'N',
            PieceType::Queen => 'Q',
            PieceType::King => 'K',
        }
    }

    /// Pieces a pawn may turn into.
    pub fn is_promotion_choice(self) -> bool {
        matches!(
            self,
            PieceType::Queen | PieceType::Rook | PieceType::Bishop | PieceType::Knight
        )
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PieceType::Pawn => "pawn",
            PieceType::Rook => "rook",
            PieceType::Bishop => "bishop",
            PieceType::Knight => "knight",
            PieceType::Queen => "queen",
            PieceType::King => "king",
        };
        f.write_str(name)
    }
}

pub const KNIGHT_OFFSETS: [(i32, i32); 8] = [
    (2, 1), (2, -1), (1, 2), (1, -2),
    (-2, 1), (-2, -1), (-1, 2), (-1, -2),
];

pub const KING_OFFSETS: [(i32, i32); 8] = [
    (0, -1), (0, 1), (1, -1), (1, 1),
    (1, 0), (-1, -1), (-1, 1), (-1, 0),
];

pub const ORTHOGONAL: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
pub const DIAGONAL: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct Piece {
    pub piece_type: PieceType,
    pub color: Color,
    /// Set the first time the piece is relocated. Gates castling.
    pub moved: bool,
    /// Pawns only: the square this pawn may capture onto en passant this turn.
    pub en_passant: Option<Square>,
}

impl Piece {
    pub fn new(piece_type: PieceType, color: Color) -> Self {
        Piece {
            piece_type,
            color,
            moved: false,
            en_passant: None,
        }
    }

    /// A piece installed by promotion counts as already moved.
    pub fn promoted(piece_type: PieceType, color: Color) -> Self {
        Piece {
            moved: true,
            ..Piece::new(piece_type, color)
        }
    }

    pub fn is(&self, piece_type: PieceType, color: Color) -> bool {
        self.piece_type == piece_type && self.color == color
    }

    /// Stepping offsets for knights and kings, empty for everything else.
    pub fn step_offsets(&self) -> &'static [(i32, i32)] {
        match self.piece_type {
            PieceType::Knight => &KNIGHT_OFFSETS,
            PieceType::King => &KING_OFFSETS,
            _ => &[],
        }
    }

    /// Ray directions for sliding pieces, empty for everything else.
    pub fn slide_directions(&self) -> &'static [(i32, i32)] {
        const QUEEN: [(i32, i32); 8] = [
            (1, 0), (-1, 0), (0, 1), (0, -1),
            (1, 1), (1, -1), (-1, 1), (-1, -1),
        ];
        match self.piece_type {
            PieceType::Rook => &ORTHOGONAL,
            PieceType::Bishop => &DIAGONAL,
            PieceType::Queen => &QUEEN,
            _ => &[],
        }
    }

    /// Signature fragment: colour initial followed by the type code, e.g. `wN`.
    pub fn code(&self) -> String {
        let c = match self.color {
            Color::White => 'w',
            Color::Black => 'b',
        };
        format!("{c}{}", self.piece_type.code())
    }
}
