use thiserror::Error;

use crate::moves::CastleSide;
use crate::piece::PieceType;
use crate::square::Square;

/// Everything a command against the board or game can be refused for.
///
/// None of these leave the game in a changed state: commands validate before
/// mutating, and trial moves are reverted before the error is returned.
#[derive(Debug, Error)]
pub enum ChessError {
    #[error("coordinates ({x}, {y}) are off the board")]
    InvalidCoordinate { x: i32, y: i32 },

    #[error("there is no piece at {0}")]
    NoPieceAtSquare(Square),

    #[error("the piece at {0} belongs to the opponent")]
    WrongColorPiece(Square),

    #[error("select a piece before choosing where to move it")]
    NoPieceSelected,

    #[error("the piece at {from} cannot move to {to}")]
    IllegalDestination { from: Square, to: Square },

    #[error("{0} castling is not possible")]
    CastlingUnavailable(CastleSide),

    #[error("a pawn cannot be promoted to a {0}")]
    InvalidPromotionChoice(PieceType),

    #[error("no promotion is pending")]
    NoPromotionPending,

    #[error("the pawn on {0} must be promoted first")]
    PromotionPending(Square),

    #[error("no turn to undo")]
    NothingToUndo,

    #[error("no turn to redo")]
    NothingToRedo,

    #[error("no legal moves available")]
    NoLegalMoves,

    #[error("the side to move is not a computer player")]
    NotComputerPlayer,

    #[error("the game is already over")]
    GameOver,

    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}
