use serde::{Deserialize, Serialize};

use crate::error::ChessError;
use crate::moves::{CastleSide, Move};
use crate::piece::{Color, Piece, PieceType};
use crate::square::Square;

/// Everything needed to take back a move applied with [`Board::make_move`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MoveUndo {
    pub from: Square,
    pub to: Square,
    pub captured: Option<Piece>,
    /// Where the captured piece stood. Differs from `to` only for en passant.
    pub captured_at: Square,
    mover_was_moved: bool,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct Board {
    /// Indexed `[y][x]`.
    pub squares: [[Option<Piece>; 8]; 8],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create an empty board with no pieces. Useful for setting up test positions.
    pub fn empty() -> Self {
        Board {
            squares: [[None; 8]; 8],
        }
    }

    /// A board holding the standard starting position.
    pub fn new() -> Self {
        let mut board = Board::empty();
        board.create_pieces();
        board
    }

    /// Reset to the standard starting position. Black starts on `y = 0`,
    /// White on `y = 7`.
    pub fn create_pieces(&mut self) {
        const BACK_RANK: [PieceType; 8] = [
            PieceType::Rook,
            PieceType::Knight,
            PieceType::Bishop,
            PieceType::Queen,
            PieceType::King,
            PieceType::Bishop,
            PieceType::Knight,
            PieceType::Rook,
        ];

        self.squares = [[None; 8]; 8];
        for color in [Color::Black, Color::White] {
            let home = color.home_rank();
            let pawns = color.pawn_start_rank();
            for (x, &pt) in BACK_RANK.iter().enumerate() {
                self.squares[home][x] = Some(Piece::new(pt, color));
                self.squares[pawns][x] = Some(Piece::new(PieceType::Pawn, color));
            }
        }
    }

    // =========================================================================
    // Square access
    // =========================================================================

    /// Read-only view of the grid, indexed `[y][x]`.
    pub fn grid(&self) -> &[[Option<Piece>; 8]; 8] {
        &self.squares
    }

    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.y()][sq.x()]
    }

    pub fn piece_mut(&mut self, sq: Square) -> Option<&mut Piece> {
        self.squares[sq.y()][sq.x()].as_mut()
    }

    pub fn place(&mut self, sq: Square, piece: Option<Piece>) {
        self.squares[sq.y()][sq.x()] = piece;
    }

    pub fn take(&mut self, sq: Square) -> Option<Piece> {
        self.squares[sq.y()][sq.x()].take()
    }

    /// Every occupied square with its piece, row by row.
    pub fn occupied(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| self.piece_at(sq).map(|p| (sq, p)))
    }

    pub fn find_king(&self, color: Color) -> Option<Square> {
        self.occupied()
            .find(|(_, p)| p.is(PieceType::King, color))
            .map(|(sq, _)| sq)
    }

    // =========================================================================
    // Move generation
    // =========================================================================

    /// Pseudo-legal destinations for `piece` standing on `from`: legal by the
    /// piece's movement and board occupancy, without the king-safety filter.
    pub fn legal_destinations(&self, piece: &Piece, from: Square) -> Vec<Square> {
        let mut out = Vec::new();
        match piece.piece_type {
            PieceType::Pawn => self.generate_pawn_destinations(piece, from, &mut out),
            PieceType::Knight | PieceType::King => {
                self.generate_step_destinations(piece, from, &mut out)
            }
            PieceType::Rook | PieceType::Bishop | PieceType::Queen => {
                self.generate_sliding_destinations(piece, from, &mut out)
            }
        }
        out
    }

    /// All pseudo-legal moves for `color`.
    pub fn generate_moves(&self, color: Color) -> Vec<Move> {
        let mut moves = Vec::new();
        for (from, piece) in self.occupied() {
            if piece.color != color {
                continue;
            }
            for to in self.legal_destinations(&piece, from) {
                moves.push(Move::new(from, to));
            }
        }
        moves
    }

    fn generate_pawn_destinations(&self, piece: &Piece, from: Square, out: &mut Vec<Square>) {
        let dir = piece.color.pawn_direction();

        // Pushes
        if let Some(one) = from.offset(0, dir) {
            if self.piece_at(one).is_none() {
                out.push(one);
                if from.y() == piece.color.pawn_start_rank() {
                    if let Some(two) = from.offset(0, 2 * dir) {
                        if self.piece_at(two).is_none() {
                            out.push(two);
                        }
                    }
                }
            }
        }

        // Captures
        for dx in [-1, 1] {
            if let Some(diag) = from.offset(dx, dir) {
                if self.is_enemy(diag, piece.color) {
                    out.push(diag);
                }
            }
        }

        if let Some(ep) = piece.en_passant {
            out.push(ep);
        }
    }

    fn generate_step_destinations(&self, piece: &Piece, from: Square, out: &mut Vec<Square>) {
        for &(dx, dy) in piece.step_offsets() {
            if let Some(to) = from.offset(dx, dy) {
                if !self.is_friend(to, piece.color) {
                    out.push(to);
                }
            }
        }
    }

    fn generate_sliding_destinations(&self, piece: &Piece, from: Square, out: &mut Vec<Square>) {
        for &(dx, dy) in piece.slide_directions() {
            let mut cursor = from.offset(dx, dy);
            while let Some(to) = cursor {
                if let Some(p) = self.piece_at(to) {
                    if p.color != piece.color {
                        out.push(to);
                    }
                    break;
                }
                out.push(to);
                cursor = to.offset(dx, dy);
            }
        }
    }

    fn is_enemy(&self, sq: Square, color: Color) -> bool {
        self.piece_at(sq).map(|p| p.color != color).unwrap_or(false)
    }

    fn is_friend(&self, sq: Square, color: Color) -> bool {
        self.piece_at(sq).map(|p| p.color == color).unwrap_or(false)
    }

    // =========================================================================
    // Check detection
    // =========================================================================

    /// Squares `piece` on `from` attacks. Pawns attack their forward diagonals
    /// whether or not anything stands there; every other piece attacks its
    /// pseudo-legal destinations.
    pub fn attack_squares(&self, piece: &Piece, from: Square) -> Vec<Square> {
        match piece.piece_type {
            PieceType::Pawn => {
                let dir = piece.color.pawn_direction();
                [-1, 1]
                    .iter()
                    .filter_map(|&dx| from.offset(dx, dir))
                    .collect()
            }
            _ => self.legal_destinations(piece, from),
        }
    }

    pub fn is_square_attacked_by(&self, target: Square, attacker: Color) -> bool {
        self.occupied()
            .filter(|(_, p)| p.color == attacker)
            .any(|(from, p)| self.attack_squares(&p, from).contains(&target))
    }

    /// Whether `color`'s king is attacked. A board without that king is never in check.
    pub fn in_check(&self, color: Color) -> bool {
        match self.find_king(color) {
            Some(king) => self.in_check_at(color, king),
            None => false,
        }
    }

    /// Whether `position` is attacked by `color`'s opponent, as if `color`'s
    /// king stood there.
    pub fn in_check_at(&self, color: Color, position: Square) -> bool {
        self.is_square_attacked_by(position, color.opposite())
    }

    /// True iff no pseudo-legal move of `color` gets it out of (or keeps it
    /// out of) check. Does not test whether `color` is in check now: with
    /// [`Board::in_check`] it tells checkmate from stalemate.
    ///
    /// Every trial move is reverted, so the board is unchanged afterwards.
    pub fn in_check_mate(&mut self, color: Color) -> bool {
        for mv in self.generate_moves(color) {
            if let Ok(undo) = self.make_move(mv.from, mv.to) {
                let still_in_check = self.in_check(color);
                self.unmake_move(undo);
                if !still_in_check {
                    return false;
                }
            }
        }
        true
    }

    // =========================================================================
    // Applying and reverting moves
    // =========================================================================

    /// Relocate the piece on `from` to `to` and mark it moved. A pawn moving
    /// onto its en-passant square captures the pawn beside it instead of
    /// whatever is on `to`.
    pub fn make_move(&mut self, from: Square, to: Square) -> Result<MoveUndo, ChessError> {
        let mut piece = self.take(from).ok_or(ChessError::NoPieceAtSquare(from))?;

        let captured_at = if piece.piece_type == PieceType::Pawn
            && piece.en_passant == Some(to)
            && self.piece_at(to).is_none()
        {
            Square::at(to.x(), from.y())
        } else {
            to
        };
        let captured = self.take(captured_at);

        let undo = MoveUndo {
            from,
            to,
            captured,
            captured_at,
            mover_was_moved: piece.moved,
        };
        piece.moved = true;
        self.place(to, Some(piece));
        Ok(undo)
    }

    /// Exact inverse of the [`Board::make_move`] call that produced `undo`.
    pub fn unmake_move(&mut self, undo: MoveUndo) {
        if let Some(mut piece) = self.take(undo.to) {
            piece.moved = undo.mover_was_moved;
            self.place(undo.from, Some(piece));
        }
        self.place(undo.captured_at, undo.captured);
    }

    // =========================================================================
    // Castling
    // =========================================================================

    /// Neither king nor rook has moved, the squares between them are empty and
    /// the king does not start on, cross, or land on an attacked square.
    pub fn can_castle(&self, color: Color, side: CastleSide) -> bool {
        let home = color.home_rank();
        let unmoved = |x: usize, pt: PieceType| {
            self.piece_at(Square::at(x, home))
                .map(|p| p.is(pt, color) && !p.moved)
                .unwrap_or(false)
        };
        if !unmoved(4, PieceType::King) || !unmoved(side.rook_file(), PieceType::Rook) {
            return false;
        }

        if side
            .between_files()
            .iter()
            .any(|&x| self.piece_at(Square::at(x, home)).is_some())
        {
            return false;
        }

        !side
            .king_path_files()
            .iter()
            .any(|&x| self.in_check_at(color, Square::at(x, home)))
    }

    /// Castle if possible, moving king and rook together. Returns `false` and
    /// leaves the board untouched otherwise.
    pub fn castle(&mut self, color: Color, side: CastleSide) -> bool {
        if !self.can_castle(color, side) {
            return false;
        }
        let home = color.home_rank();
        let king = self.make_move(Square::at(4, home), Square::at(side.king_target_file(), home));
        let rook = self.make_move(
            Square::at(side.rook_file(), home),
            Square::at(side.rook_target_file(), home),
        );
        king.is_ok() && rook.is_ok()
    }

    pub fn castle_kingside(&mut self, color: Color) -> bool {
        self.castle(color, CastleSide::Kingside)
    }

    pub fn castle_queenside(&mut self, color: Color) -> bool {
        self.castle(color, CastleSide::Queenside)
    }

    // =========================================================================
    // Promotion and en passant
    // =========================================================================

    /// A pawn stands on its far rank.
    pub fn needs_promotion(&self, sq: Square) -> bool {
        self.piece_at(sq)
            .map(|p| p.piece_type == PieceType::Pawn && sq.y() == p.color.promotion_rank())
            .unwrap_or(false)
    }

    /// Replace the pawn on `sq` with a fresh `choice` of the same colour.
    pub fn promote(&mut self, sq: Square, choice: PieceType) -> Result<(), ChessError> {
        if !choice.is_promotion_choice() {
            return Err(ChessError::InvalidPromotionChoice(choice));
        }
        let pawn = self.piece_at(sq).ok_or(ChessError::NoPieceAtSquare(sq))?;
        if !self.needs_promotion(sq) {
            return Err(ChessError::NoPromotionPending);
        }
        self.place(sq, Some(Piece::promoted(choice, pawn.color)));
        Ok(())
    }

    /// Revoke every en-passant grant held by `color`'s pawns.
    pub fn clear_en_passant(&mut self, color: Color) {
        for row in self.squares.iter_mut() {
            for piece in row.iter_mut().flatten() {
                if piece.color == color {
                    piece.en_passant = None;
                }
            }
        }
    }

    /// After the move `from` → `to`, if it was a pawn's two-square advance,
    /// let each enemy pawn beside it capture onto the square it passed over.
    pub fn enable_en_passant(&mut self, from: Square, to: Square) {
        let pawn = match self.piece_at(to) {
            Some(p) if p.piece_type == PieceType::Pawn => p,
            _ => return,
        };
        if (to.y() as i32 - from.y() as i32).abs() != 2 || to.x() != from.x() {
            return;
        }

        let passed = Square::at(to.x(), (from.y() + to.y()) / 2);
        for dx in [-1, 1] {
            if let Some(beside) = to.offset(dx, 0) {
                if let Some(p) = self.piece_mut(beside) {
                    if p.is(PieceType::Pawn, pawn.color.opposite()) {
                        p.en_passant = Some(passed);
                    }
                }
            }
        }
    }

    // =========================================================================
    // Draw support
    // =========================================================================

    /// Canonical description of the piece placement, used to count repetitions.
    pub fn signature(&self) -> String {
        self.occupied()
            .map(|(sq, p)| format!("{}{}{}", p.code(), sq.x(), sq.y()))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Neither side can force mate: no rooks, queens or pawns, and each side
    /// has at most one bishop or at most two knights, never a mix.
    pub fn has_insufficient_material(&self) -> bool {
        let mut bishops = [0u32; 2];
        let mut knights = [0u32; 2];
        for (_, p) in self.occupied() {
            let side = match p.color {
                Color::White => 0,
                Color::Black => 1,
            };
            match p.piece_type {
                PieceType::Rook | PieceType::Pawn | PieceType::Queen => return false,
                PieceType::Bishop => bishops[side] += 1,
                PieceType::Knight => knights[side] += 1,
                PieceType::King => {}
            }
        }
        (0..2).all(|side| {
            bishops[side] <= 1 && knights[side] <= 2 && !(bishops[side] > 0 && knights[side] > 0)
        })
    }
}
