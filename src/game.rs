// =============================================================================
// Game orchestration
//
// Drives one half-move at a time through a small state machine:
//
//   AwaitingOrigin --select_origin--> AwaitingDestination
//   AwaitingDestination --select_destination--> (applied) AwaitingOrigin
//                                            |-> AwaitingPromotion --promote--> ...
//                                            |-> Finished
//
// A rejected destination drops back to AwaitingOrigin. The game owns the
// repetition table, the half-move clock and the undo history; the board only
// knows about pieces.
// =============================================================================

use std::collections::HashMap;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::engine::{self, SearchConfig};
use crate::error::ChessError;
use crate::history::{Checkpoint, History};
use crate::moves::{CastleSide, Move};
use crate::piece::{Color, PieceType};
use crate::square::Square;

// =============================================================================
// Configuration
// =============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct GameConfig {
    /// Pre-move snapshots kept for undo. Seven allows three full turns.
    pub undo_capacity: usize,
    /// Half-moves without a capture or pawn move before the game is drawn.
    pub fifty_move_limit: u32,
    /// Occurrences of one placement that draw the game.
    pub repetition_limit: u32,
    pub white_computer: bool,
    pub black_computer: bool,
    pub search: SearchConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GameConfig {
    pub fn new() -> Self {
        GameConfig {
            undo_capacity: 7,
            fifty_move_limit: 100,
            repetition_limit: 3,
            white_computer: false,
            black_computer: false,
            search: SearchConfig::new(),
        }
    }
}

// =============================================================================
// Players and outcomes
// =============================================================================

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct Player {
    pub color: Color,
    /// Display and turn-order label, `"player1"` for White.
    pub label: String,
    pub computer_player: bool,
}

impl Player {
    pub fn new(color: Color, label: &str, computer_player: bool) -> Self {
        Player {
            color,
            label: label.to_string(),
            computer_player,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum DrawReason {
    Stalemate,
    InsufficientMaterial,
    ThreefoldRepetition,
    FiftyMoveRule,
}

impl fmt::Display for DrawReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DrawReason::Stalemate => "stalemate",
            DrawReason::InsufficientMaterial => "insufficient material",
            DrawReason::ThreefoldRepetition => "threefold repetition",
            DrawReason::FiftyMoveRule => "the fifty-move rule",
        };
        f.write_str(text)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum Outcome {
    Checkmate { winner: Color },
    Draw(DrawReason),
    Resigned { winner: Color },
}

impl Outcome {
    pub fn winner(self) -> Option<Color> {
        match self {
            Outcome::Checkmate { winner } | Outcome::Resigned { winner } => Some(winner),
            Outcome::Draw(_) => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Checkmate { winner } => write!(f, "checkmate, {winner} wins"),
            Outcome::Draw(reason) => write!(f, "draw by {reason}"),
            Outcome::Resigned { winner } => write!(f, "{} resigned, {winner} wins", winner.opposite()),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum TurnState {
    AwaitingOrigin,
    AwaitingDestination { from: Square, destinations: Vec<Square> },
    AwaitingPromotion(Square),
    Finished(Outcome),
}

/// What an applied half-move led to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TurnOutcome {
    /// The other side is to move; `check` says whether it is in check.
    Continue { check: bool },
    /// The pawn on this square waits for [`Game::promote`].
    PromotionPending(Square),
    Finished(Outcome),
}

// =============================================================================
// King-safety filter
// =============================================================================

/// Destinations of the piece on `from` that do not leave its own king in
/// check. Each candidate is tried and reverted; the board is unchanged after.
pub fn king_safe_destinations(board: &mut Board, from: Square) -> Vec<Square> {
    let piece = match board.piece_at(from) {
        Some(p) => p,
        None => return Vec::new(),
    };
    board
        .legal_destinations(&piece, from)
        .into_iter()
        .filter(|&to| leaves_king_safe(board, piece.color, from, to))
        .collect()
}

/// Every king-safe move for `color`.
pub fn legal_moves(board: &mut Board, color: Color) -> Vec<Move> {
    board
        .generate_moves(color)
        .into_iter()
        .filter(|mv| leaves_king_safe(board, color, mv.from, mv.to))
        .collect()
}

fn leaves_king_safe(board: &mut Board, color: Color, from: Square, to: Square) -> bool {
    match board.make_move(from, to) {
        Ok(undo) => {
            let safe = !board.in_check(color);
            board.unmake_move(undo);
            safe
        }
        Err(_) => false,
    }
}

// =============================================================================
// Game
// =============================================================================

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct Game {
    config: GameConfig,
    players: [Player; 2],
    board: Board,
    to_move: Color,
    /// Placement signature -> times seen since the last capture or pawn move.
    positions: HashMap<String, u32>,
    halfmove_clock: u32,
    history: History,
    last_moved: Option<Square>,
    state: TurnState,
}

impl Default for Game {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

impl Game {
    /// A fresh game from the standard starting position, White to move.
    pub fn new(config: GameConfig) -> Self {
        Self::with_board(Board::new(), Color::White, config)
    }

    /// A game continuing from an arbitrary position.
    pub fn with_board(board: Board, to_move: Color, config: GameConfig) -> Self {
        let mut positions = HashMap::new();
        positions.insert(board.signature(), 1);
        Game {
            players: [
                Player::new(Color::White, "player1", config.white_computer),
                Player::new(Color::Black, "player2", config.black_computer),
            ],
            history: History::new(config.undo_capacity),
            config,
            board,
            to_move,
            positions,
            halfmove_clock: 0,
            last_moved: None,
            state: TurnState::AwaitingOrigin,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn to_move(&self) -> Color {
        self.to_move
    }

    /// Destination of the most recent half-move, for highlighting.
    pub fn last_moved(&self) -> Option<Square> {
        self.last_moved
    }

    pub fn turn_state(&self) -> &TurnState {
        &self.state
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.state {
            TurnState::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    /// How often the current placement has been seen since the last reset.
    pub fn position_count(&self) -> u32 {
        self.positions.get(&self.board.signature()).copied().unwrap_or(0)
    }

    pub fn players(&self) -> &[Player; 2] {
        &self.players
    }

    pub fn player(&self, color: Color) -> &Player {
        match color {
            Color::White => &self.players[0],
            Color::Black => &self.players[1],
        }
    }

    pub fn current_player(&self) -> &Player {
        self.player(self.to_move)
    }

    pub fn undo_turns_available(&self) -> usize {
        self.history.turns_available()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// King-safe moves for the side to move.
    pub fn legal_moves(&self) -> Vec<Move> {
        let mut scratch = self.board.clone();
        legal_moves(&mut scratch, self.to_move)
    }

    pub fn is_check(&self, color: Color) -> bool {
        self.board.in_check(color)
    }

    pub fn is_checkmate(&self, color: Color) -> bool {
        let mut scratch = self.board.clone();
        scratch.in_check(color) && scratch.in_check_mate(color)
    }

    pub fn is_stalemate(&self, color: Color) -> bool {
        let mut scratch = self.board.clone();
        !scratch.in_check(color) && scratch.in_check_mate(color)
    }

    /// The first draw rule that applies, checked in order: insufficient
    /// material, repetition, the fifty-move rule. Stalemate is reported by
    /// the turn outcome instead.
    pub fn draw_reason(&self) -> Option<DrawReason> {
        if self.board.has_insufficient_material() {
            return Some(DrawReason::InsufficientMaterial);
        }
        if self.positions.values().any(|&n| n >= self.config.repetition_limit) {
            return Some(DrawReason::ThreefoldRepetition);
        }
        if self.halfmove_clock >= self.config.fifty_move_limit {
            return Some(DrawReason::FiftyMoveRule);
        }
        None
    }

    pub fn is_draw(&self) -> bool {
        self.draw_reason().is_some()
    }

    // =========================================================================
    // Turn commands
    // =========================================================================

    /// Pick up the piece on `from`. Returns where it may go; an empty list
    /// leaves the game waiting for another origin.
    pub fn select_origin(&mut self, from: Square) -> Result<Vec<Square>, ChessError> {
        self.ensure_accepting_moves()?;
        let piece = self.board.piece_at(from).ok_or(ChessError::NoPieceAtSquare(from))?;
        if piece.color != self.to_move {
            return Err(ChessError::WrongColorPiece(from));
        }

        let destinations = king_safe_destinations(&mut self.board, from);
        self.state = if destinations.is_empty() {
            TurnState::AwaitingOrigin
        } else {
            TurnState::AwaitingDestination {
                from,
                destinations: destinations.clone(),
            }
        };
        Ok(destinations)
    }

    /// Move the selected piece to `to`. A destination outside the offered set
    /// is rejected and the selection is dropped.
    ///
    /// The offered set held in the turn state is only a view for callers;
    /// legality is recomputed from the board here.
    pub fn select_destination(&mut self, to: Square) -> Result<TurnOutcome, ChessError> {
        self.ensure_accepting_moves()?;
        let from = match &self.state {
            TurnState::AwaitingDestination { from, .. } => *from,
            _ => return Err(ChessError::NoPieceSelected),
        };
        let allowed = match self.board.piece_at(from) {
            Some(p) if p.color == self.to_move => king_safe_destinations(&mut self.board, from).contains(&to),
            _ => false,
        };
        if !allowed {
            self.state = TurnState::AwaitingOrigin;
            return Err(ChessError::IllegalDestination { from, to });
        }
        self.apply(from, to)
    }

    /// [`Game::select_origin`] and [`Game::select_destination`] in one call.
    pub fn attempt_move(&mut self, from: Square, to: Square) -> Result<TurnOutcome, ChessError> {
        let destinations = self.select_origin(from)?;
        if !destinations.contains(&to) {
            self.state = TurnState::AwaitingOrigin;
            return Err(ChessError::IllegalDestination { from, to });
        }
        self.select_destination(to)
    }

    pub fn attempt_castle(&mut self, side: CastleSide) -> Result<TurnOutcome, ChessError> {
        self.ensure_accepting_moves()?;
        let mover = self.to_move;
        if !self.board.can_castle(mover, side) {
            return Err(ChessError::CastlingUnavailable(side));
        }

        let before = self.checkpoint();
        if !self.board.castle(mover, side) {
            return Err(ChessError::CastlingUnavailable(side));
        }
        self.history.record(before);
        self.halfmove_clock += 1;
        self.last_moved = Some(Square::at(side.king_target_file(), mover.home_rank()));
        self.board.clear_en_passant(mover);
        Ok(self.finish_turn())
    }

    /// Complete a promotion paused by a human player's pawn move.
    pub fn promote(&mut self, square: Square, choice: PieceType) -> Result<TurnOutcome, ChessError> {
        match self.state {
            TurnState::Finished(_) => return Err(ChessError::GameOver),
            TurnState::AwaitingPromotion(pending) if pending == square => {}
            _ => return Err(ChessError::NoPromotionPending),
        }
        self.board.promote(square, choice)?;
        Ok(self.finish_turn())
    }

    /// The side to move concedes.
    pub fn resign(&mut self) -> Result<Outcome, ChessError> {
        if let TurnState::Finished(_) = self.state {
            return Err(ChessError::GameOver);
        }
        let outcome = Outcome::Resigned {
            winner: self.to_move.opposite(),
        };
        self.state = TurnState::Finished(outcome);
        Ok(outcome)
    }

    /// Let the search choose and play a move for the side to move.
    pub fn play_computer_turn<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(Move, TurnOutcome), ChessError> {
        self.ensure_accepting_moves()?;
        if !self.current_player().computer_player {
            return Err(ChessError::NotComputerPlayer);
        }
        let pick = engine::pick_move(&self.board, self.to_move, &self.config.search, rng)
            .ok_or(ChessError::NoLegalMoves)?;
        let outcome = self.attempt_move(pick.mv.from, pick.mv.to)?;
        Ok((pick.mv, outcome))
    }

    // =========================================================================
    // Undo / redo
    // =========================================================================

    /// Take back the last two half-moves so the same side is to move again.
    pub fn undo_turn(&mut self) -> Result<(), ChessError> {
        if let TurnState::AwaitingPromotion(sq) = self.state {
            return Err(ChessError::PromotionPending(sq));
        }
        let restore = self.history.undo_turn(self.checkpoint())?;
        self.restore(restore);
        Ok(())
    }

    /// Replay the most recently undone turn.
    pub fn redo_turn(&mut self) -> Result<(), ChessError> {
        if let TurnState::AwaitingPromotion(sq) = self.state {
            return Err(ChessError::PromotionPending(sq));
        }
        let resume = self.history.redo_turn()?;
        self.restore(resume);
        Ok(())
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    pub fn to_snapshot(&self) -> Result<String, ChessError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_snapshot(snapshot: &str) -> Result<Game, ChessError> {
        Ok(serde_json::from_str(snapshot)?)
    }

    /// Replace this game with the one in `snapshot`. On error the game is
    /// left as it was.
    pub fn load_snapshot(&mut self, snapshot: &str) -> Result<(), ChessError> {
        *self = Game::from_snapshot(snapshot)?;
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn ensure_accepting_moves(&self) -> Result<(), ChessError> {
        match self.state {
            TurnState::Finished(_) => Err(ChessError::GameOver),
            TurnState::AwaitingPromotion(sq) => Err(ChessError::PromotionPending(sq)),
            _ => Ok(()),
        }
    }

    fn apply(&mut self, from: Square, to: Square) -> Result<TurnOutcome, ChessError> {
        let mover = self.to_move;
        let before = self.checkpoint();
        let pawn_move = self
            .board
            .piece_at(from)
            .map(|p| p.piece_type == PieceType::Pawn)
            .unwrap_or(false);

        let undo = self.board.make_move(from, to)?;
        self.history.record(before);

        if pawn_move || undo.captured.is_some() {
            self.positions.clear();
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        self.last_moved = Some(to);
        self.board.clear_en_passant(mover);
        self.board.enable_en_passant(from, to);

        if self.board.needs_promotion(to) {
            if self.player(mover).computer_player {
                self.board.promote(to, PieceType::Queen)?;
            } else {
                self.state = TurnState::AwaitingPromotion(to);
                return Ok(TurnOutcome::PromotionPending(to));
            }
        }
        Ok(self.finish_turn())
    }

    /// Count the new placement, hand the move to the opponent and decide
    /// whether the game goes on.
    fn finish_turn(&mut self) -> TurnOutcome {
        let mover = self.to_move;
        *self.positions.entry(self.board.signature()).or_insert(0) += 1;

        let opponent = mover.opposite();
        self.to_move = opponent;

        let check = self.board.in_check(opponent);
        let no_escape = self.board.in_check_mate(opponent);
        let outcome = match (check, no_escape) {
            (true, true) => Some(Outcome::Checkmate { winner: mover }),
            (false, true) => Some(Outcome::Draw(DrawReason::Stalemate)),
            _ => self.draw_reason().map(Outcome::Draw),
        };

        match outcome {
            Some(outcome) => {
                self.state = TurnState::Finished(outcome);
                TurnOutcome::Finished(outcome)
            }
            None => {
                self.state = TurnState::AwaitingOrigin;
                TurnOutcome::Continue { check }
            }
        }
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            board: self.board.clone(),
            to_move: self.to_move,
            positions: self.positions.clone(),
            halfmove_clock: self.halfmove_clock,
            last_moved: self.last_moved,
            outcome: self.outcome(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.board = checkpoint.board;
        self.to_move = checkpoint.to_move;
        self.positions = checkpoint.positions;
        self.halfmove_clock = checkpoint.halfmove_clock;
        self.last_moved = checkpoint.last_moved;
        self.state = match checkpoint.outcome {
            Some(outcome) => TurnState::Finished(outcome),
            None => TurnState::AwaitingOrigin,
        };
    }
}
