use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::error::ChessError;
use crate::game::Outcome;
use crate::piece::Color;
use crate::square::Square;

/// Game state captured before a half-move is applied.
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct Checkpoint {
    pub board: Board,
    pub to_move: Color,
    pub positions: HashMap<String, u32>,
    pub halfmove_clock: u32,
    pub last_moved: Option<Square>,
    pub outcome: Option<Outcome>,
}

/// Fixed-capacity ring of the most recent checkpoints. Once full, each push
/// overwrites the oldest entry.
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct UndoRing {
    capacity: usize,
    entries: VecDeque<Checkpoint>,
}

impl UndoRing {
    pub fn new(capacity: usize) -> Self {
        UndoRing {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Store a checkpoint, returning the one it displaced if the ring was full.
    pub fn push(&mut self, checkpoint: Checkpoint) -> Option<Checkpoint> {
        if self.capacity == 0 {
            return Some(checkpoint);
        }
        let evicted = if self.entries.len() == self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(checkpoint);
        evicted
    }

    pub fn pop(&mut self) -> Option<Checkpoint> {
        self.entries.pop_back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A turn taken back by undo: the two checkpoints it consumed and the state
/// that was live when it happened.
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
struct UndoneTurn {
    own: Checkpoint,
    reply: Checkpoint,
    resume: Checkpoint,
}

/// Undo ring plus the turns undone since the last new move.
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct History {
    ring: UndoRing,
    redo: Vec<UndoneTurn>,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        History {
            ring: UndoRing::new(capacity),
            redo: Vec::new(),
        }
    }

    /// Remember the state before a new half-move. Anything undone earlier can
    /// no longer be redone.
    pub fn record(&mut self, before: Checkpoint) {
        self.ring.push(before);
        self.redo.clear();
    }

    /// Full turns that can currently be undone.
    pub fn turns_available(&self) -> usize {
        self.ring.len() / 2
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Step back two half-moves. `current` is the live state, kept so the turn
    /// can be redone. Returns the state to restore.
    pub fn undo_turn(&mut self, current: Checkpoint) -> Result<Checkpoint, ChessError> {
        if self.ring.len() < 2 {
            return Err(ChessError::NothingToUndo);
        }
        let reply = self.ring.pop().ok_or(ChessError::NothingToUndo)?;
        let own = self.ring.pop().ok_or(ChessError::NothingToUndo)?;
        let restore = own.clone();
        self.redo.push(UndoneTurn { own, reply, resume: current });
        Ok(restore)
    }

    /// Replay the most recently undone turn. Returns the state to restore.
    pub fn redo_turn(&mut self) -> Result<Checkpoint, ChessError> {
        let turn = self.redo.pop().ok_or(ChessError::NothingToRedo)?;
        self.ring.push(turn.own);
        self.ring.push(turn.reply);
        Ok(turn.resume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkpoint(clock: u32) -> Checkpoint {
        Checkpoint {
            board: Board::new(),
            to_move: Color::White,
            positions: HashMap::new(),
            halfmove_clock: clock,
            last_moved: None,
            outcome: None,
        }
    }

    #[test]
    fn ring_overwrites_oldest_when_full() {
        let mut ring = UndoRing::new(3);
        for clock in 0..3 {
            assert!(ring.push(checkpoint(clock)).is_none());
        }
        let evicted = ring.push(checkpoint(3)).expect("full ring should evict");
        assert_eq!(evicted.halfmove_clock, 0);
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.pop().map(|c| c.halfmove_clock), Some(3));
        assert_eq!(ring.pop().map(|c| c.halfmove_clock), Some(2));
        assert_eq!(ring.pop().map(|c| c.halfmove_clock), Some(1));
        assert!(ring.is_empty());
    }

    /// With the default capacity of seven, at most three full turns survive.
    #[test]
    fn seven_slots_hold_three_turns() {
        let mut history = History::new(7);
        for clock in 0..10 {
            history.record(checkpoint(clock));
        }
        assert_eq!(history.turns_available(), 3);
        for _ in 0..3 {
            history.undo_turn(checkpoint(99)).unwrap();
        }
        assert!(matches!(
            history.undo_turn(checkpoint(99)),
            Err(ChessError::NothingToUndo)
        ));
    }

    #[test]
    fn undo_restores_the_older_checkpoint_and_redo_returns() {
        let mut history = History::new(7);
        history.record(checkpoint(0));
        history.record(checkpoint(1));

        let restored = history.undo_turn(checkpoint(2)).unwrap();
        assert_eq!(restored.halfmove_clock, 0);
        assert!(history.can_redo());

        let resumed = history.redo_turn().unwrap();
        assert_eq!(resumed.halfmove_clock, 2);
        assert_eq!(history.turns_available(), 1);
        assert!(matches!(history.redo_turn(), Err(ChessError::NothingToRedo)));
    }

    #[test]
    fn new_move_discards_redo() {
        let mut history = History::new(7);
        history.record(checkpoint(0));
        history.record(checkpoint(1));
        history.undo_turn(checkpoint(2)).unwrap();
        history.record(checkpoint(5));
        assert!(!history.can_redo());
    }

    #[test]
    fn single_half_move_cannot_be_undone_as_a_turn() {
        let mut history = History::new(7);
        history.record(checkpoint(0));
        assert!(matches!(
            history.undo_turn(checkpoint(1)),
            Err(ChessError::NothingToUndo)
        ));
        assert_eq!(history.turns_available(), 0);
    }
}
