//! The board-collaborator contract consumed by the search core.
//!
//! Move generation, mill detection and the full terminal rules live outside
//! this crate; the search only needs the narrow surface below. Implementors
//! are expected to be cheap to call: [`Rules::game_ended`] in particular is
//! recomputed on every simulation visit to guard the terminal cache.

use crate::mill::board::{CanonicalBoard, StateKey};
use crate::mill::moves::{Action, ActionMask, ACTION_SIZE};

/// Dynamics of the game as the search sees them. All boards passed in and
/// returned are canonical: expressed from the perspective of the side about
/// to move.
pub trait Rules {
    /// Size of the flat action space. The default is the full
    /// (from, to)-pair space; scripted test games may shrink it.
    fn action_size(&self) -> usize {
        ACTION_SIZE
    }

    /// Legal actions of the side to move. Must be non-empty for any board
    /// that [`Rules::game_ended`] classifies as ongoing.
    fn valid_moves(&self, board: &CanonicalBoard) -> ActionMask;

    /// Applies an action and returns the canonical successor. When the move
    /// closes a mill the successor is in [`crate::mill::core::Phase::Capture`]
    /// and the side to move is unchanged; otherwise the perspective flips to
    /// the opponent.
    ///
    /// # Errors
    ///
    /// Fails if the action is not legal on this board.
    fn next_state(&self, board: &CanonicalBoard, action: Action) -> anyhow::Result<CanonicalBoard>;

    /// Terminal classification from the mover's perspective: `0.0` for an
    /// ongoing game, `1.0`/`-1.0` for a decided one. Rule-based early stops
    /// (move-count limits, repetition draws) may return a smaller-magnitude
    /// value inside `(0, 1)`. Must be a pure function of the board.
    fn game_ended(&self, board: &CanonicalBoard) -> f32;

    /// Cache key of a board. The default key is the board's own packed
    /// serialization and there is rarely a reason to override it.
    fn state_key(&self, board: &CanonicalBoard) -> StateKey {
        board.key()
    }
}
