//! Canonical board state consumed by the search and the tablebase client.
//!
//! The board is always expressed from the perspective of the side about to
//! move: `own` pieces belong to the mover, `their` pieces to the opponent.
//! The absolute color of the mover is carried along so that adapters needing
//! white/black identities (the tablebase addressing scheme, notation) can
//! recover them; it is deliberately not part of the state key, which keys
//! the canonical perspective only.

use anyhow::bail;

use crate::mill::bitboard::Bitboard;
use crate::mill::core::{Phase, Player, FLYING_THRESHOLD, PIECES_PER_SIDE};

/// A mill-game position from the mover's perspective, together with the
/// history counters that feed terminal classification.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CanonicalBoard {
    own: Bitboard,
    their: Bitboard,
    to_move: Player,
    phase: Phase,
    placed: u8,
    quiet_moves: u8,
    move_count: u16,
    repetition: bool,
}

impl CanonicalBoard {
    /// The empty starting position: white to place the first piece.
    #[must_use]
    pub const fn initial() -> Self {
        Self {
            own: Bitboard::empty(),
            their: Bitboard::empty(),
            to_move: Player::White,
            phase: Phase::Placing,
            placed: 0,
            quiet_moves: 0,
            move_count: 0,
            repetition: false,
        }
    }

    /// Creates a board with zeroed history counters.
    ///
    /// # Errors
    ///
    /// Fails if the occupancy sets overlap or the placement counter exceeds
    /// the total number of pieces in the game.
    pub fn new(
        to_move: Player,
        phase: Phase,
        own: Bitboard,
        their: Bitboard,
        placed: u8,
    ) -> anyhow::Result<Self> {
        if !(own & their).is_empty() {
            bail!("own and opposing pieces overlap on {}", own & their);
        }
        if placed > 2 * PIECES_PER_SIDE {
            bail!(
                "at most {} placements exist in a game, got {placed}",
                2 * PIECES_PER_SIDE
            );
        }
        Ok(Self {
            own,
            their,
            to_move,
            phase,
            placed,
            quiet_moves: 0,
            move_count: 0,
            repetition: false,
        })
    }

    /// Replaces the history counters, consuming and returning the board.
    #[must_use]
    pub const fn with_history(mut self, quiet_moves: u8, move_count: u16, repetition: bool) -> Self {
        self.quiet_moves = quiet_moves;
        self.move_count = move_count;
        self.repetition = repetition;
        self
    }

    /// Pieces of the side to move.
    #[must_use]
    pub const fn own(&self) -> Bitboard {
        self.own
    }

    /// Pieces of the opponent.
    #[must_use]
    pub const fn their(&self) -> Bitboard {
        self.their
    }

    /// Absolute color of the side to move.
    #[must_use]
    pub const fn to_move(&self) -> Player {
        self.to_move
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Completed placements, counting both sides.
    #[must_use]
    pub const fn placed(&self) -> u8 {
        self.placed
    }

    /// Sliding moves since the last placement or removal.
    #[must_use]
    pub const fn quiet_moves(&self) -> u8 {
        self.quiet_moves
    }

    /// Total moves played from the start of the game.
    #[must_use]
    pub const fn move_count(&self) -> u16 {
        self.move_count
    }

    /// Set by the board collaborator once a position occurred three times.
    #[must_use]
    pub const fn repetition(&self) -> bool {
        self.repetition
    }

    /// On-board pieces of the given absolute color.
    #[must_use]
    pub const fn pieces(&self, player: Player) -> Bitboard {
        if matches!(
            (self.to_move, player),
            (Player::White, Player::White) | (Player::Black, Player::Black)
        ) {
            self.own
        } else {
            self.their
        }
    }

    /// Pieces the given absolute color still holds in hand. White places on
    /// even placement ordinals (it moves first), so after `placed` total
    /// placements white has used up the larger half.
    #[must_use]
    pub const fn in_hand(&self, player: Player) -> u8 {
        let used = match player {
            Player::White => (self.placed + 1) / 2,
            Player::Black => self.placed / 2,
        };
        PIECES_PER_SIDE.saturating_sub(used)
    }

    /// True when the side to move is allowed to fly instead of sliding.
    #[must_use]
    pub const fn flying_unlocked(&self) -> bool {
        self.own.count() <= FLYING_THRESHOLD && self.in_hand(self.to_move) == 0
    }

    /// The cache key of this state: both occupancy sets from the canonical
    /// perspective plus everything that can change the terminal
    /// classification. A pure function of the board.
    #[must_use]
    pub const fn key(&self) -> StateKey {
        StateKey {
            own: self.own.bits(),
            their: self.their.bits(),
            phase: self.phase,
            placed: self.placed,
            quiet_moves: self.quiet_moves,
            move_count: self.move_count,
            repetition: self.repetition,
        }
    }
}

/// Canonical, collision-resistant serialization of a [`CanonicalBoard`],
/// used to address per-state statistics in the search cache. Same layout but
/// different history counters produce different keys: the counters feed the
/// terminal check, and sharing statistics across them caused the cache
/// inconsistencies this key exists to rule out.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct StateKey {
    own: u32,
    their: u32,
    phase: Phase,
    placed: u8,
    quiet_moves: u8,
    move_count: u16,
    repetition: bool,
}
