//! Client for the exact endgame database: translates boards into the
//! database's bitboard/sector addressing scheme, retrieves win/draw/loss
//! classifications with optional distance-to-end, and exposes the result as
//! a ground-truth teacher signal independent of the search tree.
//!
//! The foreign query protocol (raw bitboards, integer side-to-move and
//! capture flags, out-parameters) is isolated behind the narrow [`Backend`]
//! trait; everything above it works with typed boards, moves and outcomes.
//! One logical handle exists per process: [`Tablebase::open`] acquires it
//! and dropping the client releases it on every exit path.

pub mod encoding;
mod teacher;

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::mill::board::CanonicalBoard;
use crate::mill::core::{Player, PIECES_PER_SIDE};
use crate::mill::moves::Move;
pub use encoding::{encode, Encoding, Sector};
pub use teacher::Teacher;

/// Sectors absent from the distributed database. Queries landing in one of
/// these are answered with a safe default (draw, unknown distance) instead
/// of reaching the backend; this list is deliberately explicit and must not
/// be generalized.
const UNSUPPORTED_SECTORS: [Sector; 1] = [Sector {
    white_on_board: 3,
    black_on_board: 9,
    white_in_hand: 0,
    black_in_hand: 0,
}];

/// Failures surfaced by the client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// One side's piece accounting exceeds what the game allows. Surfaced
    /// before any query, never retried.
    #[error(
        "{player} has {on_board} pieces on board and {in_hand} in hand, \
         exceeding {PIECES_PER_SIDE} total"
    )]
    PieceOverflow {
        #[allow(missing_docs)]
        player: Player,
        #[allow(missing_docs)]
        on_board: u8,
        #[allow(missing_docs)]
        in_hand: u8,
    },

    /// Both sides together exceed the piece budget of the game.
    #[error("both sides account for {total} pieces, exceeding {}", 2 * PIECES_PER_SIDE)]
    TotalOverflow {
        #[allow(missing_docs)]
        total: u8,
    },

    /// Transport or query failure, distinct from a legitimate "no data"
    /// answer. Callers labeling positions should skip the sample.
    #[error("tablebase lookup failed")]
    Lookup(#[source] anyhow::Error),
}

/// Win/draw/loss classification from the perspective of the side to move.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Wdl {
    #[allow(missing_docs)]
    Loss,
    #[allow(missing_docs)]
    Draw,
    #[allow(missing_docs)]
    Win,
}

impl Wdl {
    fn from_wire(value: i8) -> Result<Self, Error> {
        match value {
            -1 => Ok(Self::Loss),
            0 => Ok(Self::Draw),
            1 => Ok(Self::Win),
            _ => Err(Error::Lookup(anyhow::anyhow!(
                "wdl on the wire should be -1, 0 or 1, got {value}"
            ))),
        }
    }
}

/// An exact classification: outcome class plus distance to the end of the
/// game in plies, when the database knows it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    #[allow(missing_docs)]
    pub wdl: Wdl,
    /// `None` when the database has no distance for this position.
    pub steps: Option<u32>,
}

/// Scalar teacher value of an outcome, strictly inside `(-1, 1)`: faster
/// wins score higher than slower wins and slower losses higher than faster
/// losses, so shaped values can never be confused with exact terminal
/// results.
#[must_use]
pub fn shaped_value(outcome: Outcome) -> f32 {
    let magnitude = outcome.steps.map_or(0.98, |steps| {
        0.02_f32
            .mul_add(-(1.0 + steps as f32).ln(), 0.98)
            .clamp(0.05, 0.98)
    });
    match outcome.wdl {
        Wdl::Win => magnitude,
        Wdl::Draw => 0.0,
        Wdl::Loss => -magnitude,
    }
}

/// The raw query protocol of one database implementation. Implementations
/// perform blocking I/O; the optional deadline is the caller-imposed query
/// timeout (interactive probing), `None` meaning the unbounded offline
/// bulk-labeling mode.
pub trait Backend {
    /// Acquires the underlying resource for the database at `path`.
    ///
    /// # Errors
    ///
    /// Surfaces acquisition failures (missing files, incompatible data).
    fn init(&mut self, path: &Path) -> anyhow::Result<()>;

    /// Raw evaluation: `(wdl, steps)` with `wdl` in `{-1, 0, 1}` and
    /// `steps` of `-1` meaning unknown.
    ///
    /// # Errors
    ///
    /// Transport and query failures; the client maps them to
    /// [`Error::Lookup`].
    fn evaluate(&mut self, query: &Encoding, deadline: Option<Duration>)
        -> anyhow::Result<(i8, i32)>;

    /// Whitespace-separated move tokens achieving the position's outcome
    /// class; an empty string means none.
    ///
    /// # Errors
    ///
    /// Transport and query failures; the client maps them to
    /// [`Error::Lookup`].
    fn best_moves(&mut self, query: &Encoding, deadline: Option<Duration>)
        -> anyhow::Result<String>;

    /// Releases the underlying resource. Called exactly once, on drop.
    fn deinit(&mut self);
}

/// The typed client: validation, sector special-casing and memoization on
/// top of a [`Backend`]. Lookups are comparatively expensive and the
/// database is a pure function, so every answer is cached per full
/// encoding.
pub struct Tablebase<B: Backend> {
    backend: B,
    deadline: Option<Duration>,
    evaluations: HashMap<Encoding, Outcome>,
    moves: HashMap<Encoding, Vec<Move>>,
}

impl<B: Backend> Tablebase<B> {
    /// Acquires the database handle.
    ///
    /// # Errors
    ///
    /// Propagates backend acquisition failures; no handle is leaked when
    /// this fails.
    pub fn open(mut backend: B, path: &Path) -> anyhow::Result<Self> {
        backend.init(path)?;
        log::debug!("tablebase opened at {}", path.display());
        Ok(Self {
            backend,
            deadline: None,
            evaluations: HashMap::new(),
            moves: HashMap::new(),
        })
    }

    /// Sets the caller-imposed per-query deadline. Interactive probing
    /// should set a short one; offline bulk labeling keeps the `None`
    /// default.
    pub fn set_deadline(&mut self, deadline: Option<Duration>) {
        self.deadline = deadline;
    }

    /// Classifies a board, going through validation, the unsupported-sector
    /// shortcut and the memo before the backend is consulted.
    ///
    /// # Errors
    ///
    /// Validation errors for malformed piece accounting and
    /// [`Error::Lookup`] for backend failures.
    pub fn evaluate(&mut self, board: &CanonicalBoard) -> Result<Outcome, Error> {
        let query = encode(board)?;
        if let Some(outcome) = self.evaluations.get(&query) {
            return Ok(*outcome);
        }

        let outcome = if self.is_unsupported(query.sector()) {
            Outcome {
                wdl: Wdl::Draw,
                steps: None,
            }
        } else {
            let (wdl, steps) = self
                .backend
                .evaluate(&query, self.deadline)
                .map_err(Error::Lookup)?;
            Outcome {
                wdl: Wdl::from_wire(wdl)?,
                steps: u32::try_from(steps).ok(),
            }
        };
        let _ = self.evaluations.insert(query, outcome);
        Ok(outcome)
    }

    /// Moves achieving the board's outcome class, parsed into typed moves.
    /// At least one is returned whenever evaluation succeeds and legal
    /// moves exist; unsupported sectors answer with an empty list.
    ///
    /// # Errors
    ///
    /// Validation errors, backend failures and unparseable tokens, all of
    /// which mean the sample should be skipped.
    pub fn best_moves(&mut self, board: &CanonicalBoard) -> Result<Vec<Move>, Error> {
        let query = encode(board)?;
        if let Some(moves) = self.moves.get(&query) {
            return Ok(moves.clone());
        }

        let moves = if self.is_unsupported(query.sector()) {
            Vec::new()
        } else {
            let tokens = self
                .backend
                .best_moves(&query, self.deadline)
                .map_err(Error::Lookup)?;
            tokens
                .split_whitespace()
                .map(|token| Move::try_from(token).map_err(Error::Lookup))
                .collect::<Result<Vec<_>, _>>()?
        };
        let _ = self.moves.insert(query, moves.clone());
        Ok(moves)
    }

    fn is_unsupported(&self, sector: Sector) -> bool {
        let unsupported = UNSUPPORTED_SECTORS.contains(&sector);
        if unsupported {
            log::debug!("sector {sector} is absent from the distributed data, answering draw");
        }
        unsupported
    }
}

impl<B: Backend> Drop for Tablebase<B> {
    fn drop(&mut self) {
        self.backend.deinit();
    }
}
