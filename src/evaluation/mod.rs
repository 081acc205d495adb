//! This module defines the position evaluation contract: predicting move
//! priors and the relative value of a position without [`crate::search`].
//! The search treats the predictor as an opaque oracle; trained networks,
//! handcrafted heuristics and the tablebase teacher all plug in through the
//! same seam.

use crate::mill::board::CanonicalBoard;
use crate::mill::moves::ACTION_SIZE;

/// Output of one oracle query.
#[derive(Clone, Debug)]
pub struct Prediction {
    /// Prior probability per action index. The search masks this by the
    /// legal-move set and renormalizes, so the vector only has to be
    /// non-negative with the right length.
    pub policy: Vec<f32>,
    /// Scalar value in `[-1, 1]` from the perspective of the side to move.
    pub value: f32,
}

/// Maps a canonical board to action priors and a value estimate.
pub trait Oracle {
    /// Evaluates a position.
    ///
    /// # Errors
    ///
    /// Implementations surface their own failures (inference errors,
    /// transport problems); the search never retries and aborts the episode.
    fn predict(&mut self, board: &CanonicalBoard) -> anyhow::Result<Prediction>;
}

/// The no-knowledge baseline: a uniform prior over the whole action space
/// and a neutral value. Doubles as the stub oracle in tests.
#[derive(Copy, Clone, Debug)]
pub struct UniformOracle {
    action_size: usize,
}

impl UniformOracle {
    /// Creates a uniform oracle for the given action-space size.
    #[must_use]
    pub const fn new(action_size: usize) -> Self {
        Self { action_size }
    }
}

impl Default for UniformOracle {
    fn default() -> Self {
        Self::new(ACTION_SIZE)
    }
}

impl Oracle for UniformOracle {
    fn predict(&mut self, _board: &CanonicalBoard) -> anyhow::Result<Prediction> {
        Ok(Prediction {
            policy: vec![1.0 / self.action_size as f32; self.action_size],
            value: 0.0,
        })
    }
}
