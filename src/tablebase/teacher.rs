//! The tablebase as a stand-alone teacher: an [`Oracle`] whose prior is
//! concentrated on the database's best moves and whose value is the shaped
//! exact outcome. Bypasses the search tree entirely; also the tool for
//! validating or relabeling sampled positions offline.

use anyhow::bail;

use crate::evaluation::{Oracle, Prediction};
use crate::mill::board::CanonicalBoard;
use crate::mill::moves::{Action, ACTION_SIZE};
use crate::tablebase::{shaped_value, Backend, Tablebase};

/// Ground-truth oracle backed by a [`Tablebase`].
pub struct Teacher<B: Backend> {
    tablebase: Tablebase<B>,
}

impl<B: Backend> Teacher<B> {
    /// Wraps an opened tablebase client.
    #[must_use]
    pub const fn new(tablebase: Tablebase<B>) -> Self {
        Self { tablebase }
    }

    /// Access to the wrapped client, e.g. to adjust its query deadline.
    pub fn tablebase_mut(&mut self) -> &mut Tablebase<B> {
        &mut self.tablebase
    }

    /// Releases the wrapper, handing the client back.
    #[must_use]
    pub fn into_inner(self) -> Tablebase<B> {
        self.tablebase
    }

    /// Action index of the database's preferred move, `None` when the
    /// database has none to offer (unsupported sector, game over). The
    /// returned moves already achieve the best available outcome class, so
    /// the first one is as good as any.
    ///
    /// # Errors
    ///
    /// Validation and lookup failures of the underlying client.
    pub fn best_action(&mut self, board: &CanonicalBoard) -> anyhow::Result<Option<Action>> {
        let moves = self.tablebase.best_moves(board)?;
        Ok(moves.first().map(|best| best.action()))
    }
}

impl<B: Backend> Oracle for Teacher<B> {
    /// A uniform prior over the database's best moves and the shaped exact
    /// value.
    ///
    /// # Errors
    ///
    /// Fails when the database offers no move for a position it could
    /// evaluate: the teacher cannot form a policy there and the sample must
    /// be skipped.
    fn predict(&mut self, board: &CanonicalBoard) -> anyhow::Result<Prediction> {
        let outcome = self.tablebase.evaluate(board)?;
        let moves = self.tablebase.best_moves(board)?;
        if moves.is_empty() {
            bail!("tablebase offered no moves for sector of {board:?}");
        }

        let mut policy = vec![0.0; ACTION_SIZE];
        let mass = 1.0 / moves.len() as f32;
        for best in &moves {
            policy[best.action() as usize] += mass;
        }
        Ok(Prediction {
            policy,
            value: shaped_value(outcome),
        })
    }
}
