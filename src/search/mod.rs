//! Implements [Monte Carlo Tree Search] (MCTS) over the mill-game contract,
//! guided by a policy/value [`crate::evaluation::Oracle`].
//!
//! [Monte Carlo Tree Search]: https://en.wikipedia.org/wiki/Monte_Carlo_tree_search

mod cache;
mod mcts;

pub use cache::Statistics;
pub use mcts::Mcts;

/// Simulation depth in plies.
pub type Depth = u16;

/// Parameters for the MCTS search algorithm.
#[derive(Copy, Clone, Debug)]
pub struct Params {
    /// Number of simulations run per [`Mcts::action_probabilities`] call.
    pub simulations: u32,
    /// Exploration constant ($c_{puct}$ in the original paper).
    pub c_puct: f32,
    /// Hard bound on the simulation recursion depth. Reaching it yields a
    /// neutral, counted outcome instead of unbounded recursion.
    pub max_depth: Depth,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            simulations: 100,
            c_puct: 1.0,
            max_depth: 255,
        }
    }
}

/// Failures surfaced by the search. None of these are retried internally:
/// every error aborts the current episode rather than producing silently
/// incorrect statistics.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The oracle put zero probability mass on every legal move of a
    /// position. This signals an upstream defect (broken network output,
    /// mismatched action encoding) and is never papered over with a uniform
    /// fallback.
    #[error("oracle assigned zero probability to all {legal} legal moves")]
    DegeneratePolicy {
        /// Number of legal moves that ended up with zero mass.
        legal: u32,
    },

    /// The oracle returned a policy vector of the wrong length.
    #[error("oracle policy should have {expected} entries, got {got}")]
    PolicyShape {
        #[allow(missing_docs)]
        expected: usize,
        #[allow(missing_docs)]
        got: usize,
    },

    /// The root collected no visits although the full simulation budget ran.
    /// The root was non-terminal with legal moves, so this is a defect.
    #[error("no root visits recorded after {simulations} simulations")]
    NoRootVisits {
        #[allow(missing_docs)]
        simulations: u32,
    },

    /// A non-terminal position had no legal action to select.
    #[error("no legal action to select in a non-terminal position")]
    NoSelectableAction,

    /// The oracle query itself failed.
    #[error("oracle query failed")]
    Oracle(#[source] anyhow::Error),

    /// The rules collaborator rejected a transition.
    #[error("rules collaborator failed")]
    Rules(#[source] anyhow::Error),
}
