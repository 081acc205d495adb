//! The search engine: repeated guided simulations over a statistics cache,
//! producing a visit-count-based action distribution.
//!
//! 1. Selection: walk down the cached tree picking the action with the
//!    highest upper confidence bound.
//! 2. Expansion: at a never-seen state, query the oracle once, mask and
//!    renormalize its prior and stop the descent.
//! 3. Backup: propagate the obtained value along the path, flipping its sign
//!    at every side-to-move change. The one exception is the mandatory
//!    capture sub-turn: a mill keeps the same side moving, so the value
//!    crosses that transition unchanged.

use crate::evaluation::Oracle;
use crate::mill::board::{CanonicalBoard, StateKey};
use crate::mill::core::Phase;
use crate::mill::moves::Action;
use crate::mill::rules::Rules;
use crate::search::cache::{NodeStats, SearchCache};
use crate::search::{Depth, Error, Params, Statistics};

/// Keeps edges of a freshly expanded state ordered by prior even though the
/// state has no visits yet.
const EPS: f32 = 1e-8;

/// One search instance: parameters plus the statistics cache the simulations
/// accumulate into. The cache persists across successive moves of one game
/// (tree reuse); call [`Mcts::reset`] when a new episode starts. Instances
/// must not be shared between concurrently played games.
pub struct Mcts {
    params: Params,
    cache: SearchCache,
}

impl Mcts {
    /// Creates an engine with an empty cache.
    #[must_use]
    pub fn new(params: Params) -> Self {
        Self {
            params,
            cache: SearchCache::new(),
        }
    }

    /// Drops all accumulated statistics, e.g. between self-play episodes.
    pub fn reset(&mut self) {
        self.cache.clear();
    }

    /// Aggregate cache counters, for logging and tests.
    #[must_use]
    pub fn statistics(&self) -> Statistics {
        self.cache.statistics()
    }

    /// `N(s)` of the given state, 0 if it was never expanded.
    #[must_use]
    pub fn visits(&self, key: &StateKey) -> u32 {
        self.cache.node_visits(key)
    }

    /// `(Q(s,a), N(s,a))` of an edge, `None` if it was never traversed.
    #[must_use]
    pub fn edge_statistics(&self, key: &StateKey, action: Action) -> Option<(f32, u32)> {
        self.cache
            .edge(*key, action)
            .map(|edge| (edge.mean_value, edge.visits))
    }

    /// Runs exactly [`Params::simulations`] simulations from `root` and
    /// returns a probability vector over the flat action space proportional
    /// to `N(root, a)^(1/temperature)`. With `temperature` 0 the vector is
    /// one-hot on the most visited action; among equally visited actions the
    /// lowest index wins, so repeated calls with identical inputs yield
    /// identical output.
    ///
    /// # Errors
    ///
    /// Everything the simulations surface, plus [`Error::NoRootVisits`] when
    /// the root collected no visits despite the full budget. The caller must
    /// hand in a position with at least one legal action.
    pub fn action_probabilities<R: Rules, O: Oracle>(
        &mut self,
        rules: &R,
        oracle: &mut O,
        root: &CanonicalBoard,
        temperature: f32,
    ) -> Result<Vec<f32>, Error> {
        for _ in 0..self.params.simulations {
            let _ = self.simulate(rules, oracle, root, 0)?;
        }

        let key = rules.state_key(root);
        let action_size = rules.action_size();
        let counts: Vec<u32> = (0..action_size)
            .map(|action| self.cache.edge_visits(key, action as Action))
            .collect();

        let mut probabilities = vec![0.0; action_size];
        if temperature == 0.0 {
            let max = counts.iter().copied().max().unwrap_or(0);
            if max == 0 {
                return Err(Error::NoRootVisits {
                    simulations: self.params.simulations,
                });
            }
            // The first action reaching the maximum wins, so the tie-break
            // is reproducible across calls.
            let best = counts.iter().position(|&count| count == max).unwrap_or(0);
            probabilities[best] = 1.0;
            return Ok(probabilities);
        }

        let exponent = f64::from(temperature).recip();
        let weights: Vec<f64> = counts
            .iter()
            .map(|&count| f64::from(count).powf(exponent))
            .collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return Err(Error::NoRootVisits {
                simulations: self.params.simulations,
            });
        }
        for (probability, weight) in probabilities.iter_mut().zip(&weights) {
            *probability = (weight / total) as f32;
        }
        Ok(probabilities)
    }

    /// One simulation from `board`. Returns the obtained value oriented for
    /// the player who moved *into* `board`: negated relative to the mover at
    /// `board`, except when `board` is a capture sub-turn (the transition
    /// into it did not change the side to move).
    fn simulate<R: Rules, O: Oracle>(
        &mut self,
        rules: &R,
        oracle: &mut O,
        board: &CanonicalBoard,
        depth: Depth,
    ) -> Result<f32, Error> {
        let key = rules.state_key(board);

        // The terminal classification is a cheap pure function of the board:
        // recompute it on every visit instead of trusting the cache, and
        // throw away everything recorded under the key if the two disagree.
        // A stale entry must not crash the session, only cost a re-expansion.
        let outcome = rules.game_ended(board);
        if let Some(cached) = self.cache.terminal(&key) {
            if (cached - outcome).abs() > f32::EPSILON {
                log::warn!(
                    "cached terminal value {cached} contradicts recomputed {outcome}; \
                     purging stale statistics for {key:?}"
                );
                self.cache.purge(&key);
            }
        }
        self.cache.set_terminal(key, outcome);
        if outcome != 0.0 {
            return Ok(-outcome);
        }

        if depth >= self.params.max_depth {
            self.cache.note_depth_limited();
            return Ok(0.0);
        }

        // Sign of the value handed back to the caller. The capture sub-turn
        // is entered without advancing the side to move, so a board in the
        // capture phase shares its mover with the caller's board.
        let orientation = if board.phase() == Phase::Capture {
            1.0
        } else {
            -1.0
        };

        let chosen = match self.cache.node(&key) {
            None => {
                let value = self.expand(rules, oracle, board, key)?;
                return Ok(orientation * value);
            },
            Some(node) => {
                let parent_visits = node.visits as f32;
                let mut best: Option<Action> = None;
                let mut best_score = f32::NEG_INFINITY;
                for action in node.legal.iter() {
                    let prior = node.prior[action as usize];
                    let score = match self.cache.edge(key, action) {
                        Some(edge) => {
                            edge.mean_value
                                + self.params.c_puct * prior * parent_visits.sqrt()
                                    / (1.0 + edge.visits as f32)
                        },
                        // Unvisited edge: Q treated as 0. The epsilon keeps
                        // priors ordering edges under a zero-visit parent.
                        None => self.params.c_puct * prior * (parent_visits + EPS).sqrt(),
                    };
                    // Strictly greater: the first maximum in increasing
                    // action-index order wins, deterministically.
                    if score > best_score {
                        best_score = score;
                        best = Some(action);
                    }
                }
                best.ok_or(Error::NoSelectableAction)?
            },
        };

        let next = rules.next_state(board, chosen).map_err(Error::Rules)?;
        let value = self.simulate(rules, oracle, &next, depth + 1)?;
        self.cache.record_visit(key, chosen, value);
        Ok(orientation * value)
    }

    /// First visit of a state: one oracle query, prior masking and
    /// renormalization, cache seeding. Returns the oracle value oriented for
    /// the mover at `board`.
    fn expand<R: Rules, O: Oracle>(
        &mut self,
        rules: &R,
        oracle: &mut O,
        board: &CanonicalBoard,
        key: StateKey,
    ) -> Result<f32, Error> {
        let prediction = oracle.predict(board).map_err(Error::Oracle)?;
        let action_size = rules.action_size();
        if prediction.policy.len() != action_size {
            return Err(Error::PolicyShape {
                expected: action_size,
                got: prediction.policy.len(),
            });
        }

        let legal = rules.valid_moves(board);
        let mut prior = prediction.policy.into_boxed_slice();
        for (action, mass) in prior.iter_mut().enumerate() {
            if !legal.contains(action as Action) {
                *mass = 0.0;
            }
        }
        let total: f32 = prior.iter().sum();
        if total <= 0.0 {
            return Err(Error::DegeneratePolicy {
                legal: legal.count(),
            });
        }
        for mass in prior.iter_mut() {
            *mass /= total;
        }

        self.cache.insert_node(
            key,
            NodeStats {
                visits: 0,
                prior,
                legal,
            },
        );
        Ok(prediction.value)
    }
}
