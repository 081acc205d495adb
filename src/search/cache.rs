//! Per-engine statistics cache: the `N(s)`, `Q(s,a)`, `N(s,a)`, `P(s,·)`,
//! `V(s)` and `E(s)` tables of one search instance. Owned by exactly one
//! [`crate::search::Mcts`], never shared between instances and never global.

use std::collections::HashMap;

use crate::mill::board::StateKey;
use crate::mill::moves::{Action, ActionMask};

/// Statistics of one expanded state.
pub(super) struct NodeStats {
    /// `N(s)`: number of backups that went through this state.
    pub(super) visits: u32,
    /// `P(s,·)`: oracle prior, masked by the legal moves and renormalized.
    pub(super) prior: Box<[f32]>,
    /// `V(s)`: cached legal-move set.
    pub(super) legal: ActionMask,
}

/// Statistics of one `(state, action)` edge.
#[derive(Copy, Clone)]
pub(super) struct EdgeStats {
    /// `Q(s,a)`: running mean of backed-up values, always in `[-1, 1]`.
    pub(super) mean_value: f32,
    /// `N(s,a)`: number of times the edge was traversed.
    pub(super) visits: u32,
}

/// Aggregate counters of one search instance, exposed for observability.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Statistics {
    /// Number of expanded states currently cached.
    pub expanded_states: usize,
    /// Number of `(state, action)` edges currently cached.
    pub edges: usize,
    /// Simulations cut short by the hard depth bound.
    pub depth_limited: u64,
    /// States purged because the cached terminal classification disagreed
    /// with a fresh recomputation.
    pub purged_states: u64,
}

pub(super) struct SearchCache {
    nodes: HashMap<StateKey, NodeStats>,
    edges: HashMap<(StateKey, Action), EdgeStats>,
    terminal: HashMap<StateKey, f32>,
    depth_limited: u64,
    purged: u64,
}

impl SearchCache {
    pub(super) fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: HashMap::new(),
            terminal: HashMap::new(),
            depth_limited: 0,
            purged: 0,
        }
    }

    pub(super) fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.terminal.clear();
        self.depth_limited = 0;
        self.purged = 0;
    }

    pub(super) fn node(&self, key: &StateKey) -> Option<&NodeStats> {
        self.nodes.get(key)
    }

    pub(super) fn insert_node(&mut self, key: StateKey, stats: NodeStats) {
        let _ = self.nodes.insert(key, stats);
    }

    pub(super) fn edge(&self, key: StateKey, action: Action) -> Option<EdgeStats> {
        self.edges.get(&(key, action)).copied()
    }

    pub(super) fn edge_visits(&self, key: StateKey, action: Action) -> u32 {
        self.edges.get(&(key, action)).map_or(0, |edge| edge.visits)
    }

    pub(super) fn node_visits(&self, key: &StateKey) -> u32 {
        self.nodes.get(key).map_or(0, |node| node.visits)
    }

    /// Backs one simulation result up into the edge and node tables:
    /// `Q(s,a) <- (N(s,a) * Q(s,a) + v) / (N(s,a) + 1)`, then both visit
    /// counters grow by one.
    pub(super) fn record_visit(&mut self, key: StateKey, action: Action, value: f32) {
        let edge = self
            .edges
            .entry((key, action))
            .or_insert(EdgeStats {
                mean_value: 0.0,
                visits: 0,
            });
        edge.mean_value =
            (edge.visits as f32).mul_add(edge.mean_value, value) / (edge.visits as f32 + 1.0);
        edge.visits += 1;
        if let Some(node) = self.nodes.get_mut(&key) {
            node.visits += 1;
        }
    }

    pub(super) fn terminal(&self, key: &StateKey) -> Option<f32> {
        self.terminal.get(key).copied()
    }

    pub(super) fn set_terminal(&mut self, key: StateKey, value: f32) {
        let _ = self.terminal.insert(key, value);
    }

    /// Drops every entry belonging to the key. Called when the cached
    /// terminal classification for the key turned out stale; the caller
    /// continues with freshly recomputed data.
    pub(super) fn purge(&mut self, key: &StateKey) {
        let _ = self.nodes.remove(key);
        let _ = self.terminal.remove(key);
        self.edges.retain(|(state, _), _| state != key);
        self.purged += 1;
    }

    pub(super) fn note_depth_limited(&mut self) {
        self.depth_limited += 1;
    }

    pub(super) fn statistics(&self) -> Statistics {
        Statistics {
            expanded_states: self.nodes.len(),
            edges: self.edges.len(),
            depth_limited: self.depth_limited,
            purged_states: self.purged,
        }
    }
}
