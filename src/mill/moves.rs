//! Typed moves, their engine-token notation and the bijection with the flat
//! action space consumed by policy heads and the search.
//!
//! The action space has one slot per (from, to) intersection pair. Placements
//! and removals only need a destination, so they occupy the first 24 slots;
//! which of the two a low index means depends on the current [`Phase`].

use std::fmt;

use anyhow::bail;

use crate::mill::core::{Phase, Point, BOARD_POINTS};

/// Index into the flat policy/action vector.
pub type Action = u16;

/// Size of the flat action space: one slot per ordered intersection pair.
pub const ACTION_SIZE: usize = BOARD_POINTS as usize * BOARD_POINTS as usize;

/// Represents any kind of a legal mill-game move. A move is the only way the
/// board collaborator mutates a position. The move representation has
/// one-to-one correspondence with the engine token notation used by the
/// tablebase: placement `"a1"`, slide or fly `"d5-d6"`, removal `"xg7"`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Move {
    /// Drop a piece from hand onto an empty intersection.
    Place(Point),
    /// Slide along an adjacency line, or fly anywhere when down to the
    /// flying threshold. The two are indistinguishable in notation.
    Shift {
        #[allow(missing_docs)]
        from: Point,
        #[allow(missing_docs)]
        to: Point,
    },
    /// Remove an opposing piece after closing a mill.
    Remove(Point),
}

impl Move {
    /// Index of this move in the flat action space.
    #[must_use]
    pub const fn action(self) -> Action {
        match self {
            Self::Place(point) | Self::Remove(point) => point as Action,
            Self::Shift { from, to } => from as Action * BOARD_POINTS as Action + to as Action,
        }
    }

    /// Decodes an action index. The phase disambiguates the first 24 slots:
    /// they are placements while placing and removals during the capture
    /// sub-turn; in the shifting phases every index encodes a (from, to)
    /// pair.
    ///
    /// # Errors
    ///
    /// Fails if the index is out of range for the given phase.
    pub fn from_action(phase: Phase, action: Action) -> anyhow::Result<Self> {
        match phase {
            Phase::Placing | Phase::Capture => {
                if action >= Action::from(BOARD_POINTS) {
                    bail!(
                        "actions in phase {phase:?} should be in 0..{BOARD_POINTS}, got {action}"
                    );
                }
                let point = Point::try_from(action as u8)?;
                Ok(match phase {
                    Phase::Placing => Self::Place(point),
                    _ => Self::Remove(point),
                })
            },
            Phase::Moving | Phase::Flying => {
                if action as usize >= ACTION_SIZE {
                    bail!("actions should be in 0..{ACTION_SIZE}, got {action}");
                }
                Ok(Self::Shift {
                    from: Point::try_from((action / Action::from(BOARD_POINTS)) as u8)?,
                    to: Point::try_from((action % Action::from(BOARD_POINTS)) as u8)?,
                })
            },
        }
    }
}

impl TryFrom<&str> for Move {
    type Error = anyhow::Error;

    /// Parses an engine move token.
    ///
    /// # Errors
    ///
    /// Fails on empty tokens and on tokens naming invalid intersections.
    fn try_from(token: &str) -> anyhow::Result<Self> {
        if let Some(target) = token.strip_prefix('x') {
            return Ok(Self::Remove(Point::try_from(target)?));
        }
        if let Some((from, to)) = token.split_once('-') {
            return Ok(Self::Shift {
                from: Point::try_from(from)?,
                to: Point::try_from(to)?,
            });
        }
        Ok(Self::Place(Point::try_from(token)?))
    }
}

impl fmt::Display for Move {
    /// Serializes a move in the engine token notation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Place(point) => write!(f, "{point}"),
            Self::Shift { from, to } => write!(f, "{from}-{to}"),
            Self::Remove(point) => write!(f, "x{point}"),
        }
    }
}

/// Fixed-size set of legal action indices, the `V(s)` vector of the search.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
pub struct ActionMask {
    words: [u64; ACTION_SIZE / 64],
}

impl ActionMask {
    /// Constructs a mask with no legal actions.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            words: [0; ACTION_SIZE / 64],
        }
    }

    /// Collects action indices into a mask.
    #[must_use]
    pub fn from_actions(actions: &[Action]) -> Self {
        let mut result = Self::empty();
        for action in actions {
            result.set(*action);
        }
        result
    }

    /// Marks an action as legal.
    ///
    /// # Panics
    ///
    /// Panics if the action index is out of range.
    pub fn set(&mut self, action: Action) {
        assert!((action as usize) < ACTION_SIZE);
        self.words[action as usize / 64] |= 1u64 << (action % 64);
    }

    /// Returns true if the action is legal.
    #[must_use]
    pub const fn contains(&self, action: Action) -> bool {
        if action as usize >= ACTION_SIZE {
            return false;
        }
        self.words[action as usize / 64] & (1u64 << (action % 64)) != 0
    }

    /// Number of legal actions.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.words.iter().map(|word| word.count_ones()).sum()
    }

    /// Returns true when no action is legal.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&word| word == 0)
    }

    /// Iterates over legal actions in increasing index order.
    pub fn iter(&self) -> impl Iterator<Item = Action> + '_ {
        self.words.iter().enumerate().flat_map(|(index, &word)| {
            let mut bits = word;
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let offset = bits.trailing_zeros();
                bits &= bits - 1;
                Some(index as Action * 64 + offset as Action)
            })
        })
    }
}

impl fmt::Debug for ActionMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
