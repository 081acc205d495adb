//! Scripted collaborators standing in for the out-of-scope board rules and
//! network oracle. The placement game below is an honest miniature of the
//! placing phase: drops on empty intersections, one fixed mill line that
//! triggers the capture sub-turn, material-based terminal classification.

use merels::evaluation::{Oracle, Prediction};
use merels::mill::board::CanonicalBoard;
use merels::mill::core::{Phase, Point, MINIMUM_PIECES, PIECES_PER_SIDE};
use merels::mill::moves::{Action, ActionMask, Move, ACTION_SIZE};
use merels::mill::rules::Rules;

/// The single mill line of the scripted game.
pub const MILL_LINE: [Point; 3] = [Point::D7, Point::D6, Point::D5];

/// Placement-only mill rules: place on empty points, closing the
/// d7-d6-d5 line grants a removal, a side below the piece minimum loses and
/// exhausting the placement budget is a small-value draw.
pub struct PlacementGame;

impl PlacementGame {
    fn material(board: &CanonicalBoard, own: bool) -> u8 {
        let (pieces, player) = if own {
            (board.own(), board.to_move())
        } else {
            (board.their(), board.to_move().opponent())
        };
        pieces.count() + board.in_hand(player)
    }

    fn closes_mill(board: &CanonicalBoard, placed_at: Point) -> bool {
        MILL_LINE.contains(&placed_at)
            && MILL_LINE
                .iter()
                .all(|&point| point == placed_at || board.own().contains(point))
    }
}

impl Rules for PlacementGame {
    fn valid_moves(&self, board: &CanonicalBoard) -> ActionMask {
        let mut actions = Vec::new();
        match board.phase() {
            Phase::Placing => {
                for point in (!(board.own() | board.their())).iter() {
                    actions.push(Move::Place(point).action());
                }
            },
            Phase::Capture => {
                for point in board.their().iter() {
                    actions.push(Move::Remove(point).action());
                }
            },
            _ => {},
        }
        ActionMask::from_actions(&actions)
    }

    fn next_state(&self, board: &CanonicalBoard, action: Action) -> anyhow::Result<CanonicalBoard> {
        match Move::from_action(board.phase(), action)? {
            Move::Place(point) => {
                let own = board.own() | point.into();
                if Self::closes_mill(board, point) {
                    // The mill keeps the same side moving: no perspective
                    // swap on the way into the capture sub-turn.
                    CanonicalBoard::new(
                        board.to_move(),
                        Phase::Capture,
                        own,
                        board.their(),
                        board.placed() + 1,
                    )
                } else {
                    CanonicalBoard::new(
                        board.to_move().opponent(),
                        Phase::Placing,
                        board.their(),
                        own,
                        board.placed() + 1,
                    )
                }
            },
            Move::Remove(point) => CanonicalBoard::new(
                board.to_move().opponent(),
                Phase::Placing,
                board.their() - point.into(),
                board.own(),
                board.placed(),
            ),
            Move::Shift { .. } => anyhow::bail!("the placement game never shifts"),
        }
        .map(|next| next.with_history(0, board.move_count() + 1, false))
    }

    fn game_ended(&self, board: &CanonicalBoard) -> f32 {
        if Self::material(board, false) < MINIMUM_PIECES {
            return 1.0;
        }
        if Self::material(board, true) < MINIMUM_PIECES {
            return -1.0;
        }
        if board.placed() >= 2 * PIECES_PER_SIDE && board.phase() != Phase::Capture {
            // Placement budget exhausted: a rule-based early stop with a
            // small-magnitude draw value.
            return 1e-4;
        }
        0.0
    }
}

/// Uniform-prior oracle that counts how often the search consulted it.
pub struct CountingOracle {
    pub calls: u32,
}

impl CountingOracle {
    pub const fn new() -> Self {
        Self { calls: 0 }
    }
}

impl Oracle for CountingOracle {
    fn predict(&mut self, _board: &CanonicalBoard) -> anyhow::Result<Prediction> {
        self.calls += 1;
        Ok(Prediction {
            policy: vec![1.0 / ACTION_SIZE as f32; ACTION_SIZE],
            value: 0.0,
        })
    }
}
