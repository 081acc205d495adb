//! Mill-game primitives commonly used within [`crate::mill`].

use std::fmt::{self, Write};
use std::mem;

use anyhow::bail;

/// Number of valid intersections on a nine men's morris board.
pub const BOARD_POINTS: u8 = 24;

/// Pieces each side starts with in hand.
pub const PIECES_PER_SIDE: u8 = 9;

/// A side whose on-board piece count drops to this threshold may fly to any
/// empty intersection instead of sliding along adjacency lines.
pub const FLYING_THRESHOLD: u8 = 3;

/// A side that goes below [`FLYING_THRESHOLD`] on-board pieces (with nothing
/// left in hand) has lost the game.
pub const MINIMUM_PIECES: u8 = 3;

/// A player of the game. White always moves first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Player {
    #[allow(missing_docs)]
    White,
    #[allow(missing_docs)]
    Black,
}

impl Player {
    /// "Flips" the color.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char(match self {
            Self::White => 'w',
            Self::Black => 'b',
        })
    }
}

/// Phase of the game, driving both move semantics and the search backup rule.
///
/// [`Phase::Moving`] and [`Phase::Flying`] are the interchangeable
/// sliding/flying pair: flying unlocks once a side's on-board piece count
/// drops to [`FLYING_THRESHOLD`]. [`Phase::Capture`] is entered immediately
/// after a mill is formed and returns control to whichever phase was active
/// beforehand, without advancing the side to move.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Phase {
    /// Both sides still have pieces in hand and drop them on empty points.
    Placing,
    /// Pieces slide along adjacency lines.
    Moving,
    /// At least one side is down to [`FLYING_THRESHOLD`] pieces and may jump
    /// to any empty point.
    Flying,
    /// A mill was just closed; the same side must remove one opposing piece.
    Capture,
}

impl Phase {
    /// Returns true for the sliding/flying pair of phases.
    #[must_use]
    pub const fn is_shifting(self) -> bool {
        matches!(self, Self::Moving | Self::Flying)
    }
}

/// Board intersections in file-major order (files `a` to `g`, ranks `7` down
/// to `1` within a file), which is also the action-index order of the flat
/// policy head:
///
/// ```
/// use merels::mill::core::Point;
///
/// assert_eq!(Point::A7 as u8, 0);
/// assert_eq!(Point::C5 as u8, 6);
/// assert_eq!(Point::G1 as u8, 23);
/// ```
///
/// Point is a compact representation using only one byte.
///
/// ```
/// use merels::mill::core::Point;
///
/// assert_eq!(std::mem::size_of::<Point>(), 1);
/// ```
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::EnumIter)]
#[rustfmt::skip]
#[allow(missing_docs)]
pub enum Point {
    A7, A4, A1,
    B6, B4, B2,
    C5, C4, C3,
    D7, D6, D5, D3, D2, D1,
    E5, E4, E3,
    F6, F4, F2,
    G7, G4, G1,
}

/// Coordinate tokens in [`Point`] declaration order.
#[rustfmt::skip]
const TOKENS: [&str; BOARD_POINTS as usize] = [
    "a7", "a4", "a1",
    "b6", "b4", "b2",
    "c5", "c4", "c3",
    "d7", "d6", "d5", "d3", "d2", "d1",
    "e5", "e4", "e3",
    "f6", "f4", "f2",
    "g7", "g4", "g1",
];

impl Point {
    /// Coordinate token of this intersection, e.g. `"d5"`.
    #[must_use]
    pub const fn token(self) -> &'static str {
        TOKENS[self as usize]
    }

    /// File (column) letter of this intersection.
    #[must_use]
    pub const fn file(self) -> char {
        self.token().as_bytes()[0] as char
    }

    /// Rank (row) digit of this intersection, `1..=7`.
    #[must_use]
    pub const fn rank(self) -> u8 {
        self.token().as_bytes()[1] - b'0'
    }
}

impl TryFrom<u8> for Point {
    type Error = anyhow::Error;

    /// Creates a point given its index in file-major order.
    ///
    /// # Errors
    ///
    /// Fails if the index does not address one of the 24 intersections.
    fn try_from(index: u8) -> anyhow::Result<Self> {
        if index >= BOARD_POINTS {
            bail!("point index should be in 0..{BOARD_POINTS}, got {index}");
        }
        // SAFETY: Point is repr(u8) with exactly BOARD_POINTS variants and
        // the index was just bounds-checked.
        Ok(unsafe { mem::transmute::<u8, Self>(index) })
    }
}

impl TryFrom<&str> for Point {
    type Error = anyhow::Error;

    /// Parses a coordinate token such as `"g4"`.
    ///
    /// # Errors
    ///
    /// Fails if the token does not name a valid intersection: `"d4"` is the
    /// board center and `"a2"` lies between rings.
    fn try_from(token: &str) -> anyhow::Result<Self> {
        match TOKENS.iter().position(|&candidate| candidate == token) {
            Some(index) => Ok(Self::try_from(index as u8)?),
            None => bail!("point should be a valid intersection token, got {token}"),
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
