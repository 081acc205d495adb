//! Translation of a [`CanonicalBoard`] into the database's native
//! addressing scheme.
//!
//! The database numbers the 24 intersections ring by ring (outer, middle,
//! inner), each ring clockwise from the western mid-edge point. That
//! numbering has nothing to do with the file-major [`Point`] order used by
//! the action space, so encoding is a genuine permutation, performed through
//! the two lookup tables below. Side to move is a bit with 0 = first player
//! and 1 = second player — deliberately the inverse of the board contract,
//! which puts the first player (white) first everywhere.

use arrayvec::ArrayVec;

use crate::mill::board::CanonicalBoard;
use crate::mill::core::{Phase, Player, Point, BOARD_POINTS, PIECES_PER_SIDE};
use crate::tablebase::Error;

/// Database intersection index for each [`Point`], in point declaration
/// order.
#[rustfmt::skip]
const DATABASE_INDEX: [u8; BOARD_POINTS as usize] = [
    1, 0, 7,          // a7 a4 a1
    9, 8, 15,         // b6 b4 b2
    17, 16, 23,       // c5 c4 c3
    2, 10, 18, 22, 14, 6, // d7 d6 d5 d3 d2 d1
    19, 20, 21,       // e5 e4 e3
    11, 12, 13,       // f6 f4 f2
    3, 4, 5,          // g7 g4 g1
];

/// Inverse of [`DATABASE_INDEX`]: the intersection behind each database
/// index.
#[rustfmt::skip]
const POINT_AT: [Point; BOARD_POINTS as usize] = [
    Point::A4, Point::A7, Point::D7, Point::G7, // 0..=3
    Point::G4, Point::G1, Point::D1, Point::A1, // 4..=7
    Point::B4, Point::B6, Point::D6, Point::F6, // 8..=11
    Point::F4, Point::F2, Point::D2, Point::B2, // 12..=15
    Point::C4, Point::C5, Point::D5, Point::E5, // 16..=19
    Point::E4, Point::E3, Point::D3, Point::C3, // 20..=23
];

/// Database index of an intersection.
#[must_use]
pub const fn database_index(point: Point) -> u8 {
    DATABASE_INDEX[point as usize]
}

/// Intersection behind a database index.
///
/// # Panics
///
/// Panics if the index is not below [`BOARD_POINTS`].
#[must_use]
pub const fn point_at(index: u8) -> Point {
    POINT_AT[index as usize]
}

/// A fully addressed database query: a pure function of a
/// [`CanonicalBoard`] and the memoization key of the client.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Encoding {
    /// White pieces, one bit per intersection in database numbering.
    pub white_bits: u32,
    /// Black pieces, one bit per intersection in database numbering.
    pub black_bits: u32,
    /// Pieces white still holds in hand.
    pub white_in_hand: u8,
    /// Pieces black still holds in hand.
    pub black_in_hand: u8,
    /// 0 when the first player moves, 1 for the second player.
    pub side_to_move: u8,
    /// Set exactly when the position is a mandatory-removal sub-turn.
    pub only_capture: bool,
}

impl Encoding {
    /// The sector holding this query.
    #[must_use]
    pub const fn sector(&self) -> Sector {
        Sector {
            white_on_board: self.white_bits.count_ones() as u8,
            black_on_board: self.black_bits.count_ones() as u8,
            white_in_hand: self.white_in_hand,
            black_in_hand: self.black_in_hand,
        }
    }

    /// White intersections recovered from the bitboard, in database-index
    /// order.
    #[must_use]
    pub fn white_points(&self) -> ArrayVec<Point, 24> {
        points_of(self.white_bits)
    }

    /// Black intersections recovered from the bitboard, in database-index
    /// order.
    #[must_use]
    pub fn black_points(&self) -> ArrayVec<Point, 24> {
        points_of(self.black_bits)
    }
}

fn points_of(bits: u32) -> ArrayVec<Point, 24> {
    let mut result = ArrayVec::new();
    for index in 0..BOARD_POINTS {
        if bits & (1_u32 << index) != 0 {
            result.push(point_at(index));
        }
    }
    result
}

/// Partition of the database by piece accounting. Every query lands in
/// exactly one sector file of the distributed data.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Sector {
    #[allow(missing_docs)]
    pub white_on_board: u8,
    #[allow(missing_docs)]
    pub black_on_board: u8,
    #[allow(missing_docs)]
    pub white_in_hand: u8,
    #[allow(missing_docs)]
    pub black_in_hand: u8,
}

impl std::fmt::Display for Sector {
    /// File name of the sector in the distributed database.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "std_{}_{}_{}_{}.sec2",
            self.white_on_board, self.black_on_board, self.white_in_hand, self.black_in_hand
        )
    }
}

/// Addresses a board in the database scheme, validating piece accounting
/// first.
///
/// # Errors
///
/// [`Error::PieceOverflow`] when one side's on-board plus in-hand total
/// exceeds [`PIECES_PER_SIDE`]; [`Error::TotalOverflow`] when both sides
/// together exceed twice that. Validation failures never reach the backend.
pub fn encode(board: &CanonicalBoard) -> Result<Encoding, Error> {
    let mut totals = [0_u8; 2];
    for (slot, player) in [Player::White, Player::Black].into_iter().enumerate() {
        let on_board = board.pieces(player).count();
        let in_hand = board.in_hand(player);
        if on_board + in_hand > PIECES_PER_SIDE {
            return Err(Error::PieceOverflow {
                player,
                on_board,
                in_hand,
            });
        }
        totals[slot] = on_board + in_hand;
    }
    let total = totals[0] + totals[1];
    if total > 2 * PIECES_PER_SIDE {
        return Err(Error::TotalOverflow { total });
    }

    let mut white_bits = 0_u32;
    for point in board.pieces(Player::White).iter() {
        white_bits |= 1_u32 << database_index(point);
    }
    let mut black_bits = 0_u32;
    for point in board.pieces(Player::Black).iter() {
        black_bits |= 1_u32 << database_index(point);
    }

    Ok(Encoding {
        white_bits,
        black_bits,
        white_in_hand: board.in_hand(Player::White),
        black_in_hand: board.in_hand(Player::Black),
        side_to_move: match board.to_move() {
            Player::White => 0,
            Player::Black => 1,
        },
        only_capture: board.phase() == Phase::Capture,
    })
}
