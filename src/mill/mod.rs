//! Implementation of the mill-game environment: primitives, the canonical
//! board state and the contract the search expects from a rules provider.

pub mod bitboard;
pub mod board;
pub mod core;
pub mod moves;
pub mod rules;
