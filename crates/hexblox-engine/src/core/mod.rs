//! Board geometry, blocks and pieces.
//!
//! Everything in this module is pure data plus collision arithmetic: no timers, no scoring.
//!
//! - [`CellKey`] / [`Direction`] - cell coordinates and movement deltas
//! - [`occupied_keys`] / [`query_block_at`] - occupancy queries over a piece list
//! - [`Block`] / [`BlockColor`] - one coloured, valued cell
//! - [`Piece`] / [`PieceKind`] - a group of blocks sharing an origin and rotation state

pub use self::{block::*, occupancy::*, piece::*};

pub(crate) mod block;
pub(crate) mod occupancy;
pub(crate) mod piece;

/// Number of playable columns.
pub const BOARD_WIDTH: usize = 10;
/// Number of playable rows.
pub const BOARD_HEIGHT: usize = 20;

#[expect(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
pub(crate) const WIDTH_I32: i32 = BOARD_WIDTH as i32;
#[expect(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
pub(crate) const HEIGHT_I32: i32 = BOARD_HEIGHT as i32;
