use std::{collections::HashSet, fmt};

use serde::{Deserialize, Serialize};

use super::{block::Block, piece::Piece, piece::PieceId};

/// Canonical key of one board cell.
///
/// Columns run from `-1` (left barrier) to `BOARD_WIDTH` (right barrier); rows from `0` (top)
/// to `BOARD_HEIGHT` (bottom barrier). Keys are compared for set membership only: a key never
/// owns a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct CellKey {
    pub x: i32,
    pub y: i32,
}

impl CellKey {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub const fn moved(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}y{}", self.x, self.y)
    }
}

/// Set of occupied cells used for collision testing.
pub type Matrix = HashSet<CellKey>;

/// Movement direction of a piece.
///
/// `Up` is never issued as a player command; it exists for probing the cell above a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, derive_more::IsVariant)]
pub enum Direction {
    Down,
    Left,
    Right,
    Up,
}

impl Direction {
    /// Cell delta `(dx, dy)`; `y` grows downward.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Up => (0, -1),
        }
    }
}

/// Address of one block inside the board's piece list.
///
/// Indices refer to the piece's current rotation state. Settled pieces never rotate, so a
/// reference taken on a settled piece stays valid until the piece is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockRef {
    pub piece: PieceId,
    pub index: usize,
}

/// Union of the visible cells of `pieces`.
pub fn occupied_keys<'a, I>(pieces: I) -> Matrix
where
    I: IntoIterator<Item = &'a Piece>,
{
    pieces.into_iter().flat_map(Piece::cells).collect()
}

/// Returns the visible block at `(x, y)` among `pieces`, if any.
///
/// At most one visible block may occupy a cell; debug builds assert this.
pub fn query_block_at<'a, I>(x: i32, y: i32, pieces: I) -> Option<&'a Block>
where
    I: IntoIterator<Item = &'a Piece>,
{
    let target = CellKey::new(x, y);
    let mut found = pieces
        .into_iter()
        .flat_map(Piece::visible_blocks)
        .filter(move |(cell, _)| *cell == target)
        .map(|(_, block)| block);
    let first = found.next();
    debug_assert!(
        found.next().is_none(),
        "two visible blocks share cell {target}"
    );
    first
}
