use rand::{Rng, distr::StandardUniform, prelude::Distribution};
use serde::{Deserialize, Serialize};

use super::occupancy::CellKey;

/// Colour of a block.
///
/// The palette has nine entries. Each colour carries a face value (its 1-based position in
/// the palette) which becomes the initial value of every block painted with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[repr(u8)]
pub enum BlockColor {
    Crimson = 0,
    DodgerBlue = 1,
    Gold = 2,
    Green = 3,
    DarkOrange = 4,
    DeepPink = 5,
    DarkTurquoise = 6,
    BlueViolet = 7,
    LimeGreen = 8,
}

impl Distribution<BlockColor> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> BlockColor {
        BlockColor::ALL[rng.random_range(0..BlockColor::LEN)]
    }
}

impl BlockColor {
    /// Number of colours in the palette (9).
    pub const LEN: usize = 9;

    pub const ALL: [Self; Self::LEN] = [
        Self::Crimson,
        Self::DodgerBlue,
        Self::Gold,
        Self::Green,
        Self::DarkOrange,
        Self::DeepPink,
        Self::DarkTurquoise,
        Self::BlueViolet,
        Self::LimeGreen,
    ];

    /// Initial value of a block painted with this colour.
    ///
    /// ```
    /// use hexblox_engine::BlockColor;
    ///
    /// assert_eq!(BlockColor::Crimson.face_value(), 1);
    /// assert_eq!(BlockColor::LimeGreen.face_value(), 9);
    /// ```
    #[must_use]
    pub const fn face_value(self) -> u32 {
        self as u32 + 1
    }
}

/// One coloured, valued cell belonging to a piece.
///
/// The offset is relative to the owning piece's origin. A hidden block (`visible == false`)
/// is ignored by every occupancy, collision and line query, but stays allocated until its
/// piece is garbage-collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    dx: i32,
    dy: i32,
    color: BlockColor,
    value: u32,
    visible: bool,
    flashing: bool,
}

impl Block {
    #[must_use]
    pub(crate) fn new(dx: i32, dy: i32, color: BlockColor) -> Self {
        Self {
            dx,
            dy,
            color,
            value: color.face_value(),
            visible: true,
            flashing: false,
        }
    }

    #[must_use]
    pub fn offset(&self) -> (i32, i32) {
        (self.dx, self.dy)
    }

    #[must_use]
    pub fn color(&self) -> BlockColor {
        self.color
    }

    #[must_use]
    pub fn value(&self) -> u32 {
        self.value
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[must_use]
    pub fn is_flashing(&self) -> bool {
        self.flashing
    }

    /// Absolute cell of this block for a piece whose origin is `origin`.
    #[must_use]
    pub fn cell(&self, origin: CellKey) -> CellKey {
        CellKey::new(origin.x + self.dx, origin.y + self.dy)
    }

    pub(crate) fn set_value(&mut self, value: u32) {
        self.value = value;
    }

    pub(crate) fn set_flashing(&mut self, flashing: bool) {
        self.flashing = flashing;
    }

    pub(crate) fn hide(&mut self) {
        self.visible = false;
        self.flashing = false;
    }

    /// Moves the block one row down inside its piece (row compaction after a line clear).
    pub(crate) fn shift_down(&mut self) {
        self.dy += 1;
    }
}

/// A visible block together with its absolute cell, as handed to renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedBlock {
    pub cell: CellKey,
    pub block: Block,
}
