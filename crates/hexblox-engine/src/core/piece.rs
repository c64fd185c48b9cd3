use rand::{Rng, distr::StandardUniform, prelude::Distribution};
use serde::{Deserialize, Serialize};

use super::{
    BOARD_HEIGHT, BOARD_WIDTH,
    block::{Block, BlockColor},
    occupancy::{CellKey, Direction, Matrix},
};

/// Column a freshly dequeued piece is moved to before it starts falling.
pub const SPAWN_X: i32 = 3;

/// Stable identity of a piece on the board.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize, derive_more::Display,
)]
#[display("#{_0}")]
pub struct PieceId(u64);

impl PieceId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// A falling or settled group of blocks, or one of the static barriers.
///
/// A piece is one record parameterised by its kind's rotation table: every rotation state owns
/// its own list of blocks, all painted from the same four colours chosen when the piece was
/// created. Rotation only changes which list is current.
///
/// # Example
///
/// ```
/// use hexblox_engine::{BlockColor, Matrix, Piece, PieceId, PieceKind};
///
/// let mut piece = Piece::new(PieceId::new(1), PieceKind::Purple, [BlockColor::Gold; 4]);
/// let matrix = Matrix::new();
/// assert!(piece.try_rotate(&matrix));
/// assert_eq!(piece.rotation().index(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    id: PieceId,
    kind: PieceKind,
    origin: CellKey,
    rotation: PieceRotation,
    falling: bool,
    states: Vec<Vec<Block>>,
}

/// Result of [`Piece::try_move`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum MoveOutcome {
    /// The origin was translated.
    Moved,
    /// Sideways movement was rejected; nothing changed.
    Blocked,
    /// Downward movement was rejected and the piece is now settled.
    ///
    /// `at_top` is set when the piece settled with its origin on row 0.
    Settled { at_top: bool },
    /// The piece is a barrier or already settled.
    Ignored,
}

impl Piece {
    /// Creates a falling piece (or a barrier) at origin `(0, 0)` in rotation state 0.
    ///
    /// `colors[slot]` paints every cell whose template references `slot`.
    #[must_use]
    pub fn new(id: PieceId, kind: PieceKind, colors: [BlockColor; 4]) -> Self {
        let table = kind.rotation_table();
        debug_assert!(!table.is_empty(), "{kind:?} has no rotation states");
        let states = table
            .iter()
            .map(|cells| {
                cells
                    .iter()
                    .map(|t| Block::new(t.dx.into(), t.dy.into(), colors[usize::from(t.slot)]))
                    .collect()
            })
            .collect();
        Self {
            id,
            kind,
            origin: CellKey::new(0, 0),
            rotation: PieceRotation::default(),
            falling: !kind.is_barrier(),
            states,
        }
    }

    #[must_use]
    pub fn with_origin(mut self, origin: CellKey) -> Self {
        self.origin = origin;
        self
    }

    #[must_use]
    pub fn id(&self) -> PieceId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub fn origin(&self) -> CellKey {
        self.origin
    }

    #[must_use]
    pub fn rotation(&self) -> PieceRotation {
        self.rotation
    }

    #[must_use]
    pub fn is_falling(&self) -> bool {
        self.falling
    }

    #[must_use]
    pub fn is_barrier(&self) -> bool {
        self.kind.is_barrier()
    }

    /// Blocks of the current rotation state, hidden ones included.
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.states[self.rotation.index()]
    }

    /// Visible blocks of the current rotation state with their absolute cells.
    pub fn visible_blocks(&self) -> impl Iterator<Item = (CellKey, &Block)> + '_ {
        self.blocks()
            .iter()
            .filter(|b| b.is_visible())
            .map(|b| (b.cell(self.origin), b))
    }

    /// Absolute cells of the visible blocks.
    pub fn cells(&self) -> impl Iterator<Item = CellKey> + '_ {
        self.visible_blocks().map(|(cell, _)| cell)
    }

    /// Cells the piece would cover after one step in `direction`.
    pub fn moved_cells(&self, direction: Direction) -> impl Iterator<Item = CellKey> + '_ {
        self.cells().map(move |cell| cell.moved(direction))
    }

    /// Cells the piece would cover in its next rotation state, origin unchanged.
    pub fn rotated_cells(&self) -> impl Iterator<Item = CellKey> + '_ {
        let next = self.rotation.rotated(self.states.len());
        self.states[next.index()]
            .iter()
            .filter(|b| b.is_visible())
            .map(|b| b.cell(self.origin))
    }

    /// Returns `true` if one step in `direction` lands on no cell of `matrix`.
    #[must_use]
    pub fn can_move(&self, direction: Direction, matrix: &Matrix) -> bool {
        self.moved_cells(direction).all(|cell| !matrix.contains(&cell))
    }

    /// Returns `true` if the next rotation state lands on no cell of `matrix`.
    #[must_use]
    pub fn can_rotate(&self, matrix: &Matrix) -> bool {
        self.rotated_cells().all(|cell| !matrix.contains(&cell))
    }

    /// Moves the piece one step if the target cells are free.
    ///
    /// A rejected downward step settles the piece where it is.
    pub fn try_move(&mut self, direction: Direction, matrix: &Matrix) -> MoveOutcome {
        if self.is_barrier() || !self.falling {
            return MoveOutcome::Ignored;
        }
        if self.can_move(direction, matrix) {
            self.origin = self.origin.moved(direction);
            return MoveOutcome::Moved;
        }
        if direction.is_down() {
            self.falling = false;
            return MoveOutcome::Settled {
                at_top: self.origin.y == 0,
            };
        }
        MoveOutcome::Blocked
    }

    /// Advances to the next rotation state if it fits. There is no wall kick.
    pub fn try_rotate(&mut self, matrix: &Matrix) -> bool {
        if !self.falling || !self.can_rotate(matrix) {
            return false;
        }
        self.rotation = self.rotation.rotated(self.states.len());
        true
    }

    /// Moves the piece to the spawn column.
    pub(crate) fn center(&mut self) {
        self.origin.x = SPAWN_X;
    }

    #[cfg(test)]
    pub(crate) fn settle(&mut self) {
        self.falling = false;
    }

    pub(crate) fn set_rotation(&mut self, rotation: PieceRotation) {
        debug_assert!(rotation.index() < self.states.len());
        self.rotation = rotation;
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut [Block] {
        let rotation = self.rotation.index();
        &mut self.states[rotation]
    }

    /// Returns `true` when every block of the current state is hidden.
    #[must_use]
    pub fn is_fully_hidden(&self) -> bool {
        self.blocks().iter().all(|b| !b.is_visible())
    }
}

/// Rotation state index of a piece.
///
/// Movable pieces have four states and advance `0 → 1 → 2 → 3 → 0`; barriers have one.
/// There is no reverse rotation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct PieceRotation(u8);

impl PieceRotation {
    #[must_use]
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[must_use]
    #[expect(clippy::cast_possible_truncation)]
    fn rotated(self, count: usize) -> Self {
        Self(((self.index() + 1) % count) as u8)
    }
}

/// Kind of a piece: seven movable colours plus the two barrier shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[repr(u8)]
pub enum PieceKind {
    /// 2×2 square.
    Yellow = 0,
    /// Z-shaped skew.
    Red = 1,
    /// L-shaped.
    Orange = 2,
    /// S-shaped skew.
    Green = 3,
    /// T-shaped.
    Purple = 4,
    /// J-shaped.
    Blue = 5,
    /// Straight line of four.
    Cyan = 6,
    /// Floor spanning the full width below the last row.
    BottomBarrier = 7,
    /// Wall spanning the full height beside the first or last column.
    SideBarrier = 8,
}

impl Distribution<PieceKind> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceKind {
        PieceKind::MOVABLE[rng.random_range(0..PieceKind::MOVABLE.len())]
    }
}

impl PieceKind {
    /// The movable kinds, in declaration order.
    pub const MOVABLE: [Self; 7] = [
        Self::Yellow,
        Self::Red,
        Self::Orange,
        Self::Green,
        Self::Purple,
        Self::Blue,
        Self::Cyan,
    ];

    #[must_use]
    pub const fn is_barrier(self) -> bool {
        matches!(self, Self::BottomBarrier | Self::SideBarrier)
    }

    /// Number of rotation states (4 for movable kinds, 1 for barriers).
    #[must_use]
    pub fn rotation_count(self) -> usize {
        self.rotation_table().len()
    }

    fn rotation_table(self) -> &'static [&'static [CellTemplate]] {
        match self {
            Self::Yellow => &YELLOW,
            Self::Red => &RED,
            Self::Orange => &ORANGE,
            Self::Green => &GREEN,
            Self::Purple => &PURPLE,
            Self::Blue => &BLUE,
            Self::Cyan => &CYAN,
            Self::BottomBarrier => &BOTTOM_BARRIER,
            Self::SideBarrier => &SIDE_BARRIER,
        }
    }

    /// Returns the single character code of this kind.
    ///
    /// ```
    /// use hexblox_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::Yellow.as_char(), 'Y');
    /// assert_eq!(PieceKind::Cyan.as_char(), 'C');
    /// ```
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Yellow => 'Y',
            Self::Red => 'R',
            Self::Orange => 'O',
            Self::Green => 'G',
            Self::Purple => 'P',
            Self::Blue => 'B',
            Self::Cyan => 'C',
            Self::BottomBarrier => '_',
            Self::SideBarrier => '|',
        }
    }

    /// Parses a movable kind from its character code.
    ///
    /// ```
    /// use hexblox_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_char('P'), Some(PieceKind::Purple));
    /// assert_eq!(PieceKind::from_char('_'), None);
    /// ```
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'Y' => Some(Self::Yellow),
            'R' => Some(Self::Red),
            'O' => Some(Self::Orange),
            'G' => Some(Self::Green),
            'P' => Some(Self::Purple),
            'B' => Some(Self::Blue),
            'C' => Some(Self::Cyan),
            _ => None,
        }
    }
}

/// One cell of a rotation state: offset from the piece origin and the colour slot it uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellTemplate {
    dx: i8,
    dy: i8,
    slot: u8,
}

const fn t(dx: i8, dy: i8, slot: u8) -> CellTemplate {
    CellTemplate { dx, dy, slot }
}

#[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
const fn barrier_cells<const N: usize>(horizontal: bool) -> [CellTemplate; N] {
    let mut cells = [t(0, 0, 0); N];
    let mut i = 0;
    while i < N {
        cells[i] = if horizontal {
            t(i as i8, 0, 0)
        } else {
            t(0, i as i8, 0)
        };
        i += 1;
    }
    cells
}

static YELLOW: [&[CellTemplate]; 4] = [
    &[t(1, 1, 0), t(2, 1, 1), t(1, 2, 2), t(2, 2, 3)],
    &[t(1, 1, 2), t(2, 1, 0), t(1, 2, 3), t(2, 2, 1)],
    &[t(1, 1, 3), t(2, 1, 2), t(1, 2, 1), t(2, 2, 0)],
    &[t(1, 1, 1), t(2, 1, 3), t(1, 2, 0), t(2, 2, 2)],
];

static RED: [&[CellTemplate]; 4] = [
    &[t(1, 0, 0), t(1, 1, 1), t(0, 1, 2), t(0, 2, 3)],
    &[t(0, 0, 3), t(1, 0, 2), t(1, 1, 1), t(2, 1, 0)],
    &[t(2, 0, 3), t(2, 1, 2), t(1, 1, 1), t(1, 2, 0)],
    &[t(0, 1, 0), t(1, 1, 1), t(1, 2, 2), t(2, 2, 3)],
];

static ORANGE: [&[CellTemplate]; 4] = [
    &[t(2, 0, 0), t(0, 1, 1), t(1, 1, 2), t(2, 1, 3)],
    &[t(1, 0, 1), t(1, 1, 2), t(1, 2, 3), t(2, 2, 0)],
    &[t(0, 1, 3), t(1, 1, 2), t(2, 1, 1), t(0, 2, 0)],
    &[t(0, 0, 0), t(1, 0, 3), t(1, 1, 2), t(1, 2, 1)],
];

static GREEN: [&[CellTemplate]; 4] = [
    &[t(0, 0, 0), t(0, 1, 1), t(1, 1, 2), t(1, 2, 3)],
    &[t(0, 1, 3), t(1, 1, 2), t(1, 0, 1), t(2, 0, 0)],
    &[t(1, 0, 3), t(1, 1, 2), t(2, 1, 1), t(2, 2, 0)],
    &[t(0, 2, 0), t(1, 2, 1), t(1, 1, 2), t(2, 1, 3)],
];

static PURPLE: [&[CellTemplate]; 4] = [
    &[t(1, 0, 0), t(1, 1, 1), t(1, 2, 2), t(2, 1, 3)],
    &[t(0, 1, 2), t(1, 1, 1), t(2, 1, 0), t(1, 2, 3)],
    &[t(1, 0, 2), t(1, 1, 1), t(1, 2, 0), t(0, 1, 3)],
    &[t(1, 0, 3), t(0, 1, 0), t(1, 1, 1), t(2, 1, 2)],
];

static BLUE: [&[CellTemplate]; 4] = [
    &[t(0, 2, 3), t(1, 0, 0), t(1, 1, 1), t(1, 2, 2)],
    &[t(0, 0, 3), t(0, 1, 2), t(1, 1, 1), t(2, 1, 0)],
    &[t(1, 0, 2), t(1, 1, 1), t(1, 2, 0), t(2, 0, 3)],
    &[t(0, 1, 0), t(1, 1, 1), t(2, 1, 2), t(2, 2, 3)],
];

static CYAN: [&[CellTemplate]; 4] = [
    &[t(0, 1, 0), t(1, 1, 1), t(2, 1, 2), t(3, 1, 3)],
    &[t(2, 0, 0), t(2, 1, 1), t(2, 2, 2), t(2, 3, 3)],
    &[t(0, 1, 3), t(1, 1, 2), t(2, 1, 1), t(3, 1, 0)],
    &[t(2, 0, 3), t(2, 1, 2), t(2, 2, 1), t(2, 3, 0)],
];

static BOTTOM_BARRIER: [&[CellTemplate]; 1] = [&barrier_cells::<BOARD_WIDTH>(true)];

static SIDE_BARRIER: [&[CellTemplate]; 1] = [&barrier_cells::<BOARD_HEIGHT>(false)];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn piece(kind: PieceKind) -> Piece {
        Piece::new(PieceId::new(1), kind, [BlockColor::Crimson; 4])
    }

    #[test]
    fn test_movable_kinds_have_four_states_of_four_cells() {
        for kind in PieceKind::MOVABLE {
            assert_eq!(kind.rotation_count(), 4, "{kind:?}");
            for state in kind.rotation_table() {
                assert_eq!(state.len(), 4, "{kind:?}");
                let distinct: HashSet<_> = state.iter().map(|t| (t.dx, t.dy)).collect();
                assert_eq!(distinct.len(), 4, "{kind:?} has overlapping cells");
                let slots: HashSet<_> = state.iter().map(|t| t.slot).collect();
                assert_eq!(slots.len(), 4, "{kind:?} reuses a colour slot");
            }
        }
    }

    #[test]
    fn test_barrier_tables() {
        assert_eq!(PieceKind::BottomBarrier.rotation_count(), 1);
        assert_eq!(PieceKind::SideBarrier.rotation_count(), 1);
        let bottom = piece(PieceKind::BottomBarrier);
        assert_eq!(bottom.blocks().len(), BOARD_WIDTH);
        assert!(!bottom.is_falling());
        let side = piece(PieceKind::SideBarrier);
        assert_eq!(side.blocks().len(), BOARD_HEIGHT);
        assert_eq!(side.blocks()[19].offset(), (0, 19));
    }

    #[test]
    fn test_colors_follow_slots() {
        let colors = [
            BlockColor::Crimson,
            BlockColor::Gold,
            BlockColor::Green,
            BlockColor::LimeGreen,
        ];
        let p = Piece::new(PieceId::new(1), PieceKind::Cyan, colors);
        let values: Vec<_> = p.blocks().iter().map(Block::value).collect();
        assert_eq!(values, vec![1, 3, 4, 9]);
    }

    #[test]
    fn test_rotation_cycles_through_four_states() {
        let mut p = piece(PieceKind::Purple).with_origin(CellKey::new(4, 5));
        let matrix = Matrix::new();
        let start: Vec<_> = p.cells().collect();
        for expected in [1, 2, 3, 0] {
            assert!(p.try_rotate(&matrix));
            assert_eq!(p.rotation().index(), expected);
        }
        assert_eq!(p.cells().collect::<Vec<_>>(), start);
    }

    #[test]
    fn test_rotation_rejected_when_next_state_collides() {
        // Cyan state 1 covers column 2 from row 0 to row 3 relative to the origin.
        let mut p = piece(PieceKind::Cyan).with_origin(CellKey::new(0, 5));
        let matrix: Matrix = [CellKey::new(2, 8)].into_iter().collect();
        assert!(!p.can_rotate(&matrix));
        assert!(!p.try_rotate(&matrix));
        assert_eq!(p.rotation().index(), 0);
        assert_eq!(p.origin(), CellKey::new(0, 5));
    }

    #[test]
    fn test_settled_piece_ignores_rotate_and_move() {
        let mut p = piece(PieceKind::Yellow);
        let floor: Matrix = (0..10).map(|x| CellKey::new(x, 4)).collect();
        assert_eq!(p.try_move(Direction::Down, &floor), MoveOutcome::Moved);
        assert_eq!(
            p.try_move(Direction::Down, &floor),
            MoveOutcome::Settled { at_top: false }
        );
        assert!(!p.is_falling());
        assert!(!p.try_rotate(&Matrix::new()));
        assert_eq!(p.try_move(Direction::Left, &Matrix::new()), MoveOutcome::Ignored);
    }

    #[test]
    fn test_settle_at_top_is_reported() {
        let mut p = piece(PieceKind::Yellow);
        let floor: Matrix = (0..10).map(|x| CellKey::new(x, 3)).collect();
        assert_eq!(
            p.try_move(Direction::Down, &floor),
            MoveOutcome::Settled { at_top: true }
        );
    }

    #[test]
    fn test_sideways_block_leaves_piece_falling() {
        let mut p = piece(PieceKind::Yellow).with_origin(CellKey::new(-1, 0));
        let wall: Matrix = (0..20).map(|y| CellKey::new(-1, y)).collect();
        assert_eq!(p.try_move(Direction::Left, &wall), MoveOutcome::Blocked);
        assert!(p.is_falling());
        assert_eq!(p.try_move(Direction::Right, &wall), MoveOutcome::Moved);
        assert_eq!(p.origin(), CellKey::new(0, 0));
    }

    #[test]
    fn test_barrier_never_moves() {
        let mut p = piece(PieceKind::SideBarrier);
        assert_eq!(p.try_move(Direction::Down, &Matrix::new()), MoveOutcome::Ignored);
        assert!(!p.try_rotate(&Matrix::new()));
    }

    #[test]
    fn test_fully_hidden_piece_moves_freely() {
        let mut p = piece(PieceKind::Yellow);
        for block in p.blocks_mut() {
            block.hide();
        }
        assert!(p.is_fully_hidden());
        let everything: Matrix = (-1..=10)
            .flat_map(|x| (0..=20).map(move |y| CellKey::new(x, y)))
            .collect();
        assert!(p.can_move(Direction::Down, &everything));
        assert_eq!(p.cells().count(), 0);
    }

    #[test]
    fn test_kind_char_conversion() {
        for kind in PieceKind::MOVABLE {
            assert_eq!(PieceKind::from_char(kind.as_char()), Some(kind));
        }
        assert_eq!(PieceKind::from_char('x'), None);
    }
}
