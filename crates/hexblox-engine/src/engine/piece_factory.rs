use std::{collections::VecDeque, fmt::Write as _};

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::{BlockColor, CellKey, Piece, PieceId, PieceKind, PieceRotation};

const ROTATION_STATES: u8 = 4;

/// Produces pieces and keeps the lookahead queue.
///
/// Kinds come from one of three sources, in priority order:
///
/// 1. A forced kind passed to [`Self::enqueue`]
/// 2. The scripted sequence, when test mode is enabled (cycles and wraps)
/// 3. A uniformly random movable kind
///
/// Randomly drawn pieces also start in a random rotation state; forced and scripted pieces
/// start in state 0. Every piece gets four colours drawn uniformly from the palette.
///
/// # Example
///
/// ```
/// use hexblox_engine::{PieceFactory, PieceKind};
///
/// let mut factory = PieceFactory::new();
/// factory.enqueue(Some(PieceKind::Cyan));
/// factory.enqueue(None);
///
/// assert_eq!(factory.peek_next().map(|p| p.kind()), Some(PieceKind::Cyan));
/// let active = factory.dequeue_active();
/// assert_eq!(active.kind(), PieceKind::Cyan);
/// assert_eq!(factory.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct PieceFactory {
    rng: Pcg32,
    queue: VecDeque<Piece>,
    next_id: u64,
    test_mode: bool,
    test_sequence: Vec<PieceKind>,
    test_index: usize,
}

impl Default for PieceFactory {
    fn default() -> Self {
        Self::new()
    }
}

/// Seed for deterministic piece generation.
///
/// A 128-bit (16-byte) seed for the generator behind piece kinds, colours and initial
/// rotations. The same seed (and the same sequence of calls) yields the same pieces, which
/// makes games reproducible in tests and in the `simulate` command.
///
/// Serialised as a 32-character hexadecimal string.
///
/// # Example
///
/// ```
/// use hexblox_engine::{PieceFactory, PieceSeed};
/// use rand::Rng as _;
///
/// let seed: PieceSeed = rand::rng().random();
/// let mut a = PieceFactory::with_seed(seed);
/// let mut b = PieceFactory::with_seed(seed);
/// assert_eq!(a.dequeue_active().kind(), b.dequeue_active().kind());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceSeed([u8; 16]);

impl PieceSeed {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn from_u128(num: u128) -> Self {
        Self(num.to_be_bytes())
    }

    #[must_use]
    pub const fn to_u128(self) -> u128 {
        u128::from_be_bytes(self.0)
    }
}

impl Serialize for PieceSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let num = u128::from_be_bytes(self.0);
        let mut hex_str = String::with_capacity(2 * self.0.len());
        write!(&mut hex_str, "{num:032x}").map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&hex_str)
    }
}

impl<'de> Deserialize<'de> for PieceSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        hex_str.parse().map_err(serde::de::Error::custom)
    }
}

impl std::str::FromStr for PieceSeed {
    type Err = String;

    fn from_str(hex_str: &str) -> Result<Self, Self::Err> {
        if hex_str.len() != 32 {
            return Err(format!(
                "invalid hex: expected 32 characters, got {}",
                hex_str.len()
            ));
        }
        let num = u128::from_str_radix(hex_str, 16)
            .map_err(|e| format!("invalid hex: {hex_str} ({e})"))?;
        Ok(Self::from_u128(num))
    }
}

impl Distribution<PieceSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        PieceSeed(seed)
    }
}

impl PieceFactory {
    /// Creates an empty factory with a random seed.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(rand::rng().random())
    }

    /// Like [`Self::new`], but with a specific seed for deterministic generation.
    #[must_use]
    pub fn with_seed(seed: PieceSeed) -> Self {
        Self {
            rng: Pcg32::from_seed(seed.0),
            queue: VecDeque::with_capacity(2),
            next_id: 0,
            test_mode: false,
            test_sequence: Vec::new(),
            test_index: 0,
        }
    }

    /// Switches to scripted generation: unforced pieces follow `sequence`, wrapping at the end.
    ///
    /// An empty sequence leaves the factory in random mode.
    #[must_use]
    pub fn scripted(mut self, sequence: Vec<PieceKind>) -> Self {
        debug_assert!(
            sequence.iter().all(|k| !k.is_barrier()),
            "barrier in scripted sequence"
        );
        self.test_mode = !sequence.is_empty();
        self.test_sequence = sequence;
        self.test_index = 0;
        self
    }

    #[must_use]
    pub fn is_test_mode(&self) -> bool {
        self.test_mode
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Creates a piece and appends it to the queue.
    pub fn enqueue(&mut self, forced: Option<PieceKind>) {
        let piece = self.make_piece(forced);
        self.queue.push_back(piece);
    }

    /// Pops the front of the queue; this becomes the next active falling piece.
    ///
    /// An empty queue is refilled on the spot so the caller always gets a piece.
    pub fn dequeue_active(&mut self) -> Piece {
        match self.queue.pop_front() {
            Some(piece) => piece,
            None => self.make_piece(None),
        }
    }

    /// The piece [`Self::dequeue_active`] will return next.
    #[must_use]
    pub fn peek_next(&self) -> Option<&Piece> {
        self.queue.front()
    }

    /// Drops every queued piece and restarts the scripted sequence.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.test_index = 0;
    }

    /// Creates a barrier piece at `origin`. Barriers never enter the queue.
    pub fn make_barrier(&mut self, kind: PieceKind, origin: CellKey) -> Piece {
        debug_assert!(kind.is_barrier());
        Piece::new(self.alloc_id(), kind, [BlockColor::Crimson; 4]).with_origin(origin)
    }

    fn make_piece(&mut self, forced: Option<PieceKind>) -> Piece {
        let (kind, rotation) = match forced {
            Some(kind) => (kind, PieceRotation::default()),
            None if self.test_mode => {
                let kind = self.test_sequence[self.test_index];
                self.test_index = (self.test_index + 1) % self.test_sequence.len();
                (kind, PieceRotation::default())
            }
            None => {
                let kind = self.rng.random();
                let rotation = PieceRotation::new(self.rng.random_range(0..ROTATION_STATES));
                (kind, rotation)
            }
        };
        debug_assert!(!kind.is_barrier(), "barrier requested from the queue");
        let colors = [(); 4].map(|()| self.rng.random::<BlockColor>());
        let mut piece = Piece::new(self.alloc_id(), kind, colors);
        piece.set_rotation(rotation);
        piece
    }

    fn alloc_id(&mut self) -> PieceId {
        let id = PieceId::new(self.next_id);
        self.next_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(factory: &mut PieceFactory, n: usize) -> Vec<PieceKind> {
        (0..n).map(|_| factory.dequeue_active().kind()).collect()
    }

    #[test]
    fn test_fifo_order() {
        let mut factory = PieceFactory::with_seed(PieceSeed::from_u128(1));
        factory.enqueue(Some(PieceKind::Red));
        factory.enqueue(Some(PieceKind::Blue));
        assert_eq!(factory.peek_next().map(Piece::kind), Some(PieceKind::Red));
        assert_eq!(factory.dequeue_active().kind(), PieceKind::Red);
        assert_eq!(factory.dequeue_active().kind(), PieceKind::Blue);
        assert!(factory.is_empty());
    }

    #[test]
    fn test_forced_overrides_script() {
        let mut factory =
            PieceFactory::with_seed(PieceSeed::from_u128(1)).scripted(vec![PieceKind::Yellow]);
        factory.enqueue(Some(PieceKind::Cyan));
        factory.enqueue(None);
        assert_eq!(kinds(&mut factory, 2), vec![PieceKind::Cyan, PieceKind::Yellow]);
    }

    #[test]
    fn test_script_wraps() {
        let mut factory = PieceFactory::with_seed(PieceSeed::from_u128(1))
            .scripted(vec![PieceKind::Green, PieceKind::Purple]);
        assert_eq!(
            kinds(&mut factory, 5),
            vec![
                PieceKind::Green,
                PieceKind::Purple,
                PieceKind::Green,
                PieceKind::Purple,
                PieceKind::Green,
            ]
        );
    }

    #[test]
    fn test_clear_restarts_script() {
        let mut factory = PieceFactory::with_seed(PieceSeed::from_u128(1))
            .scripted(vec![PieceKind::Green, PieceKind::Purple]);
        factory.enqueue(None);
        factory.clear();
        assert!(factory.is_empty());
        assert_eq!(factory.dequeue_active().kind(), PieceKind::Green);
    }

    #[test]
    fn test_scripted_and_forced_start_unrotated() {
        let mut factory =
            PieceFactory::with_seed(PieceSeed::from_u128(9)).scripted(vec![PieceKind::Cyan]);
        for _ in 0..10 {
            assert_eq!(factory.dequeue_active().rotation().index(), 0);
        }
    }

    #[test]
    fn test_random_pieces_are_movable_with_varied_rotation() {
        let mut factory = PieceFactory::with_seed(PieceSeed::from_u128(42));
        let mut rotations = [false; 4];
        for _ in 0..200 {
            let piece = factory.dequeue_active();
            assert!(!piece.is_barrier());
            assert!(piece.is_falling());
            rotations[piece.rotation().index()] = true;
        }
        assert!(rotations.iter().all(|r| *r));
    }

    #[test]
    fn test_ids_are_unique() {
        let mut factory = PieceFactory::with_seed(PieceSeed::from_u128(3));
        let barrier = factory.make_barrier(PieceKind::SideBarrier, CellKey::new(-1, 0));
        let a = factory.dequeue_active();
        let b = factory.dequeue_active();
        assert_ne!(barrier.id(), a.id());
        assert_ne!(a.id(), b.id());
        assert_eq!(barrier.origin(), CellKey::new(-1, 0));
    }

    #[test]
    fn test_deterministic_generation() {
        let seed = PieceSeed::from_bytes([
            0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66,
            0x77, 0x88,
        ]);
        let mut a = PieceFactory::with_seed(seed);
        let mut b = PieceFactory::with_seed(seed);
        for _ in 0..20 {
            let (pa, pb) = (a.dequeue_active(), b.dequeue_active());
            assert_eq!(pa.kind(), pb.kind());
            assert_eq!(pa.rotation(), pb.rotation());
            assert_eq!(pa.blocks(), pb.blocks());
        }
    }

    mod piece_seed_serialization {
        use super::*;

        #[test]
        fn test_known_value_sequential_bytes() {
            let seed = PieceSeed::from_bytes([
                0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF, 0xFE, 0xDC, 0xBA, 0x98, 0x76, 0x54,
                0x32, 0x10,
            ]);
            let serialized = serde_json::to_string(&seed).unwrap();
            assert_eq!(serialized, "\"0123456789abcdeffedcba9876543210\"");
            let deserialized: PieceSeed = serde_json::from_str(&serialized).unwrap();
            assert_eq!(deserialized, seed);
        }

        #[test]
        fn test_deserialize_uppercase_hex() {
            let json = "\"0123456789ABCDEFFEDCBA9876543210\"";
            let deserialized: PieceSeed = serde_json::from_str(json).unwrap();
            assert_eq!(
                deserialized,
                PieceSeed::from_u128(0x0123_4567_89AB_CDEF_FEDC_BA98_7654_3210)
            );
        }

        #[test]
        fn test_error_invalid_hex_characters() {
            let json = "\"ghijklmnopqrstuvwxyzghijklmnopqr\"";
            let err = serde_json::from_str::<PieceSeed>(json).unwrap_err();
            assert!(err.to_string().contains("invalid hex"));
        }

        #[test]
        fn test_error_wrong_length() {
            for json in ["\"\"", "\"0123456789abcdef0123456789abcde\""] {
                let err = serde_json::from_str::<PieceSeed>(json).unwrap_err();
                assert!(err.to_string().contains("invalid hex"));
            }
        }

        #[test]
        fn test_from_str() {
            let seed: PieceSeed = "000000000000000000000000000000ff".parse().unwrap();
            assert_eq!(seed, PieceSeed::from_u128(255));
            assert!("xyz".parse::<PieceSeed>().is_err());
        }
    }
}
