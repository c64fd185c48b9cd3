use serde::Serialize;

use crate::core::{PieceId, PieceKind};

/// Notification queued by the board for its host.
///
/// The board never calls out; hosts poll with [`crate::Board::drain_events`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::IsVariant)]
pub enum GameEvent {
    /// Score, lines or level changed (line clear, perfect clear or reset).
    ScoreChanged { score: u64, lines: u32, level: u32 },
    /// One row finished its clear animation.
    LineCleared { row: i32, award: u64 },
    /// A piece spawned onto an empty board; the score was doubled.
    PerfectClear { score: u64 },
    PieceSpawned { id: PieceId, kind: PieceKind },
    GameOver { score: u64 },
    /// The stored best score was beaten at game over.
    NewBestScore { score: u64 },
}
