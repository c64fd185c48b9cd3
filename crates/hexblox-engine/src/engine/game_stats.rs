use serde::Serialize;

/// Lines needed to advance one level.
pub const LINES_PER_LEVEL: u32 = 10;

/// Score, cleared lines and derived level of one game.
///
/// # Scoring
///
/// Each cleared row awards `raw × batch × level`, where `raw` is the sum of the row's block
/// values, `batch` the number of rows detected in the same pass, and `level` the level after
/// the row's line has been counted. Clearing the board completely doubles the score.
///
/// # Example
///
/// ```
/// use hexblox_engine::GameStats;
///
/// let mut stats = GameStats::new();
/// assert_eq!(stats.complete_line(12, 2), 24);
/// assert_eq!(stats.complete_line(8, 2), 16);
/// assert_eq!(stats.score(), 40);
/// assert_eq!(stats.lines(), 2);
/// assert_eq!(stats.level(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GameStats {
    score: u64,
    lines: u32,
    completed_pieces: u32,
    perfect_clears: u32,
}

impl GameStats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            score: 0,
            lines: 0,
            completed_pieces: 0,
            perfect_clears: 0,
        }
    }

    #[must_use]
    pub const fn score(&self) -> u64 {
        self.score
    }

    #[must_use]
    pub const fn lines(&self) -> u32 {
        self.lines
    }

    /// `lines / 10 + 1`
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.lines / LINES_PER_LEVEL + 1
    }

    /// Pieces that have settled so far.
    #[must_use]
    pub const fn completed_pieces(&self) -> u32 {
        self.completed_pieces
    }

    #[must_use]
    pub const fn perfect_clears(&self) -> u32 {
        self.perfect_clears
    }

    pub const fn complete_piece_drop(&mut self) {
        self.completed_pieces += 1;
    }

    /// Counts one cleared row and adds its award. Returns the award.
    pub fn complete_line(&mut self, raw_score: u64, batch: u32) -> u64 {
        self.lines += 1;
        let award = raw_score * u64::from(batch) * u64::from(self.level());
        self.score += award;
        award
    }

    /// Perfect-clear bonus.
    pub const fn double_score(&mut self) {
        self.score *= 2;
        self.perfect_clears += 1;
    }
}
