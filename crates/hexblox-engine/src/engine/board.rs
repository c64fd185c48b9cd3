use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    time::Duration,
};

use rand::Rng as _;
use serde::{Deserialize, Serialize};

use crate::{
    ConfigError,
    core::{
        BOARD_WIDTH, Block, BlockRef, CellKey, Direction, HEIGHT_I32, Matrix, MoveOutcome,
        PlacedBlock, Piece, PieceKind, WIDTH_I32, occupied_keys, query_block_at,
    },
};

use super::{
    best_score::{BestScore, BestScoreStore, MemoryBestScoreStore},
    config::GameConfig,
    destruction::{CompletedRow, DestructionSequencer, FullRow, TimerTask},
    events::GameEvent,
    game_stats::GameStats,
    piece_factory::PieceFactory,
    timers::{TimerHandle, Timers},
};

/// Notifications kept for [`Board::drain_events`] before the oldest are dropped.
pub const MAX_PENDING_EVENTS: usize = 256;

/// Whether auto-fall and player commands are live.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::IsVariant,
)]
pub enum GameMode {
    #[default]
    Standard,
    Paused,
}

/// The game state machine.
///
/// Owns every piece (the three barriers, settled pieces and the falling piece), the piece
/// factory, the virtual clock and the score. The host drives it with player commands and
/// [`Self::tick`], and polls [`Self::drain_events`] for notifications.
///
/// Each frame runs, in order: the merge pass, line detection, the falling-piece check
/// (spawning a new piece when none is falling) and garbage collection of fully hidden pieces.
#[derive(Debug)]
pub struct Board {
    config: GameConfig,
    pieces: Vec<Piece>,
    factory: PieceFactory,
    timers: Timers<TimerTask>,
    sequencer: DestructionSequencer,
    stats: GameStats,
    destroying: usize,
    game_over: bool,
    mode: GameMode,
    suspended: bool,
    auto_fall: Option<TimerHandle>,
    merge_gate: Option<(usize, u64)>,
    settled_revision: u64,
    events: VecDeque<GameEvent>,
    best_store: Box<dyn BestScoreStore>,
    best: Option<BestScore>,
}

impl Board {
    /// Creates a board that keeps its best score in memory.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        Self::with_store(config, Box::new(MemoryBestScoreStore::new()))
    }

    /// Creates a board, reads the best score from `best_store` and spawns the first piece.
    pub fn with_store(
        config: GameConfig,
        best_store: Box<dyn BestScoreStore>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        let mut factory = PieceFactory::with_seed(seed);
        if config.test_mode {
            factory = factory.scripted(config.test_sequence.clone());
        }
        let best = best_store.load().unwrap_or_else(|e| {
            log::warn!("failed to load best score: {e}");
            None
        });
        let sequencer = DestructionSequencer::new(config.flash_interval(), config.flash_cycles);
        let mut board = Self {
            config,
            pieces: Vec::new(),
            factory,
            timers: Timers::new(),
            sequencer,
            stats: GameStats::new(),
            destroying: 0,
            game_over: false,
            mode: GameMode::Standard,
            suspended: false,
            auto_fall: None,
            merge_gate: None,
            settled_revision: 0,
            events: VecDeque::new(),
            best_store,
            best,
        };
        board.reset();
        Ok(board)
    }

    /// Starts a new game: clears every piece and pending timer, recreates the barriers and
    /// spawns a fresh piece. Mode and suspension are kept.
    pub fn reset(&mut self) {
        self.sequencer.cancel_all(&mut self.timers);
        self.cancel_auto_fall();
        self.stats = GameStats::new();
        self.destroying = 0;
        self.game_over = false;
        self.merge_gate = None;
        self.pieces.clear();
        self.factory.clear();

        let barriers = [
            (PieceKind::BottomBarrier, CellKey::new(0, HEIGHT_I32)),
            (PieceKind::SideBarrier, CellKey::new(-1, 0)),
            (PieceKind::SideBarrier, CellKey::new(WIDTH_I32, 0)),
        ];
        for (kind, origin) in barriers {
            let barrier = self.factory.make_barrier(kind, origin);
            self.pieces.push(barrier);
        }
        self.factory.enqueue(None);

        log::info!("board reset");
        self.push_score_changed();
        self.spawn_piece();
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Every piece on the board, barriers included.
    #[must_use]
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    #[must_use]
    pub fn falling_piece(&self) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.is_falling())
    }

    /// Next piece to spawn.
    #[must_use]
    pub fn next_piece(&self) -> Option<&Piece> {
        self.factory.peek_next()
    }

    #[must_use]
    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    #[must_use]
    pub fn score(&self) -> u64 {
        self.stats.score()
    }

    #[must_use]
    pub fn lines(&self) -> u32 {
        self.stats.lines()
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.stats.level()
    }

    #[must_use]
    pub fn best_score(&self) -> Option<BestScore> {
        self.best
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Rows currently mid-destruction.
    #[must_use]
    pub fn destroying(&self) -> usize {
        self.destroying
    }

    /// `y` of every row currently mid-destruction.
    pub fn clearing_rows(&self) -> impl Iterator<Item = i32> + '_ {
        self.sequencer.rows()
    }

    #[must_use]
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: GameMode) {
        self.mode = mode;
    }

    pub fn toggle_pause(&mut self) {
        self.mode = match self.mode {
            GameMode::Standard => GameMode::Paused,
            GameMode::Paused => GameMode::Standard,
        };
    }

    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Stops the render loop: frames do nothing and auto-fall steps are skipped.
    pub fn suspend(&mut self) {
        if !self.suspended {
            log::debug!("board suspended");
            self.suspended = true;
        }
    }

    /// Restarts the render loop. The auto-fall timer keeps its single pending trigger.
    pub fn resume(&mut self) {
        if self.suspended {
            log::debug!("board resumed");
            self.suspended = false;
        }
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    /// Takes every pending notification, oldest first.
    ///
    /// At most [`MAX_PENDING_EVENTS`] are kept; a host that never drains loses the oldest.
    pub fn drain_events(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.events.drain(..)
    }

    /// Settled cells, barriers included. This is the collision matrix of the falling piece.
    #[must_use]
    pub fn occupancy_matrix(&self) -> Matrix {
        occupied_keys(self.pieces.iter().filter(|p| !p.is_falling()))
    }

    /// Row of every visible settled block, sorted.
    #[must_use]
    pub fn y_matrix(&self) -> Vec<i32> {
        let mut ys: Vec<_> = self
            .static_pieces()
            .flat_map(Piece::cells)
            .map(|cell| cell.y)
            .filter(|y| (0..HEIGHT_I32).contains(y))
            .collect();
        ys.sort_unstable();
        ys
    }

    /// Visible settled blocks, barriers excluded.
    #[must_use]
    pub fn static_blocks(&self) -> Vec<PlacedBlock> {
        self.static_pieces()
            .flat_map(Piece::visible_blocks)
            .map(|(cell, block)| PlacedBlock {
                cell,
                block: *block,
            })
            .collect()
    }

    /// Visible block at `(x, y)`, falling piece and barriers included.
    #[must_use]
    pub fn query(&self, x: i32, y: i32) -> Option<&Block> {
        query_block_at(x, y, &self.pieces)
    }

    /// Moves the falling piece one step. Illegal moves are silently ignored.
    ///
    /// `Direction::Up` is not a player command and is ignored.
    pub fn move_player_piece(&mut self, direction: Direction) {
        if direction.is_up() || !self.accepts_input() {
            return;
        }
        self.move_falling(direction);
    }

    /// Rotates the falling piece to its next state. Blocked rotations are silently ignored.
    pub fn rotate_player_piece(&mut self) {
        if !self.accepts_input() {
            return;
        }
        let Some(index) = self.pieces.iter().position(Piece::is_falling) else {
            return;
        };
        let matrix = self.matrix_without(index);
        self.pieces[index].try_rotate(&matrix);
    }

    /// Advances the clock by `dt` and fires every due timer, then runs one frame.
    pub fn tick(&mut self, dt: Duration) {
        self.advance(dt);
        self.frame();
    }

    /// Advances the clock by `dt`, firing auto-fall and row animation timers in due order.
    pub fn advance(&mut self, dt: Duration) {
        let until = self.timers.now() + dt;
        while let Some(task) = self.timers.pop_due(until) {
            match task {
                TimerTask::AutoFall => self.on_auto_fall(),
                TimerTask::Flash(id) => {
                    self.sequencer
                        .on_flash(id, &mut self.pieces, &mut self.timers);
                }
                TimerTask::Hide(id) => {
                    if let Some(row) = self.sequencer.on_hide(id, &mut self.pieces, &mut self.timers)
                    {
                        self.complete_row(row);
                    }
                }
            }
        }
        self.timers.advance_to(until);
    }

    /// Runs the per-frame checks. Does nothing while suspended.
    pub fn frame(&mut self) {
        if self.suspended {
            return;
        }
        self.check_for_merges();
        self.check_for_lines();
        self.check_for_falling_piece();
        self.check_for_old_pieces();
    }

    /// Merges vertically stacked same-colour settled blocks into the lowest block of each run.
    ///
    /// Skipped while rows are mid-destruction, and when neither the piece count nor the
    /// settled layout changed since the last pass. Returns `true` if the pass ran.
    pub fn check_for_merges(&mut self) -> bool {
        if self.destroying > 0 {
            return false;
        }
        let key = (self.pieces.len(), self.settled_revision);
        if self.merge_gate == Some(key) {
            return false;
        }
        self.merge_gate = Some(key);
        self.merge_pass();
        true
    }

    fn merge_pass(&mut self) {
        let mut grid = HashMap::new();
        for (pi, piece) in self.pieces.iter().enumerate() {
            if piece.is_falling() || piece.is_barrier() {
                continue;
            }
            for (bi, block) in piece.blocks().iter().enumerate() {
                if block.is_visible() {
                    grid.insert(block.cell(piece.origin()), (pi, bi));
                }
            }
        }

        for y in (0..HEIGHT_I32).rev() {
            for x in 0..WIDTH_I32 {
                let Some(&(pi, bi)) = grid.get(&CellKey::new(x, y)) else {
                    continue;
                };
                let color = self.pieces[pi].blocks()[bi].color();
                let mut gained = 0;
                let mut above = y - 1;
                while let Some(&(pj, bj)) = grid.get(&CellKey::new(x, above)) {
                    let block = &mut self.pieces[pj].blocks_mut()[bj];
                    if block.color() != color {
                        break;
                    }
                    gained += block.value();
                    block.set_value(0);
                    above -= 1;
                }
                if gained > 0 {
                    let bottom = &mut self.pieces[pi].blocks_mut()[bi];
                    bottom.set_value(bottom.value() + gained);
                    log::debug!("merged {gained} into {}", CellKey::new(x, y));
                }
            }
        }
    }

    /// Detects full rows and hands them to the destruction sequencer.
    ///
    /// Skipped while a previous batch is still animating. Returns the number of rows found.
    pub fn check_for_lines(&mut self) -> usize {
        if self.destroying > 0 {
            return 0;
        }
        let mut rows = BTreeMap::new();
        for piece in self.static_pieces() {
            for (index, block) in piece.blocks().iter().enumerate() {
                let cell = block.cell(piece.origin());
                if !block.is_visible() || !(0..HEIGHT_I32).contains(&cell.y) {
                    continue;
                }
                let row = rows.entry(cell.y).or_insert_with(|| FullRow {
                    y: cell.y,
                    blocks: Vec::with_capacity(BOARD_WIDTH),
                    raw_score: 0,
                });
                row.blocks.push(BlockRef {
                    piece: piece.id(),
                    index,
                });
                row.raw_score += u64::from(block.value());
            }
        }
        let full: Vec<_> = rows
            .into_values()
            .filter(|row| row.blocks.len() == BOARD_WIDTH)
            .collect();
        if full.is_empty() {
            return 0;
        }
        let count = full.len();
        log::debug!(
            "full rows detected: {:?}",
            full.iter().map(|r| r.y).collect::<Vec<_>>()
        );
        self.destroying = count;
        self.sequencer.start(full, &mut self.pieces, &mut self.timers);
        count
    }

    /// Spawns the next piece when nothing is falling, no row is clearing and the game is on.
    pub fn check_for_falling_piece(&mut self) {
        if self.game_over || self.destroying > 0 || self.pieces.iter().any(Piece::is_falling) {
            return;
        }
        self.spawn_piece();
    }

    /// Drops settled pieces whose blocks are all hidden. Returns how many were removed.
    pub fn check_for_old_pieces(&mut self) -> usize {
        let before = self.pieces.len();
        self.pieces
            .retain(|p| p.is_falling() || p.is_barrier() || !p.is_fully_hidden());
        before - self.pieces.len()
    }

    /// Doubles the score when no settled block is left. Returns `true` if the bonus applied.
    ///
    /// A zero score is left alone.
    pub fn check_for_empty_board(&mut self) -> bool {
        let empty = self.static_pieces().all(|p| p.cells().next().is_none());
        if !empty || self.stats.score() == 0 {
            return false;
        }
        self.stats.double_score();
        let score = self.stats.score();
        log::info!("perfect clear, score doubled to {score}");
        self.push_event(GameEvent::PerfectClear { score });
        self.push_score_changed();
        true
    }

    fn spawn_piece(&mut self) {
        let mut piece = self.factory.dequeue_active();
        self.factory.enqueue(None);
        piece.center();

        let matrix = self.occupancy_matrix();
        if piece.cells().any(|cell| matrix.contains(&cell)) {
            log::debug!("{} {:?} has no room to spawn", piece.id(), piece.kind());
            self.declare_game_over();
            return;
        }

        log::debug!("spawned {} {:?} at {}", piece.id(), piece.kind(), piece.origin());
        self.push_event(GameEvent::PieceSpawned {
            id: piece.id(),
            kind: piece.kind(),
        });
        self.pieces.push(piece);
        self.check_for_empty_board();
        self.restart_auto_fall();
    }

    fn static_pieces(&self) -> impl Iterator<Item = &Piece> + '_ {
        self.pieces
            .iter()
            .filter(|p| !p.is_falling() && !p.is_barrier())
    }

    fn matrix_without(&self, index: usize) -> Matrix {
        occupied_keys(
            self.pieces
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != index)
                .map(|(_, p)| p),
        )
    }

    fn accepts_input(&self) -> bool {
        !self.game_over && !self.suspended && self.mode.is_standard()
    }

    fn move_falling(&mut self, direction: Direction) {
        let falling: Vec<_> = (0..self.pieces.len())
            .filter(|i| self.pieces[*i].is_falling())
            .collect();
        for index in falling {
            let matrix = self.matrix_without(index);
            if let MoveOutcome::Settled { at_top } = self.pieces[index].try_move(direction, &matrix)
            {
                self.on_settled(index, at_top);
            }
        }
    }

    fn on_settled(&mut self, index: usize, at_top: bool) {
        let piece = &self.pieces[index];
        log::debug!("{} {:?} settled at {}", piece.id(), piece.kind(), piece.origin());
        self.settled_revision += 1;
        self.stats.complete_piece_drop();
        if at_top {
            self.declare_game_over();
        }
    }

    fn on_auto_fall(&mut self) {
        self.auto_fall = None;
        if self.game_over {
            return;
        }
        if !self.suspended && self.mode.is_standard() {
            self.move_falling(Direction::Down);
        }
        if !self.game_over {
            self.schedule_auto_fall();
        }
    }

    fn restart_auto_fall(&mut self) {
        self.cancel_auto_fall();
        self.schedule_auto_fall();
    }

    fn schedule_auto_fall(&mut self) {
        debug_assert!(self.auto_fall.is_none());
        let delay = self.config.fall_delay.at_level(self.stats.level());
        self.auto_fall = Some(self.timers.schedule(delay, TimerTask::AutoFall));
    }

    fn cancel_auto_fall(&mut self) {
        if let Some(handle) = self.auto_fall.take() {
            self.timers.cancel(handle);
        }
    }

    fn complete_row(&mut self, row: CompletedRow) {
        for piece in self
            .pieces
            .iter_mut()
            .filter(|p| !p.is_falling() && !p.is_barrier())
        {
            let origin = piece.origin();
            for block in piece.blocks_mut() {
                if block.is_visible() && block.cell(origin).y < row.y {
                    block.shift_down();
                }
            }
        }
        debug_assert!(self.destroying > 0);
        self.destroying = self.destroying.saturating_sub(1);
        self.settled_revision += 1;

        let level_before = self.stats.level();
        let award = self.stats.complete_line(row.raw_score, row.batch);
        log::info!(
            "row {} cleared: {} x {} x {} = {award}",
            row.y,
            row.raw_score,
            row.batch,
            self.stats.level()
        );
        if self.stats.level() > level_before {
            log::info!("level up to {}", self.stats.level());
        }
        self.push_event(GameEvent::LineCleared { row: row.y, award });
        self.push_score_changed();
    }

    fn declare_game_over(&mut self) {
        if self.game_over {
            return;
        }
        self.game_over = true;
        self.cancel_auto_fall();
        let score = self.stats.score();
        log::info!("game over with score {score}");
        self.push_event(GameEvent::GameOver { score });
        self.record_best();
    }

    fn record_best(&mut self) {
        let score = self.stats.score();
        if score <= self.best.map_or(0, |b| b.score) {
            return;
        }
        let best = BestScore::now(score);
        if let Err(e) = self.best_store.save(&best) {
            log::warn!("failed to save best score: {e}");
        }
        self.best = Some(best);
        self.push_event(GameEvent::NewBestScore { score });
    }

    fn push_event(&mut self, event: GameEvent) {
        if self.events.len() >= MAX_PENDING_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    fn push_score_changed(&mut self) {
        self.push_event(GameEvent::ScoreChanged {
            score: self.stats.score(),
            lines: self.stats.lines(),
            level: self.stats.level(),
        });
    }
}
