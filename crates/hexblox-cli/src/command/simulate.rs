//! Headless play: random commands on the virtual clock, summarised as JSON.

use std::time::Duration;

use anyhow::Context as _;
use hexblox_engine::{Board, Direction, GameConfig, GameEvent, PieceSeed};
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::command::GameArg;

/// Decorrelates the command stream from the piece stream sharing the same seed.
const COMMAND_STREAM: u128 = 0x9e37_79b9_7f4a_7c15_f39c_c060_5ced_c834;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SimulateArg {
    #[clap(flatten)]
    pub(super) game: GameArg,
    /// Virtual seconds to simulate
    #[clap(long, default_value_t = 600)]
    seconds: u64,
    /// Virtual milliseconds between commands
    #[clap(long, default_value_t = 100, value_parser = clap::value_parser!(u64).range(1..))]
    step_ms: u64,
    /// Stop at the first game over instead of starting a new game
    #[clap(long)]
    stop_on_game_over: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Move(Direction),
    Rotate,
    Wait,
}

impl Command {
    fn random(rng: &mut Pcg32) -> Self {
        match rng.random_range(0..10) {
            0..=2 => Self::Move(Direction::Left),
            3..=5 => Self::Move(Direction::Right),
            6 | 7 => Self::Rotate,
            8 => Self::Move(Direction::Down),
            _ => Self::Wait,
        }
    }
}

#[derive(Debug, Default, Serialize)]
struct FinalGame {
    score: u64,
    lines: u32,
    level: u32,
    completed_pieces: u32,
    perfect_clears: u32,
    game_over: bool,
}

#[derive(Debug, Serialize)]
struct Summary {
    seed: PieceSeed,
    virtual_seconds: u64,
    commands: u64,
    games_finished: usize,
    finished_scores: Vec<u64>,
    best_score: u64,
    lines_cleared: u64,
    perfect_clears: u64,
    pieces_spawned: u64,
    last_game: FinalGame,
}

pub(crate) fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    arg.game.init_logging()?;
    let config = arg.game.load_config()?;
    let summary = simulate(config, arg)?;
    let json = serde_json::to_string_pretty(&summary).context("failed to encode summary")?;
    println!("{json}");
    Ok(())
}

fn simulate(mut config: GameConfig, arg: &SimulateArg) -> anyhow::Result<Summary> {
    let seed = *config.seed.get_or_insert_with(|| rand::rng().random());
    let mut rng = Pcg32::from_seed((seed.to_u128() ^ COMMAND_STREAM).to_le_bytes());
    let mut board = Board::new(config).context("failed to create board")?;
    log::info!("simulating {}s with seed {seed:?}", arg.seconds);

    let step = Duration::from_millis(arg.step_ms);
    let commands = arg.seconds.saturating_mul(1000) / arg.step_ms;
    let mut summary = Summary {
        seed,
        virtual_seconds: arg.seconds,
        commands: 0,
        games_finished: 0,
        finished_scores: vec![],
        best_score: 0,
        lines_cleared: 0,
        perfect_clears: 0,
        pieces_spawned: 0,
        last_game: FinalGame::default(),
    };

    for _ in 0..commands {
        match Command::random(&mut rng) {
            Command::Move(direction) => board.move_player_piece(direction),
            Command::Rotate => board.rotate_player_piece(),
            Command::Wait => {}
        }
        board.tick(step);
        summary.commands += 1;

        for event in board.drain_events() {
            match event {
                GameEvent::LineCleared { .. } => summary.lines_cleared += 1,
                GameEvent::PerfectClear { .. } => summary.perfect_clears += 1,
                GameEvent::PieceSpawned { .. } => summary.pieces_spawned += 1,
                GameEvent::GameOver { score } => {
                    summary.games_finished += 1;
                    summary.finished_scores.push(score);
                    summary.best_score = summary.best_score.max(score);
                }
                GameEvent::ScoreChanged { .. } | GameEvent::NewBestScore { .. } => {}
            }
        }

        if board.is_game_over() {
            if arg.stop_on_game_over {
                break;
            }
            board.reset();
        }
    }

    summary.best_score = summary.best_score.max(board.score());
    summary.last_game = FinalGame {
        score: board.score(),
        lines: board.lines(),
        level: board.level(),
        completed_pieces: board.stats().completed_pieces(),
        perfect_clears: board.stats().perfect_clears(),
        game_over: board.is_game_over(),
    };
    Ok(summary)
}
