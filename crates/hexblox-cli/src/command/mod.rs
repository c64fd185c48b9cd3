use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use hexblox_engine::{GameConfig, PieceSeed};
use log::LevelFilter;

use crate::{command::play::PlayArg, logging};

mod play;
mod simulate;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Play in the terminal (default)
    Play(#[clap(flatten)] play::PlayArg),
    /// Run a headless game with random commands and print a JSON summary
    Simulate(#[clap(flatten)] simulate::SimulateArg),
}

/// Options shared by every mode that builds a board.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct GameArg {
    /// Game config file (JSON); missing fields take their defaults
    #[clap(long)]
    config: Option<PathBuf>,
    /// Piece seed as 32 hex digits
    #[clap(long)]
    seed: Option<PieceSeed>,
    /// Draw pieces from the config's test sequence instead of at random
    #[clap(long)]
    test_mode: bool,
    /// Log file
    #[clap(long, default_value = "./data/hexblox.log")]
    log_file: PathBuf,
    /// Log level (off, error, warn, info, debug, trace)
    #[clap(long, default_value = "info")]
    log_level: LevelFilter,
}

impl Default for GameArg {
    fn default() -> Self {
        Self {
            config: None,
            seed: None,
            test_mode: false,
            log_file: PathBuf::from("./data/hexblox.log"),
            log_level: LevelFilter::Info,
        }
    }
}

impl GameArg {
    /// Reads the config file, if any, and applies the command-line overrides.
    pub(crate) fn load_config(&self) -> anyhow::Result<GameConfig> {
        let mut config = match &self.config {
            Some(path) => GameConfig::from_json_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => GameConfig::default(),
        };
        self.apply_overrides(&mut config);
        config.validate().context("invalid game config")?;
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut GameConfig) {
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if self.test_mode {
            config.test_mode = true;
        }
    }

    pub(crate) fn init_logging(&self) -> anyhow::Result<()> {
        logging::init(&self.log_file, self.log_level)
    }
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode.unwrap_or(Mode::Play(PlayArg::default())) {
        Mode::Play(arg) => play::run(&arg)?,
        Mode::Simulate(arg) => simulate::run(&arg)?,
    }
    Ok(())
}
