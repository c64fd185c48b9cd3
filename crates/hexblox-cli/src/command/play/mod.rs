use std::path::PathBuf;

use anyhow::Context as _;
use hexblox_engine::{Board, JsonFileBestScoreStore};

use crate::{
    command::{GameArg, play::app::PlayApp},
    tui::Runtime,
};

mod app;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PlayArg {
    #[clap(flatten)]
    game: GameArg,
    /// File holding the best score (JSON)
    #[clap(long, default_value = "./data/best.json")]
    best_file: PathBuf,
}

impl Default for PlayArg {
    fn default() -> Self {
        Self {
            game: GameArg::default(),
            best_file: PathBuf::from("./data/best.json"),
        }
    }
}

pub(crate) fn run(arg: &PlayArg) -> anyhow::Result<()> {
    let PlayArg { game, best_file } = arg;

    game.init_logging()?;
    let config = game.load_config()?;
    let store = JsonFileBestScoreStore::new(best_file);
    let board = Board::with_store(config, Box::new(store)).context("failed to create board")?;
    log::info!("starting game, best score file {}", best_file.display());

    let mut app = PlayApp::new(board);
    Runtime::new().run(&mut app)?;

    log::info!("exiting with score {}", app.board().score());
    Ok(())
}
