//! Game state machine and the services around it.
//!
//! - [`Board`] - Owns every piece and runs the per-frame checks (merge, line detection,
//!   spawn, garbage collection)
//! - [`PieceFactory`] - Random or scripted piece generation with a lookahead queue
//! - [`DestructionSequencer`] - Flash/hide animation of cleared rows
//! - [`Timers`] - Virtual-clock timer queue driving auto-fall and row animations
//! - [`GameStats`] - Score, lines and level
//! - [`GameConfig`] - Tunables, loadable from JSON
//! - [`BestScoreStore`] - Best-score persistence
//!
//! # Game Flow
//!
//! 1. Construct a [`Board`]; it places the barriers and spawns the first piece
//! 2. The host forwards player commands and advances the clock with [`Board::tick`]
//! 3. Settled pieces are merged, full rows flash and disappear, and a new piece spawns
//! 4. A piece that cannot leave row 0 ends the game; [`Board::reset`] starts over
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use hexblox_engine::{Board, Direction, GameConfig, GameEvent};
//!
//! let mut board = Board::new(GameConfig::default()).unwrap();
//! board.move_player_piece(Direction::Left);
//! board.rotate_player_piece();
//! board.tick(Duration::from_millis(16));
//!
//! for event in board.drain_events() {
//!     if let GameEvent::GameOver { score } = event {
//!         println!("game over: {score}");
//!     }
//! }
//! ```

pub use self::{
    best_score::*, board::*, config::*, destruction::*, events::*, game_stats::*,
    piece_factory::*, timers::*,
};

mod best_score;
mod board;
mod config;
mod destruction;
mod events;
mod game_stats;
mod piece_factory;
mod timers;
