use std::time::Duration;

use crossterm::event::{Event, KeyCode};
use hexblox_engine::{Board, Direction, GameEvent};
use ratatui::Frame;

use crate::{
    tui::{App, RenderMode, Runtime},
    ui::widgets::GameDisplay,
};

const FPS: f64 = 60.0;
/// Longest stretch of wall-clock time fed to the board in one tick.
const MAX_STEP: Duration = Duration::from_millis(250);
const MESSAGE_TTL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayerCommand {
    Move(Direction),
    Rotate,
    TogglePause,
    NewGame,
    Quit,
}

impl PlayerCommand {
    fn from_key(code: KeyCode) -> Option<Self> {
        let command = match code {
            KeyCode::Left => Self::Move(Direction::Left),
            KeyCode::Right => Self::Move(Direction::Right),
            KeyCode::Down => Self::Move(Direction::Down),
            KeyCode::Up | KeyCode::Char(' ') => Self::Rotate,
            KeyCode::Char('p') => Self::TogglePause,
            KeyCode::Enter | KeyCode::Char('r') => Self::NewGame,
            KeyCode::Char('q') => Self::Quit,
            _ => return None,
        };
        Some(command)
    }
}

#[derive(Debug)]
pub struct PlayApp {
    board: Board,
    message: Option<(String, Duration)>,
    is_exiting: bool,
}

impl PlayApp {
    pub fn new(board: Board) -> Self {
        Self {
            board,
            message: None,
            is_exiting: false,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    fn apply(&mut self, command: PlayerCommand) {
        let is_over = self.board.is_game_over();
        match command {
            PlayerCommand::Move(direction) => self.board.move_player_piece(direction),
            PlayerCommand::Rotate => self.board.rotate_player_piece(),
            PlayerCommand::TogglePause if !is_over => self.board.toggle_pause(),
            PlayerCommand::NewGame if is_over => {
                self.board.reset();
                self.message = None;
            }
            PlayerCommand::Quit => self.is_exiting = true,
            PlayerCommand::TogglePause | PlayerCommand::NewGame => {}
        }
    }

    fn show(&mut self, message: String) {
        self.message = Some((message, MESSAGE_TTL));
    }

    fn collect_events(&mut self) {
        let events: Vec<_> = self.board.drain_events().collect();
        for event in events {
            match event {
                GameEvent::LineCleared { row, award } => self.show(format!("+{award} (row {row})")),
                GameEvent::PerfectClear { score } => self.show(format!("PERFECT CLEAR! {score}")),
                GameEvent::NewBestScore { score } => self.show(format!("NEW BEST {score}!")),
                GameEvent::GameOver { score } => {
                    if self.message.is_none() {
                        self.show(format!("final score {score}"));
                    }
                }
                GameEvent::ScoreChanged { .. } | GameEvent::PieceSpawned { .. } => {}
            }
        }
    }

    fn expire_message(&mut self, elapsed: Duration) {
        if let Some((_, ttl)) = &mut self.message {
            *ttl = ttl.saturating_sub(elapsed);
            if ttl.is_zero() && !self.board.is_game_over() {
                self.message = None;
            }
        }
    }
}

impl App for PlayApp {
    fn init(&mut self, runtime: &mut Runtime) {
        runtime.set_render_mode(RenderMode::throttled_from_rate(FPS));
        runtime.set_tick_rate(FPS);
    }

    fn should_exit(&self) -> bool {
        self.is_exiting
    }

    fn handle_event(&mut self, _runtime: &mut Runtime, event: Event) {
        match event {
            Event::FocusLost => self.board.suspend(),
            Event::FocusGained => self.board.resume(),
            _ => {
                if let Some(command) = event
                    .as_key_press_event()
                    .and_then(|key| PlayerCommand::from_key(key.code))
                {
                    self.apply(command);
                }
            }
        }
    }

    fn draw(&self, frame: &mut Frame) {
        let message = self.message.as_ref().map(|(text, _)| text.as_str());
        frame.render_widget(GameDisplay::new(&self.board).message(message), frame.area());
    }

    fn update(&mut self, _runtime: &mut Runtime, elapsed: Duration) {
        self.board.tick(elapsed.min(MAX_STEP));
        self.collect_events();
        self.expire_message(elapsed);
    }
}

#[cfg(test)]
mod tests {
    use hexblox_engine::{GameConfig, GameMode, PieceKind, PieceSeed};

    use super::*;

    fn app(kinds: &[PieceKind]) -> PlayApp {
        let config = GameConfig {
            test_mode: true,
            test_sequence: kinds.to_vec(),
            seed: Some(PieceSeed::from_u128(3)),
            ..GameConfig::default()
        };
        PlayApp::new(Board::new(config).unwrap())
    }

    fn press(app: &mut PlayApp, code: KeyCode) {
        let mut runtime = Runtime::new();
        app.handle_event(&mut runtime, Event::Key(code.into()));
    }

    #[test]
    fn keys_map_to_commands() {
        assert_eq!(
            PlayerCommand::from_key(KeyCode::Left),
            Some(PlayerCommand::Move(Direction::Left))
        );
        assert_eq!(
            PlayerCommand::from_key(KeyCode::Down),
            Some(PlayerCommand::Move(Direction::Down))
        );
        assert_eq!(PlayerCommand::from_key(KeyCode::Up), Some(PlayerCommand::Rotate));
        assert_eq!(
            PlayerCommand::from_key(KeyCode::Char(' ')),
            Some(PlayerCommand::Rotate)
        );
        assert_eq!(
            PlayerCommand::from_key(KeyCode::Char('r')),
            Some(PlayerCommand::NewGame)
        );
        assert_eq!(PlayerCommand::from_key(KeyCode::Char('x')), None);
    }

    #[test]
    fn arrow_keys_move_the_falling_piece() {
        let mut app = app(&[PieceKind::Yellow]);
        let start = app.board().falling_piece().unwrap().origin();
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Down);
        let moved = app.board().falling_piece().unwrap().origin();
        assert_eq!((moved.x, moved.y), (start.x - 1, start.y + 1));
    }

    #[test]
    fn pause_toggles_and_quit_exits() {
        let mut app = app(&[PieceKind::Yellow]);
        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.board().mode(), GameMode::Paused);
        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.board().mode(), GameMode::Standard);
        assert!(!app.should_exit());
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_exit());
    }

    #[test]
    fn focus_changes_suspend_and_resume() {
        let mut app = app(&[PieceKind::Yellow]);
        let mut runtime = Runtime::new();
        app.handle_event(&mut runtime, Event::FocusLost);
        assert!(app.board().is_suspended());
        app.handle_event(&mut runtime, Event::FocusGained);
        assert!(!app.board().is_suspended());
    }

    #[test]
    fn new_game_only_after_game_over() {
        let mut app = app(&[PieceKind::Cyan]);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.board().falling_piece().unwrap().origin().y, 1);

        let mut runtime = Runtime::new();
        for _ in 0..2000 {
            if app.board().is_game_over() {
                break;
            }
            app.update(&mut runtime, MAX_STEP);
        }
        assert!(app.board().is_game_over());
        assert!(app.message.is_some());

        press(&mut app, KeyCode::Enter);
        assert!(!app.board().is_game_over());
        assert!(app.board().falling_piece().is_some());
        assert!(app.message.is_none());
    }
}
