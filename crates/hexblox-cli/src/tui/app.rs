use std::time::Duration;

use crossterm::event::Event;
use ratatui::Frame;

use crate::tui::Runtime;

/// Trait for TUI applications.
///
/// Applications executed by `Runtime::run()` must implement this trait.
pub trait App {
    /// Called at the start of `Runtime::run()`. Use this to configure tick and render rates.
    fn init(&mut self, runtime: &mut Runtime);

    fn should_exit(&self) -> bool;

    /// Handles terminal events (key input, focus changes, resize, etc.).
    fn handle_event(&mut self, runtime: &mut Runtime, event: Event);

    fn draw(&self, frame: &mut Frame);

    /// Advances application state by the wall-clock time since the previous tick.
    fn update(&mut self, runtime: &mut Runtime, elapsed: Duration);
}
