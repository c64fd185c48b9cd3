use std::time::Duration;

use crossterm::event::Event as CrosstermEvent;

/// Events processed by TUI applications.
#[derive(Debug, Clone, derive_more::IsVariant, derive_more::From)]
pub(super) enum TuiEvent {
    /// Game logic update, carrying the time since the previous tick.
    Tick(Duration),
    /// Screen render timing.
    Render,
    /// Terminal events such as key input, focus changes and resize.
    Crossterm(CrosstermEvent),
}
