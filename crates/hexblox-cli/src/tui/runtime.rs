use std::{io, time::Duration};

use crossterm::{
    event::{DisableFocusChange, EnableFocusChange},
    execute,
};
use ratatui::DefaultTerminal;

use crate::tui::{
    App,
    event::TuiEvent,
    event_loop::{EventLoop, RenderMode},
};

/// TUI application runtime.
///
/// Owns the event loop and drives an [`App`] until it asks to exit.
#[derive(Debug)]
pub struct Runtime {
    events: EventLoop,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self {
            events: EventLoop::new(),
        }
    }

    /// Sets the tick rate (Hz, ticks per second).
    pub fn set_tick_rate(&mut self, rate: f64) {
        self.events
            .set_tick_interval(Some(Duration::from_secs_f64(1.0 / rate)));
    }

    pub fn set_render_mode(&mut self, mode: RenderMode) {
        self.events.set_render_mode(mode);
    }

    /// Runs the application.
    ///
    /// 1. Calls `app.init()`
    /// 2. Enables focus reporting so the app sees `FocusLost` / `FocusGained`
    /// 3. Runs the event loop until `app.should_exit()` returns true
    ///    - `Tick`: calls `app.update()` with the elapsed time
    ///    - `Render`: calls `app.draw()`
    ///    - `Crossterm`: calls `app.handle_event()`
    pub fn run<A>(mut self, app: &mut A) -> anyhow::Result<()>
    where
        A: App,
    {
        app.init(&mut self);

        ratatui::run(|terminal| {
            execute!(io::stdout(), EnableFocusChange)?;
            let result = self.event_loop(terminal, app);
            execute!(io::stdout(), DisableFocusChange)?;
            result
        })
    }

    fn event_loop<A>(&mut self, terminal: &mut DefaultTerminal, app: &mut A) -> anyhow::Result<()>
    where
        A: App,
    {
        self.events.restart_tick_clock();
        while !app.should_exit() {
            match self.events.next()? {
                TuiEvent::Tick(elapsed) => app.update(self, elapsed),
                TuiEvent::Render => {
                    terminal.draw(|f| app.draw(f))?;
                }
                TuiEvent::Crossterm(event) => app.handle_event(self, event),
            }
        }
        Ok(())
    }
}
