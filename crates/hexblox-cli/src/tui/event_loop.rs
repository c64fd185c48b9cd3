use std::time::{Duration, Instant};

use crossterm::event;

use crate::tui::event::TuiEvent;

/// Rendering trigger mode.
#[derive(Debug, Clone, Copy)]
pub enum RenderMode {
    /// Render after state changes (tick or crossterm event).
    OnDirty,
    /// Render after state changes, at most once per interval.
    Throttled(Duration),
}

impl RenderMode {
    /// Creates `Throttled` mode from frame rate (FPS).
    #[must_use]
    pub fn throttled_from_rate(rate: f64) -> Self {
        Self::Throttled(Duration::from_secs_f64(1.0 / rate))
    }
}

/// Event loop state management.
///
/// Manages tick/render timing and returns the next event via `next()`.
/// Without a tick interval no tick events are generated.
#[derive(Debug)]
pub(super) struct EventLoop {
    tick_interval: Option<Duration>,
    render_mode: RenderMode,
    last_tick: Instant,
    last_render: Instant,
    dirty: bool,
}

impl EventLoop {
    pub(super) fn new() -> Self {
        let now = Instant::now();
        Self {
            tick_interval: None,
            render_mode: RenderMode::OnDirty,
            last_tick: now,
            last_render: now,
            dirty: true, // initial render
        }
    }

    pub(super) fn set_tick_interval(&mut self, interval: Option<Duration>) {
        self.tick_interval = interval;
    }

    pub(super) fn set_render_mode(&mut self, render_mode: RenderMode) {
        self.render_mode = render_mode;
    }

    /// Forgets the time spent outside the loop so the next tick does not report it.
    pub(super) fn restart_tick_clock(&mut self) {
        self.last_tick = Instant::now();
    }

    /// Returns the next event.
    ///
    /// Blocks until a tick/render time is reached or a crossterm event occurs.
    pub(super) fn next(&mut self) -> anyhow::Result<TuiEvent> {
        loop {
            let now = Instant::now();
            if let Some(tick_interval) = self.tick_interval {
                let elapsed = now.duration_since(self.last_tick);
                if elapsed >= tick_interval {
                    self.last_tick = now;
                    self.dirty = true;
                    return Ok(TuiEvent::Tick(elapsed));
                }
            }

            let do_render = match self.render_mode {
                RenderMode::OnDirty => self.dirty,
                RenderMode::Throttled(interval) => {
                    self.dirty && now.duration_since(self.last_render) >= interval
                }
            };
            if do_render {
                self.last_render = now;
                self.dirty = false;
                return Ok(TuiEvent::Render);
            }

            if let Some(timeout) = self.compute_timeout(now)
                && !event::poll(timeout)?
            {
                continue;
            }

            self.dirty = true;
            return Ok(event::read()?.into());
        }
    }

    fn compute_timeout(&self, now: Instant) -> Option<Duration> {
        let next_tick_at = self.tick_interval.map(|interval| self.last_tick + interval);
        let next_render_at = match self.render_mode {
            RenderMode::OnDirty => None,
            RenderMode::Throttled(interval) => self.dirty.then(|| self.last_render + interval),
        };
        let next_timeout_at = [next_tick_at, next_render_at].into_iter().flatten().min()?;
        Some(next_timeout_at.saturating_duration_since(now))
    }
}
