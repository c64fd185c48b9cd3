//! Minimal terminal runtime: an event loop feeding an [`App`].

mod app;
mod event;
mod event_loop;
mod runtime;

pub use self::{app::App, event_loop::RenderMode, runtime::Runtime};
