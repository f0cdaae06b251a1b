//! Ratatui front-end for the manga recommender.
//!
//! The page is modelled as one [`App`] value that owns every piece of visible
//! state. Terminal input, request completions and timer ticks all arrive as
//! [`AppEvent`]s through a single dispatch loop in `terminal.rs`; the app
//! answers with [`Command`]s describing network work, which the loop runs on
//! worker threads and feeds back in as completion events. Rendering reads the
//! state and never mutates it.

mod app;
mod events;
mod forms;
mod helpers;
mod notifications;
mod render;
mod state;
mod terminal;
mod theme;

pub use app::{App, POPULAR_TITLES};
pub use events::{AppEvent, Command, FormInput, RequestId};
pub use terminal::run_app;
pub use theme::detect_system_theme;
