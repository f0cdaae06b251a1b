//! Persistence for client-side preferences.

mod connection;
mod preferences;

pub use connection::{ensure_schema, init_schema};
pub use preferences::{fetch_preference, load_theme, save_theme, store_preference, THEME_KEY};
