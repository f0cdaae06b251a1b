use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::warn;

use crate::models::ThemePreference;

/// Preference key holding the persisted color scheme.
pub const THEME_KEY: &str = "theme";

/// Read a raw preference value.
pub fn fetch_preference(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM preferences WHERE key = ?1",
        [key],
        |row| row.get(0),
    )
    .optional()
    .context("failed to read preference")
}

/// Insert or overwrite a preference value.
pub fn store_preference(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO preferences (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )
    .context("failed to store preference")?;
    Ok(())
}

/// Load the stored theme. An unrecognized stored value reads as "no
/// preference" so the system default can take over.
pub fn load_theme(conn: &Connection) -> Result<Option<ThemePreference>> {
    let Some(raw) = fetch_preference(conn, THEME_KEY)? else {
        return Ok(None);
    };
    match raw.parse::<ThemePreference>() {
        Ok(theme) => Ok(Some(theme)),
        Err(err) => {
            warn!(%err, "ignoring stored theme preference");
            Ok(None)
        }
    }
}

/// Persist the theme so the next start-up picks it.
pub fn save_theme(conn: &Connection, theme: ThemePreference) -> Result<()> {
    store_preference(conn, THEME_KEY, theme.as_str())
}
