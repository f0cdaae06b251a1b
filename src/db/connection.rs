use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "prefs.sqlite";

/// Ensure the database file exists under `data_dir`, run lazy migrations, and
/// return a live connection.
pub fn ensure_schema(data_dir: &Path) -> Result<Connection> {
    fs::create_dir_all(data_dir).context("failed to create data directory")?;

    let db_path = data_dir.join(DB_FILE_NAME);
    let conn = Connection::open(&db_path).context("failed to open SQLite database")?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Create the tables the client needs on an already-open connection. Split out
/// so in-memory databases get the same schema.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS preferences (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create preferences table")?;

    Ok(())
}
