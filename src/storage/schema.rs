//! Database schema definitions
//!
//! This module contains the SQL schema for the SQLite page store.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per admitted page, keyed by canonical address
CREATE TABLE IF NOT EXISTS pages (
    address TEXT PRIMARY KEY NOT NULL,
    referrer TEXT NOT NULL,
    crawled_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pages_referrer ON pages(referrer);

-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);
"#;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [SCHEMA_VERSION],
    )?;

    Ok(())
}

/// Returns the highest schema version recorded in the database
pub fn get_schema_version(conn: &rusqlite::Connection) -> rusqlite::Result<Option<i32>> {
    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
        row.get(0)
    })
}
