//! Manifest schema definitions
//!
//! This module contains the SQL schema for the crawl manifest.

/// SQL schema for the manifest database
pub const SCHEMA_SQL: &str = r#"
-- One row per URL admitted in the current run
CREATE TABLE IF NOT EXISTS pages (
    url TEXT PRIMARY KEY,
    state TEXT NOT NULL,
    file_name TEXT,
    status_code INTEGER,
    error_message TEXT,
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pages_state ON pages(state);
CREATE UNIQUE INDEX IF NOT EXISTS idx_pages_file_name ON pages(file_name);
"#;

/// Initializes the manifest schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
