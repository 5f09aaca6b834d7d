//! SQLite crawl manifest
//!
//! Records, for every URL admitted in a run, how it ended: the file it was
//! written to, or the status/error that stopped it. The table is cleared
//! when the manifest is opened, so it always describes the latest run only.

use crate::state::PageState;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::StorageResult;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use url::Url;

/// A row of the manifest
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestEntry {
    pub url: String,
    pub state: PageState,
    pub file_name: Option<String>,
    pub status_code: Option<u16>,
    pub error_message: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// SQLite-backed manifest shared by all crawl tasks
pub struct Manifest {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for Manifest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manifest").finish_non_exhaustive()
    }
}

impl Manifest {
    /// Opens (or creates) the manifest at `path` and clears previous rows
    ///
    /// # Returns
    ///
    /// * `Ok(Manifest)` - Ready for the new run
    /// * `Err(StorageError)` - Failed to open or initialize the database
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        Self::init(conn)
    }

    /// Creates an in-memory manifest (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StorageResult<Self> {
        initialize_schema(&conn)?;
        conn.execute("DELETE FROM pages", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records the outcome for `url`, replacing any earlier row for it
    pub fn record(
        &self,
        url: &Url,
        state: PageState,
        file_name: Option<&str>,
        status_code: Option<u16>,
        error_message: Option<&str>,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn().execute(
            "INSERT OR REPLACE INTO pages (url, state, file_name, status_code, error_message, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                url.as_str(),
                state.to_db_string(),
                file_name,
                status_code,
                error_message,
                now
            ],
        )?;
        Ok(())
    }

    /// Returns every row, ordered by URL
    pub fn entries(&self) -> StorageResult<Vec<ManifestEntry>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT url, state, file_name, status_code, error_message, recorded_at
             FROM pages ORDER BY url",
        )?;

        let rows = stmt.query_map([], |row| {
            let state: String = row.get(1)?;
            let recorded_at: String = row.get(5)?;
            Ok(ManifestEntry {
                url: row.get(0)?,
                state: PageState::from_db_string(&state).unwrap_or(PageState::Failed),
                file_name: row.get(2)?,
                status_code: row.get(3)?,
                error_message: row.get(4)?,
                recorded_at: DateTime::parse_from_rfc3339(&recorded_at)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// Counts rows in the given state
    pub fn count_by_state(&self, state: PageState) -> StorageResult<u64> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM pages WHERE state = ?1",
            params![state.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_record_and_read_back() {
        let manifest = Manifest::open_in_memory().unwrap();
        manifest
            .record(
                &url("https://example.test/a"),
                PageState::Persisted,
                Some("https___example_test_a.html"),
                Some(200),
                None,
            )
            .unwrap();
        manifest
            .record(
                &url("https://example.test/c"),
                PageState::Failed,
                None,
                Some(500),
                Some("HTTP 500"),
            )
            .unwrap();

        let entries = manifest.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].url, "https://example.test/a");
        assert_eq!(entries[0].state, PageState::Persisted);
        assert_eq!(
            entries[0].file_name.as_deref(),
            Some("https___example_test_a.html")
        );
        assert_eq!(entries[1].status_code, Some(500));
        assert_eq!(entries[1].error_message.as_deref(), Some("HTTP 500"));

        assert_eq!(manifest.count_by_state(PageState::Persisted).unwrap(), 1);
        assert_eq!(manifest.count_by_state(PageState::Failed).unwrap(), 1);
    }

    #[test]
    fn test_record_replaces_previous_row() {
        let manifest = Manifest::open_in_memory().unwrap();
        let page = url("https://example.test/a");
        manifest
            .record(&page, PageState::Fetching, None, None, None)
            .unwrap();
        manifest
            .record(&page, PageState::Persisted, Some("a.html"), Some(200), None)
            .unwrap();

        let entries = manifest.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].state, PageState::Persisted);
    }

    #[test]
    fn test_reopen_clears_previous_run() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.db");

        {
            let manifest = Manifest::open(&path).unwrap();
            manifest
                .record(
                    &url("https://example.test/"),
                    PageState::Persisted,
                    Some("x.html"),
                    Some(200),
                    None,
                )
                .unwrap();
        }

        let manifest = Manifest::open(&path).unwrap();
        assert!(manifest.entries().unwrap().is_empty());
    }
}
