//! SQLite storage implementation
//!
//! This module provides a SQLite-backed implementation of the PageStore
//! trait, so the admitted pages of a run can be inspected after the process
//! exits.

use crate::state::Page;
use crate::storage::schema::{get_schema_version, initialize_schema};
use crate::storage::traits::{PageStore, StorageError, StorageResult};
use crate::url::Address;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite storage backend
///
/// The connection sits behind a mutex so that each store call runs as one
/// statement under the lock.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Creates a new SqliteStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;
        if let Some(version) = get_schema_version(&conn)? {
            tracing::debug!("Opened {} at schema version {}", path.display(), version);
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Removes every stored page, used when starting a fresh run
    pub fn clear(&self) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM pages", [])?;
        Ok(())
    }

    /// Loads every stored page
    pub fn pages(&self) -> StorageResult<Vec<Page>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT address, referrer, crawled_at FROM pages ORDER BY address")?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut pages = Vec::new();
        for row in rows {
            let (address, referrer, crawled_at) = row?;
            pages.push(page_from_row(&address, &referrer, &crawled_at)?);
        }

        Ok(pages)
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

impl PageStore for SqliteStore {
    fn lookup(&self, address: &Address) -> StorageResult<Page> {
        let conn = self.lock()?;

        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT referrer, crawled_at FROM pages WHERE address = ?1",
                params![address.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((referrer, crawled_at)) => page_from_row(address.as_str(), &referrer, &crawled_at),
            None => Err(StorageError::NotFound(address.to_string())),
        }
    }

    fn insert_if_absent(&self, page: Page) -> StorageResult<()> {
        let conn = self.lock()?;

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO pages (address, referrer, crawled_at) VALUES (?1, ?2, ?3)",
            params![
                page.address.as_str(),
                page.referrer.as_str(),
                page.crawled_at.to_rfc3339()
            ],
        )?;

        if inserted == 0 {
            return Err(StorageError::AlreadyExists(page.address.to_string()));
        }

        Ok(())
    }

    fn count(&self) -> StorageResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn page_from_row(address: &str, referrer: &str, crawled_at: &str) -> StorageResult<Page> {
    let corrupt = |reason: String| StorageError::Corrupt {
        address: address.to_string(),
        reason,
    };

    let parsed_address = Address::parse(address).map_err(|e| corrupt(e.to_string()))?;
    let parsed_referrer = Address::parse(referrer).map_err(|e| corrupt(e.to_string()))?;
    let crawled_at = DateTime::parse_from_rfc3339(crawled_at)
        .map_err(|e| corrupt(format!("bad timestamp '{}': {}", crawled_at, e)))?
        .with_timezone(&Utc);

    Ok(Page::with_timestamp(
        parsed_address,
        parsed_referrer,
        crawled_at,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn address(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    fn page(path: &str) -> Page {
        Page::with_timestamp(
            address(&format!("https://example.com{}", path)),
            address("https://example.com/"),
            Utc.with_ymd_and_hms(2021, 6, 9, 11, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_lookup_missing() {
        let store = SqliteStore::new_in_memory().unwrap();
        let result = store.lookup(&address("https://example.com/missing/"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_insert_and_lookup_roundtrip() {
        let store = SqliteStore::new_in_memory().unwrap();
        let page = page("/test/");
        store.insert_if_absent(page.clone()).unwrap();

        let found = store.lookup(&page.address).unwrap();
        assert_eq!(found, page);
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let store = SqliteStore::new_in_memory().unwrap();
        store.insert_if_absent(page("/test/")).unwrap();

        let result = store.insert_if_absent(page("/test/"));
        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_clear() {
        let store = SqliteStore::new_in_memory().unwrap();
        store.insert_if_absent(page("/a/")).unwrap();
        store.insert_if_absent(page("/b/")).unwrap();
        assert_eq!(store.count().unwrap(), 2);

        store.clear().unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("crawl.db");

        {
            let store = SqliteStore::new(&path).unwrap();
            store.insert_if_absent(page("/kept/")).unwrap();
        }

        let store = SqliteStore::new(&path).unwrap();
        let pages = store.pages().unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].address.path(), "/kept/");
    }

    #[test]
    fn test_concurrent_inserts_admit_once() {
        let store = Arc::new(SqliteStore::new_in_memory().unwrap());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.insert_if_absent(page("/shared/")).is_ok())
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(admitted, 1);
    }
}
