//! Storage module for the crawl's dedup store
//!
//! Every visit task shares one page store and uses it to decide whether a
//! discovered address is new. This module provides:
//! - The `PageStore` trait and its error type
//! - An in-memory store living for the duration of the process
//! - A SQLite store for inspecting a crawl after the process exits

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{PageStore, StorageError, StorageResult};

use crate::config::StorageConfig;
use crate::CrawlError;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Which page store backs a crawl run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Sqlite,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::Sqlite => f.write_str("sqlite"),
        }
    }
}

/// Opens the page store selected by the configuration
///
/// # Arguments
///
/// * `config` - Storage section of the configuration
/// * `fresh` - Clear any pages left by a previous run (SQLite only)
///
/// # Returns
///
/// * `Ok(Arc<dyn PageStore>)` - Store ready to be shared by visit tasks
/// * `Err(CrawlError)` - Failed to open the database
pub fn open_store(config: &StorageConfig, fresh: bool) -> Result<Arc<dyn PageStore>, CrawlError> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StorageBackend::Sqlite => {
            let store = SqliteStore::new(&config.database_path)?;

            if fresh {
                tracing::info!(
                    "Clearing pages from {}",
                    config.database_path.display()
                );
                store.clear()?;
            } else {
                let existing = store.count()?;
                if existing > 0 {
                    tracing::warn!(
                        "{} pages already stored in {}; they will not be crawled again",
                        existing,
                        config.database_path.display()
                    );
                }
            }

            Ok(Arc::new(store))
        }
    }
}
