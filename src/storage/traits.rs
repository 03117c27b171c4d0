//! Storage traits and error types
//!
//! This module defines the trait interface for page stores and associated
//! error types.

use crate::state::Page;
use crate::url::Address;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// No page is stored for the address. Expected during admission.
    #[error("Page not found: {0}")]
    NotFound(String),

    /// A page is already stored for the address. Expected when two visit
    /// tasks discover the same link concurrently.
    #[error("Page already exists: {0}")]
    AlreadyExists(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Corrupt record for {address}: {reason}")]
    Corrupt { address: String, reason: String },
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for page store implementations
///
/// A page store is a keyed set of pages with insert-if-absent semantics. It
/// is the only state shared between visit tasks, so implementations must be
/// safe under any number of concurrent callers and each call must be atomic
/// with respect to its key. The store makes no scope or policy decisions.
pub trait PageStore: Send + Sync {
    /// Looks up the page stored for `address`
    ///
    /// # Returns
    ///
    /// * `Ok(Page)` - The stored page
    /// * `Err(StorageError::NotFound)` - Nothing stored for this address
    fn lookup(&self, address: &Address) -> StorageResult<Page>;

    /// Stores `page` unless a page for the same address already exists
    ///
    /// An existing entry is never overwritten.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The page was stored
    /// * `Err(StorageError::AlreadyExists)` - Another page holds the address
    fn insert_if_absent(&self, page: Page) -> StorageResult<()>;

    /// Number of stored pages
    fn count(&self) -> StorageResult<usize>;
}
