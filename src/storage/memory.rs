//! In-memory page store
//!
//! The reference store: a single map guarded by a read-write lock, living for
//! the lifetime of the process.

use crate::state::Page;
use crate::storage::traits::{PageStore, StorageError, StorageResult};
use crate::url::Address;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage backend
#[derive(Debug, Default)]
pub struct MemoryStore {
    pages: RwLock<HashMap<Address, Page>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every stored page
    pub fn pages(&self) -> StorageResult<Vec<Page>> {
        let pages = self.pages.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(pages.values().cloned().collect())
    }
}

impl PageStore for MemoryStore {
    fn lookup(&self, address: &Address) -> StorageResult<Page> {
        let pages = self.pages.read().map_err(|_| StorageError::LockPoisoned)?;
        pages
            .get(address)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(address.to_string()))
    }

    fn insert_if_absent(&self, page: Page) -> StorageResult<()> {
        let mut pages = self.pages.write().map_err(|_| StorageError::LockPoisoned)?;

        if pages.contains_key(&page.address) {
            return Err(StorageError::AlreadyExists(page.address.to_string()));
        }

        pages.insert(page.address.clone(), page);
        Ok(())
    }

    fn count(&self) -> StorageResult<usize> {
        let pages = self.pages.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(pages.len())
    }
}
