//! In-memory entry store for testing.

use crate::backend::EntryStore;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// An in-memory entry store.
///
/// This store keeps all entries in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral databases that don't need persistence
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use tabula_storage::{EntryStore, InMemoryStore};
///
/// let store = InMemoryStore::new();
/// store.write("a", b"test data").unwrap();
/// assert_eq!(store.list_names().unwrap(), vec!["a".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory store with pre-existing entries.
    ///
    /// Useful for testing how databases written elsewhere are read back.
    #[must_use]
    pub fn with_entries<I, N>(entries: I) -> Self
    where
        I: IntoIterator<Item = (N, Vec<u8>)>,
        N: Into<String>,
    {
        Self {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(name, data)| (name.into(), data))
                    .collect(),
            ),
        }
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl EntryStore for InMemoryStore {
    fn exists(&self, name: &str) -> StorageResult<bool> {
        Ok(self.entries.read().contains_key(name))
    }

    fn read(&self, name: &str) -> StorageResult<Vec<u8>> {
        self.entries
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::not_found(name))
    }

    fn write(&self, name: &str, data: &[u8]) -> StorageResult<()> {
        self.entries.write().insert(name.to_string(), data.to_vec());
        Ok(())
    }

    fn delete(&self, name: &str) -> StorageResult<()> {
        self.entries.write().remove(name);
        Ok(())
    }

    fn list_names(&self) -> StorageResult<Vec<String>> {
        Ok(self.entries.read().keys().cloned().collect())
    }
}
