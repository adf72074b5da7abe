//! Entry store trait definition.

use crate::error::StorageResult;

/// A named-entry byte store hosting Tabula databases.
///
/// Entry stores are **opaque**. They map flat entry names to byte content
/// and never look inside it. Tabula owns the naming scheme and the content
/// format; a store only has to keep what it was given.
///
/// # Invariants
///
/// - `read` returns exactly the bytes of the last successful `write`
/// - `write` creates the entry or replaces its whole content
/// - `delete` of a missing entry is not an error
/// - `list_names` enumerates every entry that `exists` reports
/// - Each call acquires and releases the store on its own; no call spans
///   several entries atomically
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For testing
/// - [`super::DirectoryStore`] - For persistent storage
pub trait EntryStore: Send + Sync {
    /// Returns `true` if an entry named `name` exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be inspected.
    fn exists(&self, name: &str) -> StorageResult<bool>;

    /// Reads the full content of the entry named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::NotFound`] if the entry does not exist,
    /// or an I/O error.
    fn read(&self, name: &str) -> StorageResult<Vec<u8>>;

    /// Writes `data` as the full content of the entry named `name`.
    ///
    /// After this returns successfully the content survives process
    /// termination for persistent stores.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not representable or an I/O error
    /// occurs.
    fn write(&self, name: &str, data: &[u8]) -> StorageResult<()>;

    /// Deletes the entry named `name` if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn delete(&self, name: &str) -> StorageResult<()>;

    /// Lists the names of all entries, in ascending order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be enumerated.
    fn list_names(&self) -> StorageResult<Vec<String>>;
}
