//! Directory-based entry store for persistent storage.

use crate::backend::EntryStore;
use crate::error::{StorageError, StorageResult};
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A directory-based entry store.
///
/// Each entry is a regular file inside one directory, named exactly like the
/// entry. Data survives process restarts.
///
/// # Durability
///
/// `write()` truncates the file, writes the new content and calls
/// `File::sync_all()` before returning.
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads. An internal
/// lock serializes calls so each one owns the directory for its duration.
///
/// # Example
///
/// ```no_run
/// use tabula_storage::{DirectoryStore, EntryStore};
/// use std::path::Path;
///
/// let store = DirectoryStore::open(Path::new("app_data")).unwrap();
/// store.write("settings", b"persistent data").unwrap();
/// ```
#[derive(Debug)]
pub struct DirectoryStore {
    root: PathBuf,
    lock: Mutex<()>,
}

impl DirectoryStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or is not a
    /// directory.
    pub fn open(root: &Path) -> StorageResult<Self> {
        fs::create_dir_all(root)?;
        if !root.is_dir() {
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a directory", root.display()),
            )));
        }

        Ok(Self {
            root: root.to_path_buf(),
            lock: Mutex::new(()),
        })
    }

    /// Returns the directory holding the entries.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, name: &str) -> StorageResult<PathBuf> {
        let reason = if name.is_empty() {
            Some("name is empty")
        } else if name == "." || name == ".." {
            Some("name is a relative path component")
        } else if name.contains(['/', '\\', '\0']) {
            Some("name contains a path separator or NUL")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(StorageError::InvalidName {
                name: name.to_string(),
                reason,
            }),
            None => Ok(self.root.join(name)),
        }
    }
}

impl EntryStore for DirectoryStore {
    fn exists(&self, name: &str) -> StorageResult<bool> {
        let path = self.entry_path(name)?;
        let _guard = self.lock.lock();
        Ok(path.is_file())
    }

    fn read(&self, name: &str) -> StorageResult<Vec<u8>> {
        let path = self.entry_path(name)?;
        let _guard = self.lock.lock();
        match fs::read(&path) {
            Ok(data) => {
                debug!(entry = name, bytes = data.len(), "read entry");
                Ok(data)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::not_found(name))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, name: &str, data: &[u8]) -> StorageResult<()> {
        let path = self.entry_path(name)?;
        let _guard = self.lock.lock();
        let mut file = File::create(&path)?;
        file.write_all(data)?;
        file.sync_all()?;
        debug!(entry = name, bytes = data.len(), "wrote entry");
        Ok(())
    }

    fn delete(&self, name: &str) -> StorageResult<()> {
        let path = self.entry_path(name)?;
        let _guard = self.lock.lock();
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(entry = name, "deleted entry");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn list_names(&self) -> StorageResult<Vec<String>> {
        let _guard = self.lock.lock();
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            // Names that are not UTF-8 were not written through this store.
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}
