//! Test fixtures and catalog helpers.
//!
//! Provides record types, a ready-made catalog over an instrumented store,
//! and common test scenarios.

use crate::stores::RecordingStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tabula_core::{Catalog, Config, Database, Record};
use tabula_storage::{DirectoryStore, EntryStore, InMemoryStore};
use tempfile::TempDir;

/// PBKDF2 rounds used by test catalogs. Low enough to keep tests fast.
pub const TEST_KDF_ROUNDS: u32 = 1_000;

/// A profile row, stored in table `login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Child's name.
    pub name: String,
    /// Birth date, `YYYY-MM-DD`.
    pub birth_date: String,
}

impl Record for Profile {
    const SCHEMA: &'static str = "sanitabit.profile";
}

/// A feeding log row, stored in table `UserData`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feeding {
    /// Feeding times as unix seconds.
    pub times: Vec<i64>,
}

impl Record for Feeding {
    const SCHEMA: &'static str = "sanitabit.feeding";
}

/// A free-form note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Note text.
    pub text: String,
}

impl Record for Note {
    const SCHEMA: &'static str = "sanitabit.note";
}

/// Shorthand for a [`Profile`].
pub fn profile(name: &str, birth_date: &str) -> Profile {
    Profile {
        name: name.to_string(),
        birth_date: birth_date.to_string(),
    }
}

/// Shorthand for a [`Note`].
pub fn note(text: &str) -> Note {
    Note {
        text: text.to_string(),
    }
}

/// Configuration used by test catalogs.
pub fn test_config() -> Config {
    Config::default().kdf_rounds(TEST_KDF_ROUNDS)
}

/// A catalog over a [`RecordingStore`], with the fixture record types
/// registered.
pub struct TestCatalog {
    /// The catalog instance.
    pub catalog: Catalog,
    /// The instrumented host store the catalog writes to.
    pub store: Arc<RecordingStore>,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestCatalog {
    /// Creates a catalog over an in-memory store.
    pub fn memory() -> Self {
        Self::over(Arc::new(InMemoryStore::new()), None)
    }

    /// Creates a catalog over a directory store in a temporary directory.
    pub fn directory() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = DirectoryStore::open(temp_dir.path()).expect("Failed to open directory store");
        Self::over(Arc::new(store), Some(temp_dir))
    }

    fn over(inner: Arc<dyn EntryStore>, temp_dir: Option<TempDir>) -> Self {
        let store = Arc::new(RecordingStore::new(inner));
        let catalog = registered_catalog(store.clone(), test_config());
        Self {
            catalog,
            store,
            _temp_dir: temp_dir,
        }
    }

    /// Returns the directory path if directory-based, `None` if in-memory.
    pub fn path(&self) -> Option<&std::path::Path> {
        self._temp_dir.as_ref().map(TempDir::path)
    }

    /// Returns a catalog over the same store with a different configuration.
    pub fn with_config(&self, config: Config) -> Catalog {
        registered_catalog(self.catalog.store().clone(), config)
    }
}

impl std::ops::Deref for TestCatalog {
    type Target = Catalog;

    fn deref(&self) -> &Self::Target {
        &self.catalog
    }
}

/// Builds a catalog over `store` with [`Profile`], [`Feeding`] and [`Note`]
/// registered.
pub fn registered_catalog(store: Arc<dyn EntryStore>, config: Config) -> Catalog {
    let mut catalog = Catalog::new(store, config);
    catalog.register::<Profile>().expect("Failed to register Profile");
    catalog.register::<Feeding>().expect("Failed to register Feeding");
    catalog.register::<Note>().expect("Failed to register Note");
    catalog
}

/// Runs a test with a temporary in-memory catalog.
///
/// # Example
///
/// ```rust
/// use tabula_testkit::with_temp_catalog;
///
/// with_temp_catalog(|catalog| {
///     let db = catalog.create("Data", "").unwrap();
///     assert_eq!(db.name(), "Data");
/// });
/// ```
pub fn with_temp_catalog<F, R>(f: F) -> R
where
    F: FnOnce(&TestCatalog) -> R,
{
    let catalog = TestCatalog::memory();
    f(&catalog)
}

/// Runs a test with a temporary directory-backed catalog.
pub fn with_directory_catalog<F, R>(f: F) -> R
where
    F: FnOnce(&TestCatalog) -> R,
{
    let catalog = TestCatalog::directory();
    f(&catalog)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Creates and saves database `name` holding the feeding-log tables:
    /// one profile in `login` and `feedings` rows in `UserData`.
    pub fn feeding_log(catalog: &Catalog, name: &str, password: &str, feedings: usize) -> Database {
        let mut db = catalog.create(name, password).expect("Failed to create database");
        db.create_table::<Profile>("login")
            .expect("Failed to create login table")
            .push(profile("Ada", "2024-03-01"));

        let rows = (0..feedings).map(|i| Feeding {
            times: vec![1_700_000_000 + i as i64 * 3_600],
        });
        db.create_table::<Feeding>("UserData")
            .expect("Failed to create UserData table")
            .add_range(rows);

        db.save().expect("Failed to save database");
        db
    }

    /// Creates and saves database `name` with `tables` note tables named
    /// `t0`, `t1`, ... holding one note each.
    pub fn many_tables(catalog: &Catalog, name: &str, password: &str, tables: usize) -> Database {
        let mut db = catalog.create(name, password).expect("Failed to create database");
        for i in 0..tables {
            db.create_table::<Note>(&format!("t{i}"))
                .expect("Failed to create table")
                .push(note(&format!("note {i}")));
        }
        db.save().expect("Failed to save database");
        db
    }
}
