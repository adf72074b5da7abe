//! Catalog: creating, opening and deleting databases in one host store.

use crate::config::{Config, LoadMode};
use crate::database::Database;
use crate::error::{CoreError, CoreResult};
use crate::naming;
use crate::registry::SchemaRegistry;
use crate::table::Record;
use std::sync::Arc;
use tabula_storage::EntryStore;
use tracing::{debug, info};

/// Entry point for the databases of one host store.
///
/// A catalog bundles the host store, the set of record types databases may
/// contain and the configuration every database is opened with. It is cheap
/// to clone.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use tabula_core::{Catalog, Config, LoadMode};
/// use tabula_storage::DirectoryStore;
///
/// let store = Arc::new(DirectoryStore::open(Path::new("app_data"))?);
/// let mut catalog = Catalog::new(store, Config::default());
/// catalog.register::<Profile>()?;
/// catalog.register::<Feeding>()?;
///
/// let db = if catalog.exists("Data")? {
///     catalog.open("Data", password, LoadMode::Eager)?
/// } else {
///     catalog.create("Data", password)?
/// };
/// ```
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn EntryStore>,
    registry: Arc<SchemaRegistry>,
    config: Config,
}

impl Catalog {
    /// Creates a catalog over `store` with no registered record types.
    pub fn new(store: Arc<dyn EntryStore>, config: Config) -> Self {
        Self {
            store,
            registry: Arc::new(SchemaRegistry::new()),
            config,
        }
    }

    /// Registers the record type `T` so its tables can be created and
    /// opened.
    ///
    /// Databases already handed out keep the registry they were created
    /// with.
    ///
    /// # Errors
    ///
    /// See [`SchemaRegistry::register`].
    pub fn register<T: Record>(&mut self) -> CoreResult<()> {
        Arc::make_mut(&mut self.registry).register::<T>()
    }

    /// Returns the registered record types.
    #[must_use]
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Returns the host store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn EntryStore> {
        &self.store
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns `true` if a database named `name` exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the host store cannot be queried.
    pub fn exists(&self, name: &str) -> CoreResult<bool> {
        Ok(self.store.exists(name)?)
    }

    /// Creates a new, empty database.
    ///
    /// Nothing is written to the host store until the database is saved.
    /// An empty `password` leaves the database unencrypted.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidName`] for an unusable name and
    /// [`CoreError::DatabaseExists`] if the name is taken.
    pub fn create(&self, name: &str, password: &str) -> CoreResult<Database> {
        naming::validate_database_name(name)?;
        if self.exists(name)? {
            return Err(CoreError::DatabaseExists {
                name: name.to_string(),
            });
        }

        info!(database = name, encrypted = !password.is_empty(), "created database");
        Ok(Database::new(
            name,
            self.config.codec(password),
            self.store.clone(),
            self.registry.clone(),
            &self.config,
        ))
    }

    /// Opens an existing database.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DatabaseDoesNotExist`] if there is no such
    /// database, checked before anything is read. Any failure to read,
    /// decrypt or parse the manifest or an eagerly loaded table is returned
    /// as [`CoreError::Open`] carrying the cause.
    pub fn open(&self, name: &str, password: &str, mode: LoadMode) -> CoreResult<Database> {
        naming::validate_database_name(name)?;
        if !self.exists(name)? {
            return Err(CoreError::DatabaseDoesNotExist {
                name: name.to_string(),
            });
        }

        Database::load(
            name,
            self.config.codec(password),
            self.store.clone(),
            self.registry.clone(),
            &self.config,
            mode,
        )
        .map_err(|err| CoreError::open(name, err))
    }

    /// Deletes a database and every table entry belonging to it.
    ///
    /// Deleting a database that does not exist is a no-op. Returns the
    /// number of entries removed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidName`] for an unusable name, or the host
    /// store error.
    pub fn delete(&self, name: &str) -> CoreResult<usize> {
        naming::validate_database_name(name)?;
        let mut removed = 0;
        for entry in self.store.list_names()? {
            if naming::belongs_to(name, &entry) {
                self.store.delete(&entry)?;
                debug!(database = name, entry = %entry, "deleted entry");
                removed += 1;
            }
        }

        info!(database = name, entries = removed, "deleted database");
        Ok(removed)
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tabula_storage::InMemoryStore;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Person {
        name: String,
    }

    impl Record for Person {
        const SCHEMA: &'static str = "test.person";
    }

    fn catalog(store: &Arc<InMemoryStore>) -> Catalog {
        let mut catalog = Catalog::new(store.clone(), Config::default().kdf_rounds(1000));
        catalog.register::<Person>().unwrap();
        catalog
    }

    fn saved_database(catalog: &Catalog, name: &str, password: &str) {
        let mut db = catalog.create(name, password).unwrap();
        db.create_table::<Person>("login").unwrap().push(Person {
            name: "Ada".into(),
        });
        db.save().unwrap();
    }

    #[test]
    fn create_existing_fails() {
        let store = Arc::new(InMemoryStore::new());
        let catalog = catalog(&store);
        saved_database(&catalog, "Data", "");

        let err = catalog.create("Data", "").unwrap_err();
        assert!(matches!(err, CoreError::DatabaseExists { .. }));
    }

    #[test]
    fn create_writes_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let catalog = catalog(&store);
        catalog.create("Data", "pw").unwrap();
        assert!(store.is_empty());
        assert!(!catalog.exists("Data").unwrap());
    }

    #[test]
    fn open_missing_fails_without_writes() {
        let store = Arc::new(InMemoryStore::new());
        let catalog = catalog(&store);

        let err = catalog.open("Data", "", LoadMode::Eager).unwrap_err();
        assert!(matches!(err, CoreError::DatabaseDoesNotExist { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn open_with_wrong_password_fails() {
        let store = Arc::new(InMemoryStore::new());
        let catalog = catalog(&store);
        saved_database(&catalog, "Data", "right");

        let err = catalog.open("Data", "wrong", LoadMode::Eager).unwrap_err();
        assert!(matches!(err, CoreError::Open { .. }));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn open_roundtrip() {
        let store = Arc::new(InMemoryStore::new());
        let catalog = catalog(&store);
        saved_database(&catalog, "Data", "pw");

        let mut db = catalog.open("Data", "pw", LoadMode::Eager).unwrap();
        assert_eq!(db.name(), "Data");
        assert_eq!(db.table::<Person>("login").unwrap()[0].name, "Ada");
    }

    #[test]
    fn open_with_unregistered_schema_fails() {
        let store = Arc::new(InMemoryStore::new());
        saved_database(&catalog(&store), "Data", "");

        let bare = Catalog::new(store.clone(), Config::default());
        let err = bare.open("Data", "", LoadMode::Eager).unwrap_err();
        assert!(matches!(err.cause(), CoreError::UnknownSchema { .. }));
    }

    #[test]
    fn delete_sweeps_only_own_entries() {
        let store = Arc::new(InMemoryStore::new());
        let catalog = catalog(&store);
        saved_database(&catalog, "Data", "");
        saved_database(&catalog, "DataOld", "");
        store.write("Data.orphan", b"left behind").unwrap();

        assert_eq!(catalog.delete("Data").unwrap(), 3);
        assert!(!catalog.exists("Data").unwrap());
        assert_eq!(
            store.list_names().unwrap(),
            vec!["DataOld", "DataOld.test.person[login]"]
        );
    }

    #[test]
    fn delete_missing_is_noop() {
        let store = Arc::new(InMemoryStore::new());
        assert_eq!(catalog(&store).delete("Data").unwrap(), 0);
    }

    #[test]
    fn invalid_names_rejected_before_io() {
        let store = Arc::new(InMemoryStore::new());
        let catalog = catalog(&store);
        for name in ["", "a.b", "x/y"] {
            assert!(matches!(
                catalog.create(name, ""),
                Err(CoreError::InvalidName { .. })
            ));
        }
    }
}
