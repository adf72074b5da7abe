//! Database facade.

use crate::config::{Config, LoadMode};
use crate::crypto::PasswordCodec;
use crate::definition::TableDefinition;
use crate::error::{CoreError, CoreResult};
use crate::manifest::Manifest;
use crate::naming;
use crate::registry::SchemaRegistry;
use crate::save::{self, PendingWrite, SavePlan, SaveResult};
use crate::table::{ErasedTable, Record, Table, TableBinding};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use std::thread::JoinHandle;
use tabula_storage::EntryStore;
use tracing::{debug, info};

/// One registered table and whether its records have been read.
struct TableSlot {
    table: Box<dyn ErasedTable>,
    loaded: bool,
}

/// A named, optionally password-protected set of tables.
///
/// A `Database` is obtained from a [`Catalog`](crate::Catalog), either
/// freshly created or opened from the host store. It owns its tables; a
/// table is reached through [`table`](Self::table) and persisted with
/// [`save`](Self::save) (the whole database) or
/// [`Table::save`](crate::Table::save) (one table).
///
/// # Persisted layout
///
/// The database occupies a primary entry named after it, holding the
/// manifest, and one secondary entry per table (see [`naming`]). When a
/// password is set, every entry is encrypted as a whole.
///
/// # Lazy loading
///
/// A database opened with [`LoadMode::Lazy`] reads only its manifest. Each
/// table is read the first time it is accessed and at most once. Tables that
/// were never accessed are left untouched in the host store by
/// [`save`](Self::save).
///
/// # Example
///
/// ```rust,ignore
/// use tabula_core::{Catalog, Config, LoadMode};
///
/// let mut db = catalog.create("Data", "secret")?;
/// db.create_table::<Profile>("login")?.push(profile);
/// db.save()?;
///
/// let mut db = catalog.open("Data", "secret", LoadMode::Lazy)?;
/// let profiles = db.table::<Profile>("login")?;
/// ```
pub struct Database {
    name: String,
    codec: PasswordCodec,
    store: Arc<dyn EntryStore>,
    registry: Arc<SchemaRegistry>,
    pretty_json: bool,
    load_mode: LoadMode,
    slots: Vec<TableSlot>,
    index: HashMap<TableDefinition, usize>,
    save_lock: Arc<Mutex<()>>,
}

impl Database {
    /// Creates an empty, unsaved database.
    pub(crate) fn new(
        name: &str,
        codec: PasswordCodec,
        store: Arc<dyn EntryStore>,
        registry: Arc<SchemaRegistry>,
        config: &Config,
    ) -> Self {
        Self {
            name: name.to_string(),
            codec,
            store,
            registry,
            pretty_json: config.pretty_json,
            load_mode: LoadMode::Eager,
            slots: Vec::new(),
            index: HashMap::new(),
            save_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Reads an existing database from the host store.
    ///
    /// Errors are returned unwrapped; the catalog wraps them as open errors.
    pub(crate) fn load(
        name: &str,
        codec: PasswordCodec,
        store: Arc<dyn EntryStore>,
        registry: Arc<SchemaRegistry>,
        config: &Config,
        load_mode: LoadMode,
    ) -> CoreResult<Self> {
        let mut db = Self::new(name, codec, store, registry, config);
        db.load_mode = load_mode;

        let manifest = Manifest::decode(&db.read_entry(name)?)?;
        if manifest.database != name {
            return Err(CoreError::invalid_format(format!(
                "manifest belongs to {:?}, not {name:?}",
                manifest.database
            )));
        }
        for definition in manifest.tables {
            let (content, loaded) = match load_mode {
                LoadMode::Eager => (db.read_table(&definition)?, true),
                LoadMode::Lazy => (String::new(), false),
            };
            let table = db.registry.load(
                definition.schema(),
                definition.table_name(),
                &content,
                db.binding(),
            )?;
            debug!(database = %db.name, table = %definition, records = table.len(), loaded, "registered table");
            db.insert_slot(definition, table, loaded);
        }

        info!(
            database = %db.name,
            tables = db.slots.len(),
            mode = ?load_mode,
            encrypted = db.is_encrypted(),
            "opened database"
        );
        Ok(db)
    }

    /// Returns the database name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns how tables are read.
    #[must_use]
    pub fn load_mode(&self) -> LoadMode {
        self.load_mode
    }

    /// Returns `true` if the database is password-protected.
    #[must_use]
    pub fn is_encrypted(&self) -> bool {
        self.codec.is_encrypting()
    }

    /// Returns the identities of all tables, in manifest order.
    #[must_use]
    pub fn tables(&self) -> Vec<TableDefinition> {
        self.slots.iter().map(|slot| slot.table.definition()).collect()
    }

    /// Returns `true` if a table of `T` named `table_name` exists.
    #[must_use]
    pub fn has_table<T: Record>(&self, table_name: &str) -> bool {
        self.index.contains_key(&TableDefinition::of::<T>(table_name))
    }

    /// Returns `true` if the table has been read from the host store.
    ///
    /// Always `true` for eagerly opened databases and for tables created in
    /// this session. `false` for unknown tables.
    #[must_use]
    pub fn is_loaded(&self, definition: &TableDefinition) -> bool {
        self.index
            .get(definition)
            .is_some_and(|&slot| self.slots[slot].loaded)
    }

    /// Creates an empty table of `T` named `table_name`.
    ///
    /// The table is not persisted until the database or the table is saved.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TableExists`] if the table already exists,
    /// [`CoreError::InvalidName`] for an unusable name and
    /// [`CoreError::UnknownSchema`] if `T` is not registered with the catalog.
    pub fn create_table<T: Record>(&mut self, table_name: &str) -> CoreResult<&mut Table<T>> {
        self.add_table(table_name, Vec::new())
    }

    /// Creates a table of `T` named `table_name` from its plaintext
    /// serialized form, as written by [`Table::write_records`].
    ///
    /// # Errors
    ///
    /// Same as [`create_table`](Self::create_table), plus
    /// [`CoreError::Serialization`] if `content` does not parse.
    pub fn import_table<T: Record>(
        &mut self,
        content: &str,
        table_name: &str,
    ) -> CoreResult<&mut Table<T>> {
        let records = Table::<T>::parse_records(content)?;
        self.add_table(table_name, records)
    }

    fn add_table<T: Record>(&mut self, table_name: &str, records: Vec<T>) -> CoreResult<&mut Table<T>> {
        naming::validate_table_name(table_name)?;
        self.registry.check::<T>()?;

        let definition = TableDefinition::of::<T>(table_name);
        if self.index.contains_key(&definition) {
            return Err(CoreError::TableExists { definition });
        }

        debug!(database = %self.name, table = %definition, records = records.len(), "created table");
        let table = Table::bound(records, table_name, self.binding());
        let slot = self.insert_slot(definition.clone(), Box::new(table), true);
        self.typed_mut(slot, &definition)
    }

    /// Returns the table of `T` named `table_name`.
    ///
    /// In a lazily opened database the first access reads the table from
    /// the host store.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TableNotFound`] if no such table exists and
    /// [`CoreError::Open`] if a lazy read fails.
    pub fn table<T: Record>(&mut self, table_name: &str) -> CoreResult<&mut Table<T>> {
        let definition = TableDefinition::of::<T>(table_name);
        let slot = self.slot_of(&definition)?;
        self.ensure_loaded(slot, &definition)?;
        self.typed_mut(slot, &definition)
    }

    /// Discards unsaved changes to a table by reading it again from the host
    /// store.
    ///
    /// A table that was never saved becomes empty. In a lazily opened
    /// database a table that was never accessed is left as is.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TableNotFound`] if no such table exists, or the
    /// read, decryption or parse error.
    pub fn cancel_changes<T: Record>(&mut self, table_name: &str) -> CoreResult<()> {
        let definition = TableDefinition::of::<T>(table_name);
        let slot = self.slot_of(&definition)?;
        self.typed_mut::<T>(slot, &definition)?;
        if !self.slots[slot].loaded {
            return Ok(());
        }

        let entry = naming::entry_name(&self.name, &definition);
        let content = if self.store.exists(&entry)? {
            self.read_table(&definition)?
        } else {
            String::new()
        };
        self.slots[slot].table.reload(&content)?;
        debug!(database = %self.name, table = %definition, "discarded changes");
        Ok(())
    }

    /// Returns the manifest describing the current set of tables.
    #[must_use]
    pub fn manifest(&self) -> Manifest {
        Manifest::new(self.name.clone(), self.tables())
    }

    /// Writes the primary entry content exactly as [`save`](Self::save)
    /// would persist it.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn write_manifest_to<W: Write>(&self, mut writer: W) -> CoreResult<()> {
        writer.write_all(self.codec.encode(&self.manifest().encode()).as_bytes())?;
        Ok(())
    }

    /// Saves every loaded table, then the manifest.
    ///
    /// Writes are not transactional: if one fails, the entries written
    /// before it stay written and the rest, including the manifest, keep
    /// their previous content.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Save`] if serialization or any write fails.
    pub fn save(&self) -> CoreResult<()> {
        self.prepare_save()
            .and_then(|plan| plan.execute())
            .map_err(|err| CoreError::save(&self.name, err))?;
        info!(database = %self.name, tables = self.slots.len(), "saved database");
        Ok(())
    }

    /// Saves on a worker thread.
    ///
    /// Tables and manifest are serialized and encrypted before this returns;
    /// only the store I/O runs on the worker. `callback` is invoked exactly
    /// once on the worker thread with the outcome.
    pub fn save_async<F>(&self, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(SaveResult) + Send + 'static,
    {
        save::spawn_save(self.name.clone(), self.prepare_save(), callback)
    }

    fn prepare_save(&self) -> CoreResult<SavePlan> {
        let mut writes = Vec::with_capacity(self.slots.len() + 1);
        for slot in self.slots.iter().filter(|slot| slot.loaded) {
            writes.push(slot.table.pending_write()?);
        }
        writes.push(PendingWrite::new(
            self.name.clone(),
            self.codec.encode(&self.manifest().encode()),
            Some(self.save_lock.clone()),
        ));
        Ok(SavePlan::new(self.name.clone(), self.store.clone(), writes))
    }

    fn binding(&self) -> TableBinding {
        TableBinding {
            database: self.name.clone(),
            codec: self.codec.clone(),
            store: self.store.clone(),
            pretty_json: self.pretty_json,
        }
    }

    fn insert_slot(&mut self, definition: TableDefinition, table: Box<dyn ErasedTable>, loaded: bool) -> usize {
        let slot = self.slots.len();
        self.slots.push(TableSlot { table, loaded });
        self.index.insert(definition, slot);
        slot
    }

    fn slot_of(&self, definition: &TableDefinition) -> CoreResult<usize> {
        self.index
            .get(definition)
            .copied()
            .ok_or_else(|| CoreError::TableNotFound {
                definition: definition.clone(),
            })
    }

    fn typed_mut<T: Record>(&mut self, slot: usize, definition: &TableDefinition) -> CoreResult<&mut Table<T>> {
        self.slots[slot]
            .table
            .as_any_mut()
            .downcast_mut::<Table<T>>()
            .ok_or_else(|| CoreError::SchemaConflict {
                schema: definition.schema().to_string(),
            })
    }

    fn ensure_loaded(&mut self, slot: usize, definition: &TableDefinition) -> CoreResult<()> {
        if self.slots[slot].loaded {
            return Ok(());
        }

        let content = self
            .read_table(definition)
            .map_err(|err| CoreError::open(&self.name, err))?;
        self.slots[slot]
            .table
            .reload(&content)
            .map_err(|err| CoreError::open(&self.name, err))?;
        self.slots[slot].loaded = true;
        debug!(database = %self.name, table = %definition, "loaded table on first access");
        Ok(())
    }

    fn read_table(&self, definition: &TableDefinition) -> CoreResult<String> {
        self.read_entry(&naming::entry_name(&self.name, definition))
    }

    /// Reads and decodes one entry.
    fn read_entry(&self, entry: &str) -> CoreResult<String> {
        let bytes = self.store.read(entry)?;
        let text = String::from_utf8(bytes)
            .map_err(|_| CoreError::invalid_format(format!("entry {entry} is not valid UTF-8")))?;
        self.codec.decode(&text)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.name)
            .field("encrypted", &self.is_encrypted())
            .field("load_mode", &self.load_mode)
            .field("tables", &self.tables())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableChange;
    use serde::{Deserialize, Serialize};
    use tabula_storage::{InMemoryStore, StorageError, StorageResult};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        text: String,
    }

    impl Record for Note {
        const SCHEMA: &'static str = "test.note";
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Tag(String);

    impl Record for Tag {
        const SCHEMA: &'static str = "test.tag";
    }

    fn note(text: &str) -> Note {
        Note { text: text.into() }
    }

    fn registry() -> Arc<SchemaRegistry> {
        let mut registry = SchemaRegistry::new();
        registry.register::<Note>().unwrap();
        registry.register::<Tag>().unwrap();
        Arc::new(registry)
    }

    fn config() -> Config {
        Config::default().kdf_rounds(1000)
    }

    fn create(store: &Arc<InMemoryStore>, password: &str) -> Database {
        let config = config();
        Database::new("Data", config.codec(password), store.clone(), registry(), &config)
    }

    fn load(store: &Arc<InMemoryStore>, password: &str, mode: LoadMode) -> CoreResult<Database> {
        let config = config();
        Database::load("Data", config.codec(password), store.clone(), registry(), &config, mode)
    }

    /// Fails writes to entries whose name contains `fail_on`.
    struct FailingStore {
        inner: InMemoryStore,
        fail_on: &'static str,
    }

    impl EntryStore for FailingStore {
        fn exists(&self, name: &str) -> StorageResult<bool> {
            self.inner.exists(name)
        }

        fn read(&self, name: &str) -> StorageResult<Vec<u8>> {
            self.inner.read(name)
        }

        fn write(&self, name: &str, data: &[u8]) -> StorageResult<()> {
            if name.contains(self.fail_on) {
                return Err(StorageError::Io(std::io::Error::other("disk full")));
            }
            self.inner.write(name, data)
        }

        fn delete(&self, name: &str) -> StorageResult<()> {
            self.inner.delete(name)
        }

        fn list_names(&self) -> StorageResult<Vec<String>> {
            self.inner.list_names()
        }
    }

    #[test]
    fn create_table_twice_fails() {
        let store = Arc::new(InMemoryStore::new());
        let mut db = create(&store, "");

        db.create_table::<Note>("notes").unwrap();
        let err = db.create_table::<Note>("notes").unwrap_err();
        assert!(matches!(err, CoreError::TableExists { .. }));

        // Same schema, different name is a different table
        db.create_table::<Note>("").unwrap();
        assert_eq!(db.tables().len(), 2);
    }

    #[test]
    fn create_table_rejects_bad_name() {
        let store = Arc::new(InMemoryStore::new());
        let mut db = create(&store, "");
        let err = db.create_table::<Note>("a]b").unwrap_err();
        assert!(matches!(err, CoreError::InvalidName { .. }));
    }

    #[test]
    fn unknown_table_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let mut db = create(&store, "");
        let err = db.table::<Note>("missing").unwrap_err();
        assert!(matches!(err, CoreError::TableNotFound { .. }));
        assert!(!db.has_table::<Note>("missing"));
    }

    #[test]
    fn nothing_written_until_save() {
        let store = Arc::new(InMemoryStore::new());
        let mut db = create(&store, "");
        db.create_table::<Note>("notes").unwrap().push(note("hi"));
        assert!(store.is_empty());

        db.save().unwrap();
        assert_eq!(
            store.list_names().unwrap(),
            vec!["Data", "Data.test.note[notes]"]
        );
    }

    #[test]
    fn save_writes_plain_manifest() {
        let store = Arc::new(InMemoryStore::new());
        let mut db = create(&store, "");
        db.create_table::<Note>("notes").unwrap();
        db.create_table::<Tag>("").unwrap();
        db.save().unwrap();

        let manifest = String::from_utf8(store.read("Data").unwrap()).unwrap();
        assert_eq!(manifest, "Data\r\ntest.note[notes]\r\ntest.tag");

        let mut written = Vec::new();
        db.write_manifest_to(&mut written).unwrap();
        assert_eq!(written, manifest.into_bytes());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let store = Arc::new(InMemoryStore::new());
        let mut db = create(&store, "pw");
        db.create_table::<Note>("notes")
            .unwrap()
            .add_range(vec![note("a"), note("b")]);
        db.create_table::<Tag>("").unwrap().push(Tag("x".into()));
        db.save().unwrap();

        let mut db = load(&store, "pw", LoadMode::Eager).unwrap();
        assert_eq!(
            db.tables(),
            vec![
                TableDefinition::new("test.note", "notes"),
                TableDefinition::new("test.tag", ""),
            ]
        );
        assert_eq!(db.table::<Note>("notes").unwrap().as_slice(), &[note("a"), note("b")]);
        assert_eq!(db.table::<Tag>("").unwrap()[0], Tag("x".into()));
    }

    #[test]
    fn encrypted_entries_hide_content() {
        let store = Arc::new(InMemoryStore::new());
        let mut db = create(&store, "pw");
        db.create_table::<Note>("notes").unwrap().push(note("secret note"));
        db.save().unwrap();

        for name in store.list_names().unwrap() {
            let content = String::from_utf8(store.read(&name).unwrap()).unwrap();
            assert!(!content.contains("test.note"), "{name}");
            assert!(!content.contains("secret note"), "{name}");
        }
    }

    #[test]
    fn lazy_tables_load_on_first_access() {
        let store = Arc::new(InMemoryStore::new());
        let mut db = create(&store, "");
        db.create_table::<Note>("notes").unwrap().push(note("a"));
        db.save().unwrap();

        let mut db = load(&store, "", LoadMode::Lazy).unwrap();
        let definition = TableDefinition::new("test.note", "notes");
        assert!(!db.is_loaded(&definition));

        assert_eq!(db.table::<Note>("notes").unwrap().len(), 1);
        assert!(db.is_loaded(&definition));
    }

    #[test]
    fn lazy_save_skips_unloaded_tables() {
        let store = Arc::new(InMemoryStore::new());
        let mut db = create(&store, "");
        db.create_table::<Note>("notes").unwrap().push(note("a"));
        db.create_table::<Tag>("").unwrap().push(Tag("t".into()));
        db.save().unwrap();

        let mut db = load(&store, "", LoadMode::Lazy).unwrap();
        db.table::<Tag>("").unwrap().clear();
        db.save().unwrap();

        let mut db = load(&store, "", LoadMode::Eager).unwrap();
        assert_eq!(db.table::<Note>("notes").unwrap().len(), 1);
        assert!(db.table::<Tag>("").unwrap().is_empty());
    }

    #[test]
    fn lazy_load_failure_is_open_error() {
        let store = Arc::new(InMemoryStore::new());
        let mut db = create(&store, "");
        db.create_table::<Note>("notes").unwrap();
        db.save().unwrap();
        store.write("Data.test.note[notes]", b"{not json").unwrap();

        let mut db = load(&store, "", LoadMode::Lazy).unwrap();
        let err = db.table::<Note>("notes").unwrap_err();
        assert!(matches!(err, CoreError::Open { .. }));
        assert!(matches!(err.cause(), CoreError::Serialization(_)));
    }

    #[test]
    fn eager_load_of_unknown_schema_fails() {
        let store = Arc::new(InMemoryStore::new());
        store.write("Data", b"Data\r\nsomething.else").unwrap();
        store.write("Data.something.else", b"[]").unwrap();

        let err = load(&store, "", LoadMode::Eager).unwrap_err();
        assert!(matches!(err, CoreError::UnknownSchema { .. }));
    }

    #[test]
    fn manifest_naming_another_database_is_rejected() {
        let store = Arc::new(InMemoryStore::new());
        store.write("Data", b"Other\r\ntest.note[notes]").unwrap();
        store.write("Data.test.note[notes]", b"[]").unwrap();

        for mode in [LoadMode::Eager, LoadMode::Lazy] {
            let err = load(&store, "", mode).unwrap_err();
            assert!(matches!(err, CoreError::InvalidFormat { .. }));
        }
    }

    #[test]
    fn encrypted_manifest_read_without_password_is_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let mut db = create(&store, "pw");
        db.create_table::<Note>("notes").unwrap().push(note("a"));
        db.save().unwrap();

        assert!(matches!(
            load(&store, "", LoadMode::Lazy),
            Err(CoreError::InvalidFormat { .. })
        ));
        assert_eq!(load(&store, "pw", LoadMode::Eager).unwrap().tables().len(), 1);
    }

    #[test]
    fn cancel_changes_restores_saved_records() {
        let store = Arc::new(InMemoryStore::new());
        let mut db = create(&store, "pw");
        db.create_table::<Note>("notes").unwrap().push(note("kept"));
        db.save().unwrap();

        let rx = {
            let table = db.table::<Note>("notes").unwrap();
            table.push(note("discarded"));
            table.subscribe()
        };
        db.cancel_changes::<Note>("notes").unwrap();

        assert_eq!(db.table::<Note>("notes").unwrap().as_slice(), &[note("kept")]);
        assert_eq!(rx.try_recv().unwrap(), TableChange::Reset);
    }

    #[test]
    fn cancel_changes_on_unsaved_table_empties_it() {
        let store = Arc::new(InMemoryStore::new());
        let mut db = create(&store, "");
        db.create_table::<Note>("notes").unwrap().push(note("never saved"));

        db.cancel_changes::<Note>("notes").unwrap();
        assert!(db.table::<Note>("notes").unwrap().is_empty());
    }

    #[test]
    fn import_table_parses_content() {
        let store = Arc::new(InMemoryStore::new());
        let mut db = create(&store, "");

        let table = db
            .import_table::<Note>(r#"[{"text":"imported"}]"#, "notes")
            .unwrap();
        assert_eq!(table.as_slice(), &[note("imported")]);
        assert!(table.is_bound());

        let err = db.import_table::<Note>("[]", "notes").unwrap_err();
        assert!(matches!(err, CoreError::TableExists { .. }));
    }

    #[test]
    fn failed_table_write_keeps_old_manifest() {
        let store = Arc::new(FailingStore {
            inner: InMemoryStore::new(),
            fail_on: "test.tag",
        });
        let config = config();
        let mut db = Database::new("Data", config.codec(""), store.clone(), registry(), &config);
        db.create_table::<Note>("notes").unwrap();
        db.create_table::<Tag>("").unwrap();

        let err = db.save().unwrap_err();
        assert!(matches!(err, CoreError::Save { .. }));
        assert!(matches!(err.cause(), CoreError::Storage(_)));

        // Tables before the failure were written; the manifest was not.
        assert!(store.exists("Data.test.note[notes]").unwrap());
        assert!(!store.exists("Data").unwrap());
    }

    #[test]
    fn save_async_reports_once() {
        let store = Arc::new(InMemoryStore::new());
        let mut db = create(&store, "");
        db.create_table::<Note>("notes").unwrap().push(note("a"));

        let (tx, rx) = std::sync::mpsc::channel();
        db.save_async(move |result| tx.send(result.is_ok()).unwrap())
            .join()
            .unwrap();

        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![true]);
        assert!(store.exists("Data").unwrap());
    }
}
