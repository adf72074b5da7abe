//! Typed table implementation.

use crate::crypto::PasswordCodec;
use crate::definition::TableDefinition;
use crate::error::{CoreError, CoreResult};
use crate::naming;
use crate::save::{self, PendingWrite, SavePlan, SaveResult};
use crate::table::change::{BatchGuard, ChangeSubscribers, TableChange};
use crate::table::record::Record;
use parking_lot::Mutex;
use std::io::{Read, Write};
use std::ops::{Deref, DerefMut, Index};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread::JoinHandle;
use tabula_storage::EntryStore;

/// Where a table persists itself: its database and that database's codec
/// and host store.
#[derive(Clone)]
pub(crate) struct TableBinding {
    pub(crate) database: String,
    pub(crate) codec: PasswordCodec,
    pub(crate) store: Arc<dyn EntryStore>,
    pub(crate) pretty_json: bool,
}

impl std::fmt::Debug for TableBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableBinding")
            .field("database", &self.database)
            .field("codec", &self.codec)
            .field("pretty_json", &self.pretty_json)
            .finish_non_exhaustive()
    }
}

/// An ordered table of records of one schema.
///
/// `Table<T>` behaves like a `Vec<T>` with change notifications: every
/// single mutation emits one [`TableChange`] to subscribers, while the batch
/// operations ([`add_range`](Self::add_range),
/// [`remove_range`](Self::remove_range), [`remove_where`](Self::remove_where))
/// emit exactly one [`TableChange::Batch`].
///
/// Tables obtained from a [`Database`](crate::Database) are bound to it and
/// can [`save`](Self::save) themselves. A table built with
/// [`Table::new`] is standalone and cannot be saved.
///
/// # Example
///
/// ```rust,ignore
/// let feedings = db.table::<Feeding>("UserData")?;
/// let changes = feedings.subscribe();
///
/// feedings.add_range(vec![breakfast, lunch, dinner]);
/// assert_eq!(feedings.len(), 3);
/// // One aggregate notification, not three
/// assert!(matches!(changes.try_recv(), Ok(TableChange::Batch(_))));
///
/// feedings.save()?;
/// ```
pub struct Table<T: Record> {
    records: Vec<T>,
    table_name: String,
    binding: Option<TableBinding>,
    changes: ChangeSubscribers,
    save_lock: Arc<Mutex<()>>,
}

impl<T: Record> Default for Table<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> Table<T> {
    /// Creates an empty standalone table.
    #[must_use]
    pub fn new() -> Self {
        Self::from_records(Vec::new())
    }

    /// Creates a standalone table holding `records`.
    #[must_use]
    pub fn from_records(records: Vec<T>) -> Self {
        Self {
            records,
            table_name: String::new(),
            binding: None,
            changes: ChangeSubscribers::default(),
            save_lock: Arc::new(Mutex::new(())),
        }
    }

    pub(crate) fn bound(records: Vec<T>, table_name: &str, binding: TableBinding) -> Self {
        let mut table = Self::from_records(records);
        table.table_name = table_name.to_string();
        table.binding = Some(binding);
        table
    }

    /// Returns the table name, empty for the unnamed table.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Returns the table's identity.
    #[must_use]
    pub fn definition(&self) -> TableDefinition {
        TableDefinition::of::<T>(self.table_name.as_str())
    }

    /// Returns the name of the database this table belongs to, if any.
    #[must_use]
    pub fn database_name(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.database.as_str())
    }

    /// Returns `true` if the table belongs to a database and can be saved.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// Subscribes to change notifications.
    pub fn subscribe(&self) -> Receiver<TableChange> {
        self.changes.subscribe()
    }

    // Sequence access

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the table holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the record at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.records.get(index)
    }

    /// Returns a mutable handle to the record at `index`.
    ///
    /// Dropping the handle emits [`TableChange::Replaced`] for `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<RecordMut<'_, T>> {
        let record = self.records.get_mut(index)?;
        Some(RecordMut {
            record,
            index,
            changes: &self.changes,
        })
    }

    /// Returns the first record.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.records.first()
    }

    /// Returns the last record.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.records.last()
    }

    /// Iterates over the records in order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }

    /// Returns the records as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.records
    }

    // Single mutations

    /// Appends `record`.
    pub fn push(&mut self, record: T) {
        let index = self.records.len();
        self.records.push(record);
        self.changes.emit(TableChange::Added { index });
    }

    /// Inserts `record` at `index`, shifting later records.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, record: T) {
        self.records.insert(index, record);
        self.changes.emit(TableChange::Added { index });
    }

    /// Removes and returns the record at `index`, or `None` if out of range.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index >= self.records.len() {
            return None;
        }
        let record = self.records.remove(index);
        self.changes.emit(TableChange::Removed { index });
        Some(record)
    }

    /// Replaces the record at `index`, returning the previous one, or gives
    /// `record` back if `index` is out of range.
    ///
    /// # Errors
    ///
    /// Returns `Err(record)` when `index >= len`.
    pub fn replace(&mut self, index: usize, record: T) -> Result<T, T> {
        match self.records.get_mut(index) {
            Some(slot) => {
                let previous = std::mem::replace(slot, record);
                self.changes.emit(TableChange::Replaced { index });
                Ok(previous)
            }
            None => Err(record),
        }
    }

    /// Removes every record.
    pub fn clear(&mut self) {
        self.records.clear();
        self.changes.emit(TableChange::Cleared);
    }

    // Batch mutations

    /// Appends every record of `records`, emitting one batch notification.
    pub fn add_range<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = T>,
    {
        let mut batch = BatchGuard::new(&self.changes, true);
        for record in records {
            batch.added(self.records.len());
            self.records.push(record);
        }
    }

    /// Removes every record matching the predicate, emitting one batch
    /// notification if anything was removed.
    ///
    /// The predicate sees every record before any is removed, so a panicking
    /// predicate leaves the table untouched. Removed positions are reported
    /// highest first.
    ///
    /// Returns the number of removed records.
    pub fn remove_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let matches: Vec<usize> = self
            .records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| predicate(record).then_some(index))
            .collect();

        let mut batch = BatchGuard::new(&self.changes, false);
        for &index in matches.iter().rev() {
            self.records.remove(index);
            batch.removed(index);
        }
        matches.len()
    }

    /// Replaces the contents wholesale without tracking per-record changes.
    pub(crate) fn reset_records(&mut self, records: Vec<T>) {
        self.records = records;
        self.changes.emit(TableChange::Reset);
    }

    // Serialization

    /// Writes the records in order as a JSON array.
    ///
    /// # Errors
    ///
    /// Returns an error if a record cannot be serialized or the writer fails.
    pub fn write_records<W: Write>(&self, writer: W) -> CoreResult<()> {
        serde_json::to_writer(writer, &self.records)?;
        Ok(())
    }

    /// Reads records written by [`write_records`](Self::write_records).
    ///
    /// Empty input reads as an empty sequence.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader fails or the content is not a
    /// sequence of `T`.
    pub fn read_records<R: Read>(mut reader: R) -> CoreResult<Vec<T>> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        Self::parse_records(&content)
    }

    pub(crate) fn parse_records(content: &str) -> CoreResult<Vec<T>> {
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(content)?)
    }

    fn serialize(&self, pretty: bool) -> CoreResult<String> {
        let content = if pretty {
            serde_json::to_string_pretty(&self.records)?
        } else {
            serde_json::to_string(&self.records)?
        };
        Ok(content)
    }

    // Persistence

    fn binding(&self) -> CoreResult<&TableBinding> {
        self.binding.as_ref().ok_or(CoreError::TableCannotBeSaved)
    }

    fn entry_name(&self) -> Option<String> {
        self.binding
            .as_ref()
            .map(|b| naming::entry_name(&b.database, &self.definition()))
    }

    /// Serializes and encodes the table into the write that persists it.
    pub(crate) fn pending_write(&self) -> CoreResult<PendingWrite> {
        let binding = self.binding()?;
        let content = binding.codec.encode(&self.serialize(binding.pretty_json)?);
        Ok(PendingWrite::new(
            naming::entry_name(&binding.database, &self.definition()),
            content,
            Some(self.save_lock.clone()),
        ))
    }

    /// Saves the table to its database's host store.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TableCannotBeSaved`] for a standalone table and
    /// [`CoreError::Save`] if serialization or the write fails.
    pub fn save(&self) -> CoreResult<()> {
        let store = self.binding()?.store.clone();
        self.save_to(store.as_ref())
    }

    /// Saves the table to `store`.
    ///
    /// Concurrent `save_to` calls on the same table are serialized by a
    /// per-table lock; their delete and write steps never interleave.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TableCannotBeSaved`] for a standalone table and
    /// [`CoreError::Save`] if serialization or the write fails.
    pub fn save_to(&self, store: &dyn EntryStore) -> CoreResult<()> {
        self.binding()?;
        let target = self.entry_name().unwrap_or_default();
        self.pending_write()
            .and_then(|write| write.commit(store))
            .map_err(|err| CoreError::save(target, err))
    }

    /// Saves the table on a worker thread.
    ///
    /// The records are serialized and encrypted before this returns; only
    /// the store I/O runs on the worker. `callback` is invoked exactly once
    /// on the worker thread with the outcome.
    pub fn save_async<F>(&self, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(SaveResult) + Send + 'static,
    {
        let target = self.entry_name().unwrap_or_default();
        let plan = self.pending_write().and_then(|write| {
            let store = self.binding()?.store.clone();
            Ok(SavePlan::new(target.clone(), store, vec![write]))
        });
        save::spawn_save(target, plan, callback)
    }
}

/// Mutable access to one record of a [`Table`].
///
/// Emits [`TableChange::Replaced`] when dropped.
pub struct RecordMut<'a, T> {
    record: &'a mut T,
    index: usize,
    changes: &'a ChangeSubscribers,
}

impl<T> RecordMut<'_, T> {
    /// Returns the record's position.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}

impl<T> Deref for RecordMut<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.record
    }
}

impl<T> DerefMut for RecordMut<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.record
    }
}

impl<T> Drop for RecordMut<'_, T> {
    fn drop(&mut self) {
        self.changes.emit(TableChange::Replaced { index: self.index });
    }
}

impl<T: Record> Index<usize> for Table<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.records[index]
    }
}

impl<'a, T: Record> IntoIterator for &'a Table<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl<T: Record + PartialEq> Table<T> {
    /// Removes the first record equal to `record`.
    ///
    /// Returns `true` if a record was removed.
    pub fn remove_item(&mut self, record: &T) -> bool {
        match self.records.iter().position(|r| r == record) {
            Some(index) => self.remove(index).is_some(),
            None => false,
        }
    }

    /// Removes the first record equal to each item of `records`, emitting
    /// one batch notification.
    ///
    /// Returns the number of removed records.
    pub fn remove_range<'a, I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = &'a T>,
    {
        let mut batch = BatchGuard::new(&self.changes, true);
        let mut removed = 0;
        for record in records {
            if let Some(index) = self.records.iter().position(|r| r == record) {
                self.records.remove(index);
                batch.removed(index);
                removed += 1;
            }
        }
        removed
    }

    /// Returns `true` if the table holds a record equal to `record`.
    #[must_use]
    pub fn contains(&self, record: &T) -> bool {
        self.records.contains(record)
    }
}

impl<T: Record + std::fmt::Debug> std::fmt::Debug for Table<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("definition", &self.definition())
            .field("records", &self.records)
            .field("binding", &self.binding)
            .finish()
    }
}
