//! Instrumented host stores.
//!
//! [`RecordingStore`] wraps any [`EntryStore`] and keeps a log of every call,
//! so tests can assert how often and in which order entries were touched.

use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tabula_storage::{EntryStore, InMemoryStore, StorageError, StorageResult};

/// Kind of store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    /// `exists`
    Exists,
    /// `read`
    Read,
    /// `write`
    Write,
    /// `delete`
    Delete,
    /// `list_names`
    List,
}

/// One logged store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOp {
    /// What was called.
    pub kind: OpKind,
    /// The entry name, empty for `list_names`.
    pub entry: String,
}

/// A store that logs every call before forwarding it.
pub struct RecordingStore {
    inner: Arc<dyn EntryStore>,
    log: Mutex<Vec<StoreOp>>,
    write_delay: Option<Duration>,
    fail_writes_to: Mutex<Option<String>>,
}

impl RecordingStore {
    /// Wraps `inner`.
    pub fn new(inner: Arc<dyn EntryStore>) -> Self {
        Self {
            inner,
            log: Mutex::new(Vec::new()),
            write_delay: None,
            fail_writes_to: Mutex::new(None),
        }
    }

    /// Wraps a fresh [`InMemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()))
    }

    /// Sleeps for `delay` between logging and performing every write, which
    /// widens the window for concurrent calls to interleave.
    #[must_use]
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    /// Makes every later write to `entry` fail with an I/O error.
    pub fn fail_writes_to(&self, entry: impl Into<String>) {
        *self.fail_writes_to.lock() = Some(entry.into());
    }

    /// Returns a copy of the call log.
    pub fn log(&self) -> Vec<StoreOp> {
        self.log.lock().clone()
    }

    /// Clears the call log.
    pub fn clear_log(&self) {
        self.log.lock().clear();
    }

    /// Number of logged calls of `kind` on `entry`.
    pub fn count(&self, kind: OpKind, entry: &str) -> usize {
        self.log
            .lock()
            .iter()
            .filter(|op| op.kind == kind && op.entry == entry)
            .count()
    }

    /// Number of logged calls of `kind` on any entry.
    pub fn total(&self, kind: OpKind) -> usize {
        self.log.lock().iter().filter(|op| op.kind == kind).count()
    }

    /// Number of logged calls that modify the store.
    pub fn mutations(&self) -> usize {
        self.total(OpKind::Write) + self.total(OpKind::Delete)
    }

    /// Returns the logged calls on `entry`, in order.
    pub fn ops_on(&self, entry: &str) -> Vec<OpKind> {
        self.log
            .lock()
            .iter()
            .filter(|op| op.entry == entry)
            .map(|op| op.kind)
            .collect()
    }

    fn record(&self, kind: OpKind, entry: &str) {
        self.log.lock().push(StoreOp {
            kind,
            entry: entry.to_string(),
        });
    }
}

impl EntryStore for RecordingStore {
    fn exists(&self, name: &str) -> StorageResult<bool> {
        self.record(OpKind::Exists, name);
        self.inner.exists(name)
    }

    fn read(&self, name: &str) -> StorageResult<Vec<u8>> {
        self.record(OpKind::Read, name);
        self.inner.read(name)
    }

    fn write(&self, name: &str, data: &[u8]) -> StorageResult<()> {
        self.record(OpKind::Write, name);
        if let Some(delay) = self.write_delay {
            thread::sleep(delay);
        }
        if self.fail_writes_to.lock().as_deref() == Some(name) {
            return Err(StorageError::Io(std::io::Error::other(format!(
                "injected write failure for {name}"
            ))));
        }
        self.inner.write(name, data)
    }

    fn delete(&self, name: &str) -> StorageResult<()> {
        self.record(OpKind::Delete, name);
        self.inner.delete(name)
    }

    fn list_names(&self) -> StorageResult<Vec<String>> {
        self.record(OpKind::List, "");
        self.inner.list_names()
    }
}

/// Asserts that every replacement of `entry` in `ops` ran as one
/// uninterrupted `exists`, optional `delete`, `write` sequence.
///
/// # Panics
///
/// Panics if two replacements overlap.
pub fn assert_replacements_serialized(ops: &[OpKind], entry: &str) {
    let mut rest = ops;
    while let Some((first, tail)) = rest.split_first() {
        assert_eq!(*first, OpKind::Exists, "{entry}: replacement does not start with exists: {ops:?}");
        let tail = match tail.split_first() {
            Some((OpKind::Delete, after)) => after,
            _ => tail,
        };
        match tail.split_first() {
            Some((OpKind::Write, after)) => rest = after,
            _ => panic!("{entry}: replacements interleaved: {ops:?}"),
        }
    }
}
