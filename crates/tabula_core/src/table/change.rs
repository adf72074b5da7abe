//! Change notifications for tables.

use parking_lot::Mutex;
use std::sync::mpsc::{self, Receiver, Sender};

/// A change to a table's contents, delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableChange {
    /// A record was inserted at `index`.
    Added {
        /// Position of the new record.
        index: usize,
    },
    /// The record at `index` was removed.
    Removed {
        /// Position the record occupied.
        index: usize,
    },
    /// The record at `index` was replaced.
    Replaced {
        /// Position of the replaced record.
        index: usize,
    },
    /// All records were removed.
    Cleared,
    /// The contents were replaced wholesale, e.g. reloaded from the store.
    Reset,
    /// One aggregate change for a batch operation.
    Batch(BatchChange),
}

/// The aggregate result of a batch operation.
///
/// Indices are positions at the moment of each individual mutation, in the
/// order the mutations happened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchChange {
    /// Positions at which records were added.
    pub added: Vec<usize>,
    /// Positions from which records were removed.
    pub removed: Vec<usize>,
}

impl BatchChange {
    /// Returns `true` if the batch changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Fan-out of table changes to subscribers.
#[derive(Debug, Default)]
pub(crate) struct ChangeSubscribers {
    senders: Mutex<Vec<Sender<TableChange>>>,
}

impl ChangeSubscribers {
    pub(crate) fn subscribe(&self) -> Receiver<TableChange> {
        let (tx, rx) = mpsc::channel();
        self.senders.lock().push(tx);
        rx
    }

    /// Sends `change` to every live subscriber, dropping disconnected ones.
    pub(crate) fn emit(&self, change: TableChange) {
        let mut senders = self.senders.lock();
        if senders.is_empty() {
            return;
        }
        senders.retain(|tx| tx.send(change.clone()).is_ok());
    }

    #[cfg(test)]
    pub(crate) fn count(&self) -> usize {
        self.senders.lock().len()
    }
}

/// Collects the mutations of one batch and emits them as a single
/// [`TableChange::Batch`] when dropped, including during unwinding.
pub(crate) struct BatchGuard<'a> {
    subscribers: &'a ChangeSubscribers,
    change: BatchChange,
    emit_when_empty: bool,
}

impl<'a> BatchGuard<'a> {
    pub(crate) fn new(subscribers: &'a ChangeSubscribers, emit_when_empty: bool) -> Self {
        Self {
            subscribers,
            change: BatchChange::default(),
            emit_when_empty,
        }
    }

    pub(crate) fn added(&mut self, index: usize) {
        self.change.added.push(index);
    }

    pub(crate) fn removed(&mut self, index: usize) {
        self.change.removed.push(index);
    }
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        if self.change.is_empty() && !self.emit_when_empty {
            return;
        }
        let change = std::mem::take(&mut self.change);
        self.subscribers.emit(TableChange::Batch(change));
    }
}
