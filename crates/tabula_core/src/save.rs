//! Save path shared by tables and databases.
//!
//! A save is prepared on the caller's thread into a [`SavePlan`]: the fully
//! serialized and encoded content of every entry to write. The plan is then
//! executed either inline or on a worker thread. Preparing first means the
//! worker never touches the table or database it was prepared from.

use crate::error::{CoreError, CoreResult};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tabula_storage::EntryStore;
use tracing::{debug, warn};

/// Outcome delivered to an asynchronous save callback.
pub type SaveResult = CoreResult<()>;

/// One entry to replace in the host store.
pub(crate) struct PendingWrite {
    entry: String,
    content: Vec<u8>,
    lock: Option<Arc<Mutex<()>>>,
}

impl PendingWrite {
    pub(crate) fn new(entry: String, content: String, lock: Option<Arc<Mutex<()>>>) -> Self {
        Self {
            entry,
            content: content.into_bytes(),
            lock,
        }
    }

    pub(crate) fn entry(&self) -> &str {
        &self.entry
    }

    /// Deletes any prior entry and writes the new content, holding the
    /// owner's save lock for the duration.
    pub(crate) fn commit(&self, store: &dyn EntryStore) -> CoreResult<()> {
        let _guard = self.lock.as_ref().map(|lock| lock.lock());
        if store.exists(&self.entry)? {
            store.delete(&self.entry)?;
        }
        store.write(&self.entry, &self.content)?;
        debug!(entry = %self.entry, bytes = self.content.len(), "committed entry");
        Ok(())
    }
}

/// The prepared writes of one save.
pub(crate) struct SavePlan {
    target: String,
    store: Arc<dyn EntryStore>,
    writes: Vec<PendingWrite>,
}

impl SavePlan {
    pub(crate) fn new(target: String, store: Arc<dyn EntryStore>, writes: Vec<PendingWrite>) -> Self {
        Self {
            target,
            store,
            writes,
        }
    }

    /// Commits every write in order, stopping at the first failure.
    ///
    /// Writes before the failing one stay committed.
    pub(crate) fn execute(&self) -> CoreResult<()> {
        for (position, write) in self.writes.iter().enumerate() {
            if let Err(err) = write.commit(self.store.as_ref()) {
                warn!(
                    target_name = %self.target,
                    entry = write.entry(),
                    committed = position,
                    remaining = self.writes.len() - position,
                    error = %err,
                    "save stopped partway"
                );
                return Err(CoreError::save(&self.target, err));
            }
        }
        Ok(())
    }
}

/// Runs `plan` on a worker thread and reports the outcome to `callback`.
///
/// `callback` runs exactly once, on the worker thread, with the preparation
/// error if `plan` is already an error.
pub(crate) fn spawn_save<F>(target: String, plan: CoreResult<SavePlan>, callback: F) -> JoinHandle<()>
where
    F: FnOnce(SaveResult) + Send + 'static,
{
    thread::spawn(move || {
        let result = plan
            .and_then(|plan| plan.execute())
            .map_err(|err| CoreError::save(target, err));
        callback(result);
    })
}
