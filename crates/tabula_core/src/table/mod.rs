//! Typed table API.
//!
//! Provides `Table<T>`, an ordered sequence of records of one schema that
//! can persist itself to the host store through its database binding.

mod change;
mod erased;
mod record;
mod typed;

pub use change::{BatchChange, TableChange};
pub use record::Record;
pub use typed::{RecordMut, Table};

pub(crate) use erased::ErasedTable;
pub(crate) use typed::TableBinding;
