//! Type-erased view of a table, used by the database to hold tables of
//! different record types side by side.

use crate::definition::TableDefinition;
use crate::error::CoreResult;
use crate::save::PendingWrite;
use crate::table::record::Record;
use crate::table::typed::Table;
use std::any::Any;

pub(crate) trait ErasedTable: Send + Sync {
    fn definition(&self) -> TableDefinition;

    fn len(&self) -> usize;

    /// Serializes and encodes the table for saving.
    fn pending_write(&self) -> CoreResult<PendingWrite>;

    /// Replaces the records with ones parsed from decoded entry content.
    fn reload(&mut self, content: &str) -> CoreResult<()>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Record> ErasedTable for Table<T> {
    fn definition(&self) -> TableDefinition {
        Table::definition(self)
    }

    fn len(&self) -> usize {
        Table::len(self)
    }

    fn pending_write(&self) -> CoreResult<PendingWrite> {
        Table::pending_write(self)
    }

    fn reload(&mut self, content: &str) -> CoreResult<()> {
        let records = Table::<T>::parse_records(content)?;
        self.reset_records(records);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
