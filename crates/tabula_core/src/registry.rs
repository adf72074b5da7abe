//! Schema registry.
//!
//! Opening a database turns manifest lines back into typed tables. The
//! registry maps each schema identity to the record type that owns it and a
//! factory building a bound table of that type from entry content.

use crate::error::{CoreError, CoreResult};
use crate::naming;
use crate::table::{ErasedTable, Record, Table, TableBinding};
use std::any::{type_name, TypeId};
use std::collections::HashMap;

type LoadFn = fn(&str, &str, TableBinding) -> CoreResult<Box<dyn ErasedTable>>;

#[derive(Clone, Copy)]
struct SchemaEntry {
    type_id: TypeId,
    type_name: &'static str,
    load: LoadFn,
}

fn load_table<T: Record>(
    content: &str,
    table_name: &str,
    binding: TableBinding,
) -> CoreResult<Box<dyn ErasedTable>> {
    let records = Table::<T>::parse_records(content)?;
    Ok(Box::new(Table::bound(records, table_name, binding)))
}

/// The set of record types a catalog can open.
#[derive(Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<&'static str, SchemaEntry>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` under [`Record::SCHEMA`].
    ///
    /// Registering the same type twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidName`] if the schema identity cannot be
    /// written to a manifest, and [`CoreError::SchemaConflict`] if another
    /// type already claims it.
    pub fn register<T: Record>(&mut self) -> CoreResult<()> {
        naming::validate_schema(T::SCHEMA)?;
        if let Some(existing) = self.schemas.get(T::SCHEMA) {
            if existing.type_id == TypeId::of::<T>() {
                return Ok(());
            }
            return Err(CoreError::SchemaConflict {
                schema: T::SCHEMA.to_string(),
            });
        }

        self.schemas.insert(
            T::SCHEMA,
            SchemaEntry {
                type_id: TypeId::of::<T>(),
                type_name: type_name::<T>(),
                load: load_table::<T>,
            },
        );
        Ok(())
    }

    /// Returns `true` if `schema` is registered.
    #[must_use]
    pub fn contains(&self, schema: &str) -> bool {
        self.schemas.contains_key(schema)
    }

    /// Returns the registered schema identities, sorted.
    #[must_use]
    pub fn schemas(&self) -> Vec<&'static str> {
        let mut schemas: Vec<_> = self.schemas.keys().copied().collect();
        schemas.sort_unstable();
        schemas
    }

    /// Returns the number of registered schemas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Checks that `T` is the type registered for its schema.
    pub(crate) fn check<T: Record>(&self) -> CoreResult<()> {
        match self.schemas.get(T::SCHEMA) {
            Some(entry) if entry.type_id == TypeId::of::<T>() => Ok(()),
            Some(_) => Err(CoreError::SchemaConflict {
                schema: T::SCHEMA.to_string(),
            }),
            None => Err(CoreError::UnknownSchema {
                schema: T::SCHEMA.to_string(),
            }),
        }
    }

    /// Builds a bound table of the type registered for `schema` from
    /// decoded entry content.
    pub(crate) fn load(
        &self,
        schema: &str,
        table_name: &str,
        content: &str,
        binding: TableBinding,
    ) -> CoreResult<Box<dyn ErasedTable>> {
        let entry = self.schemas.get(schema).ok_or_else(|| CoreError::UnknownSchema {
            schema: schema.to_string(),
        })?;
        (entry.load)(content, table_name, binding)
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut schemas: Vec<_> = self
            .schemas
            .iter()
            .map(|(schema, entry)| (*schema, entry.type_name))
            .collect();
        schemas.sort_unstable();
        f.debug_struct("SchemaRegistry")
            .field("schemas", &schemas)
            .finish()
    }
}
