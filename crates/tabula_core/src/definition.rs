//! Table identity.

use crate::table::Record;
use std::fmt;

/// The identity of one table inside a database.
///
/// A table is identified by the schema identity of its records plus an
/// optional table name, so one database can hold several tables of the same
/// record type. Equality and hashing are purely structural.
///
/// `Display` renders the manifest line form: `schema` or `schema[name]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableDefinition {
    schema: String,
    table_name: String,
}

impl TableDefinition {
    /// Creates a definition from its two components.
    pub fn new(schema: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table_name: table_name.into(),
        }
    }

    /// The definition of a table of `T` records named `table_name`.
    pub fn of<T: Record>(table_name: impl Into<String>) -> Self {
        Self::new(T::SCHEMA, table_name)
    }

    /// Returns the schema identity.
    #[must_use]
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Returns the table name, empty for the unnamed table.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Returns `true` if the table has a non-empty name.
    #[must_use]
    pub fn is_named(&self) -> bool {
        !self.table_name.is_empty()
    }
}

impl fmt::Display for TableDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_named() {
            write!(f, "{}[{}]", self.schema, self.table_name)
        } else {
            f.write_str(&self.schema)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn equality_is_structural() {
        assert_eq!(
            TableDefinition::new("feeding", "UserData"),
            TableDefinition::new("feeding", "UserData")
        );
        assert_ne!(
            TableDefinition::new("feeding", "UserData"),
            TableDefinition::new("feeding", "")
        );
        assert_ne!(
            TableDefinition::new("feeding", "login"),
            TableDefinition::new("profile", "login")
        );
    }

    #[test]
    fn hash_matches_equality() {
        let mut set = HashSet::new();
        set.insert(TableDefinition::new("feeding", "a"));
        assert!(set.contains(&TableDefinition::new("feeding", "a")));
        assert!(!set.contains(&TableDefinition::new("feeding", "b")));
    }

    #[test]
    fn display_appends_bracketed_name() {
        assert_eq!(TableDefinition::new("feeding", "").to_string(), "feeding");
        assert_eq!(
            TableDefinition::new("feeding", "UserData").to_string(),
            "feeding[UserData]"
        );
    }
}
