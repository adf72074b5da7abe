//! Entry naming and manifest line format.
//!
//! A database named `Data` occupies one primary entry named `Data` holding
//! its manifest, plus one secondary entry per table:
//!
//! ```text
//! Data                      manifest
//! Data.feeding              table of `feeding` records, unnamed
//! Data.feeding[UserData]    table of `feeding` records named `UserData`
//! ```

use crate::definition::TableDefinition;
use crate::error::{CoreError, CoreResult};

/// Separator between the database name and a table's schema identity.
pub const ENTRY_SEPARATOR: char = '.';

/// Returns the name of the secondary entry holding `definition`'s records.
#[must_use]
pub fn entry_name(database: &str, definition: &TableDefinition) -> String {
    format!("{database}{ENTRY_SEPARATOR}{definition}")
}

/// Returns `true` if `entry` belongs to the database named `database`:
/// the primary entry itself or any entry prefixed by `database.`.
#[must_use]
pub fn belongs_to(database: &str, entry: &str) -> bool {
    match entry.strip_prefix(database) {
        Some("") => true,
        Some(rest) => rest.starts_with(ENTRY_SEPARATOR),
        None => false,
    }
}

/// Formats `definition` as a manifest line.
#[must_use]
pub fn format_manifest_line(definition: &TableDefinition) -> String {
    definition.to_string()
}

/// Parses a manifest line back into a definition.
///
/// A line ending in `]` is split at its last `[`: the part before is the
/// schema identity, the part inside the brackets the table name. Any other
/// line is an unnamed table.
///
/// # Errors
///
/// Returns [`CoreError::InvalidFormat`] if the schema part is empty.
pub fn parse_manifest_line(line: &str) -> CoreResult<TableDefinition> {
    let (schema, table_name) = match line.strip_suffix(']').and_then(|l| l.rsplit_once('[')) {
        Some((schema, table_name)) => (schema, table_name),
        None => (line, ""),
    };

    if schema.is_empty() {
        return Err(CoreError::invalid_format(format!(
            "manifest line {line:?} has no schema identity"
        )));
    }
    Ok(TableDefinition::new(schema, table_name))
}

/// Checks that `name` can be used as a database name.
///
/// # Errors
///
/// Returns [`CoreError::InvalidName`] for empty names and names containing
/// path separators, line breaks or [`ENTRY_SEPARATOR`].
pub fn validate_database_name(name: &str) -> CoreResult<()> {
    if name.is_empty() {
        return Err(CoreError::invalid_name(name, "database name is empty"));
    }
    if name.contains(['/', '\\', '\0', '\r', '\n']) {
        return Err(CoreError::invalid_name(
            name,
            "database name contains a path separator or line break",
        ));
    }
    // Would let delete() sweep up another database's entries.
    if name.contains(ENTRY_SEPARATOR) {
        return Err(CoreError::invalid_name(name, "database name contains '.'"));
    }
    Ok(())
}

/// Checks that `name` can be used as a table name. The empty name is valid.
///
/// # Errors
///
/// Returns [`CoreError::InvalidName`] for names containing brackets, path
/// separators or line breaks.
pub fn validate_table_name(name: &str) -> CoreResult<()> {
    if name.contains(['[', ']', '/', '\\', '\0', '\r', '\n']) {
        return Err(CoreError::invalid_name(
            name,
            "table name contains a bracket, path separator or line break",
        ));
    }
    Ok(())
}

/// Checks that `schema` can be used as a schema identity.
///
/// # Errors
///
/// Returns [`CoreError::InvalidName`] for empty identities and identities
/// containing brackets, path separators or line breaks.
pub fn validate_schema(schema: &str) -> CoreResult<()> {
    if schema.is_empty() {
        return Err(CoreError::invalid_name(schema, "schema identity is empty"));
    }
    if schema.contains(['[', ']', '/', '\\', '\0', '\r', '\n']) {
        return Err(CoreError::invalid_name(
            schema,
            "schema identity contains a bracket, path separator or line break",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_name_for_unnamed_table() {
        let def = TableDefinition::new("sanitabit.feeding", "");
        assert_eq!(entry_name("Data", &def), "Data.sanitabit.feeding");
    }

    #[test]
    fn entry_name_for_named_table() {
        let def = TableDefinition::new("sanitabit.feeding", "UserData");
        assert_eq!(entry_name("Data", &def), "Data.sanitabit.feeding[UserData]");
    }

    #[test]
    fn manifest_line_roundtrip() {
        for def in [
            TableDefinition::new("sanitabit.profile", ""),
            TableDefinition::new("sanitabit.profile", "login"),
            TableDefinition::new("a.b.c", "with space"),
        ] {
            let line = format_manifest_line(&def);
            assert_eq!(parse_manifest_line(&line).unwrap(), def);
        }
    }

    #[test]
    fn parse_splits_on_last_bracket() {
        let def = parse_manifest_line("pair<a,b>[x][y]").unwrap();
        assert_eq!(def.schema(), "pair<a,b>[x]");
        assert_eq!(def.table_name(), "y");
    }

    #[test]
    fn parse_without_closing_bracket_is_unnamed() {
        let def = parse_manifest_line("odd[name").unwrap();
        assert_eq!(def.schema(), "odd[name");
        assert_eq!(def.table_name(), "");
    }

    #[test]
    fn parse_rejects_missing_schema() {
        assert!(parse_manifest_line("[login]").is_err());
    }

    #[test]
    fn belongs_to_matches_primary_and_prefixed() {
        assert!(belongs_to("Data", "Data"));
        assert!(belongs_to("Data", "Data.feeding[UserData]"));
        assert!(!belongs_to("Data", "DataBackup"));
        assert!(!belongs_to("Data", "Other.feeding"));
        assert!(!belongs_to("Data", "Dat"));
    }

    #[test]
    fn database_names_are_validated() {
        assert!(validate_database_name("Data").is_ok());
        for bad in ["", "a.b", "a/b", "line\nbreak"] {
            assert!(validate_database_name(bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn table_names_are_validated() {
        assert!(validate_table_name("").is_ok());
        assert!(validate_table_name("UserData").is_ok());
        for bad in ["a[b", "a]b", "a\nb", "a/b"] {
            assert!(validate_table_name(bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn schemas_are_validated() {
        assert!(validate_schema("sanitabit.feeding").is_ok());
        assert!(validate_schema("").is_err());
        assert!(validate_schema("list[int]").is_err());
    }
}
