//! Database manifest.
//!
//! The manifest is the plaintext content of a database's primary entry:
//!
//! ```text
//! Data
//! sanitabit.profile[login]
//! sanitabit.feeding[UserData]
//! ```
//!
//! Line 1 is the database name. Every further line is one table identity in
//! the form produced by [`naming::format_manifest_line`].

use crate::definition::TableDefinition;
use crate::error::{CoreError, CoreResult};
use crate::naming;
use std::collections::HashSet;

/// Line separator used when writing a manifest.
pub const LINE_SEPARATOR: &str = "\r\n";

/// The decoded content of a primary entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Database name recorded on line 1.
    pub database: String,
    /// Table identities in manifest order.
    pub tables: Vec<TableDefinition>,
}

impl Manifest {
    /// Creates a manifest.
    #[must_use]
    pub fn new(database: impl Into<String>, tables: Vec<TableDefinition>) -> Self {
        Self {
            database: database.into(),
            tables,
        }
    }

    /// Renders the manifest, lines joined by [`LINE_SEPARATOR`].
    #[must_use]
    pub fn encode(&self) -> String {
        let mut lines = Vec::with_capacity(self.tables.len() + 1);
        lines.push(self.database.clone());
        lines.extend(self.tables.iter().map(naming::format_manifest_line));
        lines.join(LINE_SEPARATOR)
    }

    /// Parses manifest text.
    ///
    /// Accepts `\r\n`, `\n` or `\r` line breaks and skips empty lines. The
    /// first remaining line is taken as the database name; callers compare
    /// it against the name they opened.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidFormat`] if the text has no lines, a line
    /// has no schema identity, or the same table appears twice.
    pub fn decode(text: &str) -> CoreResult<Self> {
        let mut lines = text.split(['\r', '\n']).filter(|line| !line.is_empty());

        let database = lines
            .next()
            .ok_or_else(|| CoreError::invalid_format("manifest is empty"))?
            .to_string();

        let mut seen = HashSet::new();
        let mut tables = Vec::new();
        for line in lines {
            let definition = naming::parse_manifest_line(line)?;
            if !seen.insert(definition.clone()) {
                return Err(CoreError::invalid_format(format!(
                    "table {definition} is listed twice"
                )));
            }
            tables.push(definition);
        }

        Ok(Self { database, tables })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Manifest {
        Manifest::new(
            "Data",
            vec![
                TableDefinition::new("sanitabit.profile", "login"),
                TableDefinition::new("sanitabit.feeding", "UserData"),
                TableDefinition::new("sanitabit.note", ""),
            ],
        )
    }

    #[test]
    fn encode_uses_crlf() {
        assert_eq!(
            sample().encode(),
            "Data\r\nsanitabit.profile[login]\r\nsanitabit.feeding[UserData]\r\nsanitabit.note"
        );
    }

    #[test]
    fn encode_decode_roundtrip() {
        let manifest = sample();
        assert_eq!(Manifest::decode(&manifest.encode()).unwrap(), manifest);
    }

    #[test]
    fn decode_empty_database() {
        let manifest = Manifest::decode("Data").unwrap();
        assert_eq!(manifest.database, "Data");
        assert!(manifest.tables.is_empty());
    }

    #[test]
    fn decode_tolerates_line_endings() {
        let text = "Data\n\nsanitabit.profile[login]\r\rsanitabit.note\r\n";
        let manifest = Manifest::decode(text).unwrap();
        assert_eq!(
            manifest.tables,
            vec![
                TableDefinition::new("sanitabit.profile", "login"),
                TableDefinition::new("sanitabit.note", ""),
            ]
        );
    }

    #[test]
    fn decode_empty_text_fails() {
        assert!(matches!(
            Manifest::decode("\r\n"),
            Err(CoreError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn duplicate_tables_rejected() {
        let text = "Data\r\nsanitabit.note\r\nsanitabit.note";
        assert!(matches!(
            Manifest::decode(text),
            Err(CoreError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn same_schema_different_names_allowed() {
        let text = "Data\r\nsanitabit.note[a]\r\nsanitabit.note[b]\r\nsanitabit.note";
        assert_eq!(Manifest::decode(text).unwrap().tables.len(), 3);
    }
}
