//! Error types for Tabula core.

use crate::definition::TableDefinition;
use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in Tabula core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Host store error.
    #[error("storage error: {0}")]
    Storage(#[from] tabula_storage::StorageError),

    /// Record serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error while streaming content.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A database with this name already exists in the host store.
    #[error("database already exists: {name}")]
    DatabaseExists {
        /// Name of the database.
        name: String,
    },

    /// No database with this name exists in the host store.
    #[error("database does not exist: {name}")]
    DatabaseDoesNotExist {
        /// Name of the database.
        name: String,
    },

    /// A table with the same identity is already registered.
    #[error("table already exists: {definition}")]
    TableExists {
        /// Identity of the table.
        definition: TableDefinition,
    },

    /// No table with this identity is registered.
    #[error("table not found: {definition}")]
    TableNotFound {
        /// Identity of the table.
        definition: TableDefinition,
    },

    /// The table is not bound to a database.
    #[error("table cannot be saved: it does not belong to a database")]
    TableCannotBeSaved,

    /// Reading, decrypting or parsing failed while opening a database.
    #[error("failed to open database {name}: {source}")]
    Open {
        /// Name of the database.
        name: String,
        /// The underlying failure.
        #[source]
        source: Box<CoreError>,
    },

    /// Writing failed while saving a database or table.
    #[error("failed to save {target}: {source}")]
    Save {
        /// Database name or entry name being saved.
        target: String,
        /// The underlying failure.
        #[source]
        source: Box<CoreError>,
    },

    /// Ciphertext could not be decrypted.
    #[error("decryption failed: {message}")]
    Decryption {
        /// Description of the failure.
        message: String,
    },

    /// Persisted content does not have the expected shape.
    #[error("invalid format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// A manifest or call names a schema that was never registered.
    #[error("unknown schema: {schema}")]
    UnknownSchema {
        /// The schema identity.
        schema: String,
    },

    /// A schema identity is claimed by two different record types.
    #[error("schema {schema} is registered for a different record type")]
    SchemaConflict {
        /// The schema identity.
        schema: String,
    },

    /// A database, table or schema name is not usable.
    #[error("invalid name {name:?}: {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why the name was rejected.
        reason: &'static str,
    },
}

impl CoreError {
    /// Wraps `source` as a failure to open database `name`.
    pub fn open(name: impl Into<String>, source: CoreError) -> Self {
        Self::Open {
            name: name.into(),
            source: Box::new(source),
        }
    }

    /// Wraps `source` as a failure to save `target`.
    ///
    /// Errors that already describe a save, and the unbound-table
    /// precondition, are returned unchanged.
    pub fn save(target: impl Into<String>, source: CoreError) -> Self {
        match source {
            Self::Save { .. } | Self::TableCannotBeSaved => source,
            other => Self::Save {
                target: target.into(),
                source: Box::new(other),
            },
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates a decryption failed error.
    pub fn decryption_failed(message: impl Into<String>) -> Self {
        Self::Decryption {
            message: message.into(),
        }
    }

    /// Creates an invalid name error.
    pub fn invalid_name(name: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason,
        }
    }

    /// Returns the error wrapped by [`CoreError::Open`] or
    /// [`CoreError::Save`], or `self` for any other variant.
    #[must_use]
    pub fn cause(&self) -> &CoreError {
        match self {
            Self::Open { source, .. } | Self::Save { source, .. } => source.cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn open_keeps_source() {
        let err = CoreError::open("Data", CoreError::decryption_failed("bad padding"));
        assert!(err.to_string().contains("Data"));
        assert!(err.source().is_some());
        assert!(matches!(err.cause(), CoreError::Decryption { .. }));
    }

    #[test]
    fn save_does_not_double_wrap() {
        let inner = CoreError::save("Data", CoreError::invalid_format("x"));
        let outer = CoreError::save("Data", inner);
        match outer {
            CoreError::Save { source, .. } => {
                assert!(matches!(*source, CoreError::InvalidFormat { .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn save_passes_unbound_table_through() {
        let err = CoreError::save("x", CoreError::TableCannotBeSaved);
        assert!(matches!(err, CoreError::TableCannotBeSaved));
    }
}
