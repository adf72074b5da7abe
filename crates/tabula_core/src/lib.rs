//! # Tabula Core
//!
//! Embedded object-table store for Tabula.
//!
//! This crate provides:
//! - A [`Catalog`] creating, opening and deleting named databases in a host
//!   byte-store
//! - [`Database`]s holding typed tables, eagerly or lazily loaded
//! - [`Table<T>`], an ordered record sequence with change notifications
//! - Optional password protection of every persisted entry
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use serde::{Deserialize, Serialize};
//! use tabula_core::{Catalog, Config, LoadMode, Record};
//! use tabula_storage::InMemoryStore;
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Profile {
//!     name: String,
//! }
//!
//! impl Record for Profile {
//!     const SCHEMA: &'static str = "demo.profile";
//! }
//!
//! let mut catalog = Catalog::new(Arc::new(InMemoryStore::new()), Config::default());
//! catalog.register::<Profile>().unwrap();
//!
//! let mut db = catalog.create("Data", "hunter2").unwrap();
//! db.create_table::<Profile>("login")
//!     .unwrap()
//!     .push(Profile { name: "Ada".into() });
//! db.save().unwrap();
//!
//! let mut db = catalog.open("Data", "hunter2", LoadMode::Lazy).unwrap();
//! assert_eq!(db.table::<Profile>("login").unwrap()[0].name, "Ada");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
mod config;
pub mod crypto;
mod database;
mod definition;
mod error;
mod manifest;
pub mod naming;
mod registry;
mod save;
mod table;

pub use catalog::Catalog;
pub use config::{Config, LoadMode, DEFAULT_KDF_ROUNDS};
pub use database::Database;
pub use definition::TableDefinition;
pub use error::{CoreError, CoreResult};
pub use manifest::{Manifest, LINE_SEPARATOR};
pub use registry::SchemaRegistry;
pub use save::SaveResult;
pub use table::{BatchChange, Record, RecordMut, Table, TableChange};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
