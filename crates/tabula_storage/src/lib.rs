//! # Tabula Storage
//!
//! Host byte-store trait and implementations for Tabula.
//!
//! This crate provides the lowest-level storage abstraction for Tabula.
//! Stores are **opaque named-entry byte stores** - they do not interpret
//! the data they hold.
//!
//! ## Design Principles
//!
//! - Stores are flat namespaces of entries (exists, read, write, delete, list)
//! - No knowledge of manifests, tables, or encryption
//! - Must be `Send + Sync` so asynchronous saves can share them
//! - Tabula owns all content interpretation
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For testing and ephemeral databases
//! - [`DirectoryStore`] - One file per entry inside a directory
//!
//! ## Example
//!
//! ```rust
//! use tabula_storage::{EntryStore, InMemoryStore};
//!
//! let store = InMemoryStore::new();
//! store.write("notes", b"hello world").unwrap();
//! assert!(store.exists("notes").unwrap());
//! assert_eq!(store.read("notes").unwrap(), b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod directory;
mod error;
mod memory;

pub use backend::EntryStore;
pub use directory::DirectoryStore;
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryStore;
