//! # Tabula Testkit
//!
//! Test utilities for Tabula.
//!
//! This crate provides:
//! - Test fixtures: record types, catalog helpers and scenarios
//! - Instrumented host stores that log every call
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tabula_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_catalog() {
//!     with_temp_catalog(|catalog| {
//!         let mut db = catalog.create("Data", "secret").unwrap();
//!         db.create_table::<Note>("").unwrap().push(note("hello"));
//!         db.save().unwrap();
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stores;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stores::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stores::*;
