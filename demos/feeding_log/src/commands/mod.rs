//! Command implementations.

pub mod feed;
pub mod profile;
pub mod reset;
pub mod show;
