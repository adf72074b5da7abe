//! Record trait for typed tables.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Trait for types that can be stored as rows of a Tabula table.
///
/// The engine needs two things from a record type: a structured textual
/// form (any `serde` implementation) and a schema identity naming the
/// record's shape in manifests and entry names.
///
/// # Example
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use tabula_core::Record;
///
/// #[derive(Serialize, Deserialize)]
/// struct Feeding {
///     times: Vec<String>,
/// }
///
/// impl Record for Feeding {
///     const SCHEMA: &'static str = "sanitabit.feeding";
/// }
/// ```
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The schema identity.
    ///
    /// Must be unique among the record types registered with one catalog
    /// and must not change once databases have been written with it.
    const SCHEMA: &'static str;
}
