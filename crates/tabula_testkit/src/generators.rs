//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random records, names and passwords
//! that the engine accepts.

use crate::fixtures::{Feeding, Note, Profile};
use proptest::prelude::*;

/// Strategy for generating valid database names.
pub fn database_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z][A-Za-z0-9_-]{0,15}").expect("Invalid regex")
}

/// Strategy for generating valid table names, including the empty name.
pub fn table_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        1 => Just(String::new()),
        4 => prop::string::string_regex("[A-Za-z][A-Za-z0-9 _]{0,15}").expect("Invalid regex"),
    ]
}

/// Strategy for generating passwords, including the empty password.
pub fn password_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        1 => Just(String::new()),
        3 => "\\PC{1,24}",
    ]
}

/// Strategy for generating profiles.
pub fn profile_strategy() -> impl Strategy<Value = Profile> {
    (
        "\\PC{0,32}",
        (2000u32..2100, 1u32..=12, 1u32..=28),
    )
        .prop_map(|(name, (y, m, d))| Profile {
            name,
            birth_date: format!("{y:04}-{m:02}-{d:02}"),
        })
}

/// Strategy for generating feeding rows.
pub fn feeding_strategy() -> impl Strategy<Value = Feeding> {
    prop::collection::vec(any::<i64>(), 0..8).prop_map(|times| Feeding { times })
}

/// Strategy for generating notes with arbitrary text, line breaks included.
pub fn note_strategy() -> impl Strategy<Value = Note> {
    any::<String>().prop_map(|text| Note { text })
}

/// Contents of a feeding-log database.
#[derive(Debug, Clone)]
pub struct FeedingLogContents {
    /// Rows of table `login`.
    pub profiles: Vec<Profile>,
    /// Rows of table `UserData`.
    pub feedings: Vec<Feeding>,
    /// Rows of the unnamed note table.
    pub notes: Vec<Note>,
}

/// Strategy for generating whole database contents.
pub fn contents_strategy() -> impl Strategy<Value = FeedingLogContents> {
    (
        prop::collection::vec(profile_strategy(), 0..3),
        prop::collection::vec(feeding_strategy(), 0..16),
        prop::collection::vec(note_strategy(), 0..4),
    )
        .prop_map(|(profiles, feedings, notes)| FeedingLogContents {
            profiles,
            feedings,
            notes,
        })
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
