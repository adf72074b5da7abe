//! Record types stored by the feeding log.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tabula_core::Record;

/// Table holding the single child profile.
pub const PROFILE_TABLE: &str = "login";
/// Table holding one feeding row per day.
pub const FEEDING_TABLE: &str = "UserData";

/// The child the log is kept for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub birth_date: NaiveDate,
}

impl Record for Profile {
    const SCHEMA: &'static str = "sanitabit.profile";
}

/// Feeding times of one local calendar day, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feeding {
    pub times: Vec<DateTime<Utc>>,
}

impl Record for Feeding {
    const SCHEMA: &'static str = "sanitabit.feeding";
}

impl Feeding {
    pub fn starting_at(time: DateTime<Utc>) -> Self {
        Self { times: vec![time] }
    }

    /// The local date of the first feeding, if any.
    pub fn day(&self) -> Option<NaiveDate> {
        self.times
            .first()
            .map(|time| time.with_timezone(&Local).date_naive())
    }
}
