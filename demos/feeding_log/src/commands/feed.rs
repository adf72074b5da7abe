//! `feed` command.

use crate::app::{AppError, AppResult, FeedingLog};
use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};
use tracing::debug;

/// Records a feeding now, or today at `at` (`HH:MM`).
pub fn run(log: &mut FeedingLog, at: Option<&str>) -> AppResult<()> {
    let time = match at {
        Some(at) => today_at(at)?,
        None => Utc::now(),
    };
    debug!(%time, encrypted = log.is_encrypted(), "recording feeding");

    log.record_feeding(time)?;
    println!("✓ Feeding recorded at {}", time.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
    Ok(())
}

fn today_at(input: &str) -> AppResult<DateTime<Utc>> {
    let time = NaiveTime::parse_from_str(input, "%H:%M").map_err(|source| AppError::InvalidDate {
        input: input.to_string(),
        source,
    })?;
    let local = Local::now().date_naive().and_time(time);
    // Falls back to UTC for local times skipped by a DST change.
    Ok(Local
        .from_local_datetime(&local)
        .earliest()
        .map_or_else(|| Utc.from_utc_datetime(&local), |t| t.with_timezone(&Utc)))
}
