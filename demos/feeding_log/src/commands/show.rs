//! `show` command.

use crate::app::{AppResult, FeedingLog};
use chrono::Local;

/// Prints the profile and the feedings of the last `days` days.
pub fn run(log: &mut FeedingLog, days: usize) -> AppResult<()> {
    if let Some(profile) = log.profile()? {
        let age = Local::now().date_naive().signed_duration_since(profile.birth_date);
        println!("{} ({} days old)", profile.name, age.num_days());
    }

    let rows = log.days(days)?;
    if rows.is_empty() {
        println!("No feedings recorded");
        return Ok(());
    }

    for row in rows {
        let Some(day) = row.day() else { continue };
        let times: Vec<String> = row
            .times
            .iter()
            .map(|t| t.with_timezone(&Local).format("%H:%M").to_string())
            .collect();
        println!("{day}  {:>2}x  {}", times.len(), times.join(" "));
    }
    Ok(())
}
