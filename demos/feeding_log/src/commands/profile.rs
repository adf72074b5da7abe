//! `profile` command.

use crate::app::{AppResult, FeedingLog};

/// Shows the profile, or replaces it when both fields are given.
pub fn run(log: &mut FeedingLog, name: Option<&str>, birth_date: Option<&str>) -> AppResult<()> {
    if let (Some(name), Some(birth_date)) = (name, birth_date) {
        let profile = log.set_profile(name, birth_date)?;
        println!("✓ Profile saved");
        println!("  Name: {}", profile.name);
        println!("  Born: {}", profile.birth_date);
        return Ok(());
    }

    match log.profile()? {
        Some(profile) => {
            println!("Name: {}", profile.name);
            println!("Born: {}", profile.birth_date);
        }
        None => println!("No profile yet. Set one with: feeding-log profile <NAME> <YYYY-MM-DD>"),
    }
    Ok(())
}
