//! `reset` command.

use crate::app::{AppResult, FeedingLog};
use tracing::info;

/// Deletes the log and starts over.
pub fn run(log: &mut FeedingLog, confirmed: bool) -> AppResult<()> {
    if !confirmed {
        println!("This deletes the profile and every feeding. Re-run with --yes to confirm.");
        return Ok(());
    }

    let removed = log.reset()?;
    info!(entries = removed, "log reset");
    println!("✓ Log reset ({removed} entries removed)");
    Ok(())
}
