//! Feeding log
//!
//! A small baby-feeding diary kept in a password-protected Tabula database.
//!
//! Run with: cargo run -p feeding_log -- --password secret feed
//!
//! # Commands
//!
//! - `profile` - Show or set the child's name and birth date
//! - `feed` - Record a feeding, now or at a given time today
//! - `show` - Print recent feedings
//! - `reset` - Delete everything and start over

mod app;
mod commands;
mod records;

use app::FeedingLog;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tabula_core::Config;
use tracing_subscriber::EnvFilter;

/// Baby feeding diary.
#[derive(Parser)]
#[command(name = "feeding-log")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the database
    #[arg(global = true, short, long, default_value = "feeding_data")]
    dir: PathBuf,

    /// Database password; empty stores the log unencrypted
    #[arg(global = true, short, long, default_value = "")]
    password: String,

    /// Read and write the format of earlier releases
    #[arg(global = true, long)]
    legacy: bool,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the profile, or set it when NAME and BIRTH_DATE are given
    Profile {
        /// Child's name
        name: Option<String>,

        /// Birth date as YYYY-MM-DD
        birth_date: Option<String>,
    },

    /// Record a feeding
    Feed {
        /// Time today as HH:MM (default: now)
        #[arg(short, long)]
        at: Option<String>,
    },

    /// Print recent feedings
    Show {
        /// Number of days to show
        #[arg(short = 'n', long, default_value = "7")]
        days: usize,
    },

    /// Delete the profile and all feedings
    Reset {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Commands::Version = cli.command {
        println!("feeding-log v{}", env!("CARGO_PKG_VERSION"));
        println!("Tabula Core v{}", tabula_core::VERSION);
        return Ok(());
    }

    let config = if cli.legacy {
        Config::legacy()
    } else {
        Config::default()
    };
    let mut log = FeedingLog::open(&cli.dir, &cli.password, config)?;

    match cli.command {
        Commands::Profile { name, birth_date } => {
            commands::profile::run(&mut log, name.as_deref(), birth_date.as_deref())?;
        }
        Commands::Feed { at } => commands::feed::run(&mut log, at.as_deref())?,
        Commands::Show { days } => commands::show::run(&mut log, days)?,
        Commands::Reset { yes } => commands::reset::run(&mut log, yes)?,
        Commands::Version => {}
    }

    Ok(())
}
