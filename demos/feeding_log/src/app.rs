//! The feeding log database: opening, recovery and the operations the
//! commands need.

use crate::records::{Feeding, Profile, FEEDING_TABLE, PROFILE_TABLE};
use chrono::{DateTime, Local, NaiveDate, Utc};
use std::path::Path;
use std::sync::Arc;
use tabula_core::{Catalog, Config, CoreError, Database, LoadMode};
use tabula_storage::{DirectoryStore, StorageError};
use thiserror::Error;
use tracing::{info, warn};

/// Name of the database inside the data directory.
pub const DATABASE_NAME: &str = "Data";

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("invalid date {input:?}: {source}")]
    InvalidDate {
        input: String,
        source: chrono::ParseError,
    },
}

/// An open feeding log.
pub struct FeedingLog {
    catalog: Catalog,
    password: String,
    db: Database,
}

impl FeedingLog {
    /// Opens the log in `dir`, creating it on first use.
    ///
    /// A database that exists but cannot be opened is treated as corrupt:
    /// it is deleted and replaced by an empty one.
    pub fn open(dir: &Path, password: &str, config: Config) -> AppResult<Self> {
        let store = Arc::new(DirectoryStore::open(dir)?);
        let mut catalog = Catalog::new(store, config);
        catalog.register::<Profile>()?;
        catalog.register::<Feeding>()?;

        let (db, created) = if catalog.exists(DATABASE_NAME)? {
            match catalog.open(DATABASE_NAME, password, LoadMode::Eager) {
                Ok(db) => (db, false),
                Err(err @ CoreError::Open { .. }) => {
                    warn!(error = %err, "database unreadable, starting over");
                    catalog.delete(DATABASE_NAME)?;
                    (catalog.create(DATABASE_NAME, password)?, true)
                }
                Err(err) => return Err(err.into()),
            }
        } else {
            info!(dir = %dir.display(), "creating new feeding log");
            (catalog.create(DATABASE_NAME, password)?, true)
        };

        let mut log = Self {
            catalog,
            password: password.to_string(),
            db,
        };
        log.ensure_tables()?;
        if created {
            // Table saves don't write the manifest.
            log.db.save()?;
        }
        Ok(log)
    }

    fn ensure_tables(&mut self) -> AppResult<()> {
        if !self.db.has_table::<Profile>(PROFILE_TABLE) {
            self.db.create_table::<Profile>(PROFILE_TABLE)?;
        }
        if !self.db.has_table::<Feeding>(FEEDING_TABLE) {
            self.db.create_table::<Feeding>(FEEDING_TABLE)?;
        }
        Ok(())
    }

    /// Returns the stored profile.
    pub fn profile(&mut self) -> AppResult<Option<Profile>> {
        Ok(self.db.table::<Profile>(PROFILE_TABLE)?.first().cloned())
    }

    /// Replaces the profile and saves it.
    pub fn set_profile(&mut self, name: &str, birth_date: &str) -> AppResult<Profile> {
        let birth_date = parse_date(birth_date)?;
        let profile = Profile {
            name: name.to_string(),
            birth_date,
        };

        let table = self.db.table::<Profile>(PROFILE_TABLE)?;
        table.clear();
        table.push(profile.clone());
        table.save()?;
        Ok(profile)
    }

    /// Records a feeding at `at`, appending to that day's row, and saves.
    pub fn record_feeding(&mut self, at: DateTime<Utc>) -> AppResult<()> {
        let day = at.with_timezone(&Local).date_naive();
        let table = self.db.table::<Feeding>(FEEDING_TABLE)?;

        let same_day = table.last().is_some_and(|row| row.day() == Some(day));
        match table.len().checked_sub(1).filter(|_| same_day) {
            Some(index) => {
                if let Some(mut row) = table.get_mut(index) {
                    row.times.push(at);
                    row.times.sort();
                }
            }
            None => table.push(Feeding::starting_at(at)),
        }

        self.db.save()?;
        Ok(())
    }

    /// Returns the last `limit` days, oldest first.
    pub fn days(&mut self, limit: usize) -> AppResult<Vec<Feeding>> {
        let table = self.db.table::<Feeding>(FEEDING_TABLE)?;
        let skip = table.len().saturating_sub(limit);
        Ok(table.iter().skip(skip).cloned().collect())
    }

    /// Deletes everything and starts an empty log.
    pub fn reset(&mut self) -> AppResult<usize> {
        let removed = self.catalog.delete(DATABASE_NAME)?;
        self.db = self.catalog.create(DATABASE_NAME, &self.password)?;
        self.ensure_tables()?;
        self.db.save()?;
        Ok(removed)
    }

    pub fn is_encrypted(&self) -> bool {
        self.db.is_encrypted()
    }
}

fn parse_date(input: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|source| AppError::InvalidDate {
        input: input.to_string(),
        source,
    })
}
