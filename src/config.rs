//! Runtime settings.
//!
//! Constructed explicitly and passed down; there is no process-wide
//! singleton. The CLI's `--db` flag wins over the environment.

use std::env;
use std::path::PathBuf;

/// Environment variable overriding the database path.
pub const DB_PATH_ENV: &str = "TT_DB_PATH";

/// Default database file, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "tasks.db";

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Path of the SQLite database file.
    pub db_path: PathBuf,
}

impl Settings {
    /// Resolve settings from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let db_path = env::var_os(DB_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));
        Self { db_path }
    }

    /// Settings with an explicit database path.
    pub fn with_db_path(db_path: PathBuf) -> Self {
        Self { db_path }
    }
}
