//! Runtime settings for the binary: where the SQLite file lives and how
//! chatty logging should be.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use directories::BaseDirs;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".lunchly";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "lunchly.sqlite";

/// Environment variable naming the SQLite file.
pub const DATABASE_ENV: &str = "LUNCHLY_DATABASE";
/// Environment variable holding the default log filter.
pub const LOG_ENV: &str = "LUNCHLY_LOG";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Settings resolved at start-up.
pub struct Config {
    /// SQLite file opened by the binary.
    pub database_path: PathBuf,
    /// Fallback `tracing` filter, used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Config {
    /// Resolve settings from the process environment after loading `.env` if
    /// one exists. `database_override` (the `--database` flag) wins over
    /// everything else.
    pub fn load(database_override: Option<PathBuf>) -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::resolve(database_override, |key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`] with the environment supplied by `lookup`.
    pub fn resolve<F>(database_override: Option<PathBuf>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = match database_override {
            Some(path) => path,
            None => match lookup(DATABASE_ENV).filter(|value| !value.is_empty()) {
                Some(path) => PathBuf::from(path),
                None => default_db_path()?,
            },
        };

        let log_filter = lookup(LOG_ENV)
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            database_path,
            log_filter,
        })
    }
}

/// Resolve the absolute path to the SQLite database inside the user's home.
fn default_db_path() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME).join(DB_FILE_NAME))
}
