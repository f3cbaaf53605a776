//! Runtime configuration.
//!
//! Read from `<config_dir>/privacy-manager/config.json` when present,
//! otherwise defaults. `PRIVACY_MANAGER_DB` overrides the database path.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::Result;
use crate::state::loader::RowPolicy;

const APP_DIR: &str = "privacy-manager";
const DB_FILE: &str = "privacy_manager.db";
const CONFIG_FILE: &str = "config.json";

pub const DB_PATH_ENV: &str = "PRIVACY_MANAGER_DB";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_path: PathBuf,
    /// JSON file of setting definitions
    pub settings_catalog: Option<PathBuf>,
    /// Handling of rows whose icon or columns fail to decode
    pub corrupt_rows: RowPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_db_path(),
            settings_catalog: None,
            corrupt_rows: RowPolicy::Abort,
        }
    }
}

impl Config {
    /// Load the user's config file (if any) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match config_file_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };

        if let Some(path) = std::env::var_os(DB_PATH_ENV) {
            config.database_path = PathBuf::from(path);
        }

        debug!(database = %config.database_path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Get the path where the database should be stored
///
/// - Linux: ~/.local/share/privacy-manager/privacy_manager.db
/// - macOS: ~/Library/Application Support/privacy-manager/privacy_manager.db
/// - Windows: %APPDATA%\privacy-manager\privacy_manager.db
pub fn default_db_path() -> PathBuf {
    let mut path = dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."));

    path.push(APP_DIR);
    path.push(DB_FILE);
    path
}

fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}
