//! Vault configuration
//!
//! The storage file path is the only required setting. UI collaborators can
//! hand over a JSON object (`{"dbPath": ..., "debug": true}`); missing keys
//! fall back to defaults. The CLI reads the same object from a file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::StoreOptions;
use crate::errors::{Result, VaultError};

/// Directory created under the user config dir
pub const APP_DIR: &str = "proompt-vault";

/// Store file name inside [`APP_DIR`]
pub const DB_FILE: &str = "prompts.db";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VaultConfig {
    /// Explicit store path; `None` means the platform default
    pub db_path:         Option<PathBuf>,
    pub debug:           bool,
    pub lock_timeout_ms: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            db_path:         None,
            debug:           false,
            lock_timeout_ms: 1000,
        }
    }
}

impl VaultConfig {
    /// Parse a config object, filling in defaults
    pub fn from_json(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value).map_err(|e| VaultError::Config(e.to_string()))
    }

    /// Read a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&raw)
            .map_err(|e| VaultError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(value)
    }

    /// Resolved store path
    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.db_path {
            Some(path) => Ok(path.clone()),
            None => default_db_path(),
        }
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            lock_timeout: Duration::from_millis(self.lock_timeout_ms),
        }
    }
}

/// `<config dir>/proompt-vault/prompts.db`
pub fn default_db_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| VaultError::Config("Could not determine user config directory".into()))?;
    Ok(config_dir.join(APP_DIR).join(DB_FILE))
}
