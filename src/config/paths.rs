//! Path management for shadow-trail
//!
//! ## Path Resolution Order
//!
//! 1. `SHADOW_TRAIL_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/shadow-trail` or `~/.config/shadow-trail`
//! 3. Windows: `%APPDATA%\shadow-trail`

use std::path::PathBuf;

use crate::error::{ShadowError, ShadowResult};

/// Environment variable overriding the base directory
pub const DIR_ENV_VAR: &str = "SHADOW_TRAIL_DIR";

/// Manages all paths used by shadow-trail
#[derive(Debug, Clone)]
pub struct ShadowPaths {
    base_dir: PathBuf,
}

impl ShadowPaths {
    /// Resolve the base directory from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> ShadowResult<Self> {
        let base_dir = if let Ok(custom) = std::env::var(DIR_ENV_VAR) {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Use an explicit base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory (~/.config/shadow-trail/data/)
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Directory holding one JSONL file per shadow table
    pub fn tables_dir(&self) -> PathBuf {
        self.data_dir().join("tables")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to records.json
    pub fn records_file(&self) -> PathBuf {
        self.data_dir().join("records.json")
    }

    /// Path of the JSONL file backing a shadow table
    pub fn table_file(&self, table: &str) -> PathBuf {
        self.tables_dir().join(format!("{}.jsonl", table))
    }

    /// Ensure the base, data and tables directories exist
    pub fn ensure_directories(&self) -> ShadowResult<()> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| ShadowError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.tables_dir())
            .map_err(|e| ShadowError::Io(format!("Failed to create data directory: {}", e)))?;

        Ok(())
    }

    /// Check if a settings file has been written
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

#[cfg(not(windows))]
fn resolve_default_path() -> ShadowResult<PathBuf> {
    let config_base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => {
            let home = std::env::var("HOME")
                .map_err(|_| ShadowError::Config("HOME environment variable not set".into()))?;
            PathBuf::from(home).join(".config")
        }
    };
    Ok(config_base.join("shadow-trail"))
}

#[cfg(windows)]
fn resolve_default_path() -> ShadowResult<PathBuf> {
    let appdata = std::env::var("APPDATA")
        .map_err(|_| ShadowError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("shadow-trail"))
}
