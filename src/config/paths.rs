//! Path resolution for repsync configuration and data files.
//!
//! All repsync data is stored in `~/.repsync/`:
//! - `config.yaml` - Main configuration file
//! - `repsync.db` - Local key-value store (active workout, history)
//! - `backend.db` - Local stand-in for the remote data service

use std::path::PathBuf;

use crate::error::RepsyncError;

/// Paths to repsync configuration and data files.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Root directory: `~/.repsync/`
    pub root: PathBuf,
    /// Config file: `~/.repsync/config.yaml`
    pub config_file: PathBuf,
    /// Local store: `~/.repsync/repsync.db`
    pub database: PathBuf,
    /// Backend database: `~/.repsync/backend.db`
    pub backend_database: PathBuf,
}

impl Paths {
    /// Create paths based on the user's home directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, RepsyncError> {
        let home = std::env::var("HOME").map_err(|_| {
            RepsyncError::Config("Could not determine home directory".to_string())
        })?;

        Ok(Self::with_root(PathBuf::from(home).join(".repsync")))
    }

    /// Create paths with a custom root directory (useful for testing).
    #[must_use]
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            config_file: root.join("config.yaml"),
            database: root.join("repsync.db"),
            backend_database: root.join("backend.db"),
            root,
        }
    }

    /// Ensure the root directory exists.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub fn ensure_dirs(&self) -> Result<(), RepsyncError> {
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root).map_err(|e| {
                RepsyncError::Config(format!(
                    "Failed to create directory {}: {e}",
                    self.root.display()
                ))
            })?;
        }
        Ok(())
    }
}
