//! Command implementations for repsync.
//!
//! This module contains the implementation of all CLI commands.

mod library;
mod sync;
mod workout;

pub use library::{folder, routine};
pub use sync::{format_sync_report, SyncReport, SyncSession};
pub use workout::workout;

use crate::cli::args::OutputFormat;
use crate::config::{Config, Paths};
use crate::error::RepsyncError;

/// Everything a command needs from the environment.
pub struct Context {
    pub paths: Paths,
    pub config: Config,
    pub format: OutputFormat,
    /// `--user` if given, else the configured principal.
    pub principal: Option<String>,
}

impl Context {
    /// Resolve paths and config for the current user.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory is unknown or the config is invalid.
    pub fn load(format: OutputFormat, user: Option<String>) -> Result<Self, RepsyncError> {
        let paths = Paths::new()?;
        paths.ensure_dirs()?;
        let config = Config::load_from_path(&paths.config_file)?;
        let principal = user.or_else(|| config.backend.principal.clone());

        Ok(Self {
            paths,
            config,
            format,
            principal,
        })
    }
}
