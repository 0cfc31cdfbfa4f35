//! Configuration management for repsync.
//!
//! This module handles loading configuration from `~/.repsync/`.

mod paths;
mod settings;

pub use paths::Paths;
pub use settings::{BackendConfig, Config, SessionConfig, SyncConfig};
