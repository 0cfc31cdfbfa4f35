//! repsync - offline-first workout routines
//!
//! This crate keeps a local, optimistic view of workout folders and routines
//! and replays every change against a remote data service in order, and
//! tracks the live workout with crash-safe, debounced persistence.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod features;
pub mod library;
pub mod output;
pub mod storage;

pub use cli::args::{Cli, Commands, OutputFormat};
pub use error::RepsyncError;
pub use features::sync::SyncEngine;
pub use features::workout::WorkoutTracker;
