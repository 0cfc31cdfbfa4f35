//! Storage layer for repsync.
//!
//! This module provides SQLite-based persistence for:
//! - The on-device key-value store (active workout, workout history)
//! - The tables of the local backend stand-in

mod database;
mod kv;
mod migrations;

pub use database::Database;
pub use kv::{KeyValueStore, KvStore};
pub use migrations::Schema;
