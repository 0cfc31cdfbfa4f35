//! Remote data service boundary.
//!
//! [`RemoteStore`] is the async seam the sync engine writes through;
//! [`SqliteBackend`] implements it over a local database file.

mod sqlite;
mod store;

pub use sqlite::SqliteBackend;
#[cfg(test)]
pub use store::MockRemoteStore;
pub use store::{RemoteError, RemoteStore};
