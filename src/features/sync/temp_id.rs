//! Temporary identifiers for entities the backend has not acknowledged yet.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix that distinguishes a temporary id from any real backend id.
pub const TEMP_ID_PREFIX: &str = "temp_";

/// A locally minted placeholder id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TempId(String);

impl TempId {
    /// Mint a new process-unique temporary id.
    #[must_use]
    pub fn mint() -> Self {
        Self(format!("{TEMP_ID_PREFIX}{}", Uuid::new_v4().simple()))
    }

    /// Wrap an existing string if it carries the temporary prefix.
    #[must_use]
    pub fn parse(id: &str) -> Option<Self> {
        is_temp_id(id).then(|| Self(id.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TempId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TempId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Whether `id` is a temporary id rather than a real one.
#[must_use]
pub fn is_temp_id(id: &str) -> bool {
    id.starts_with(TEMP_ID_PREFIX)
}
