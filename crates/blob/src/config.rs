use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Settings for the local blob store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for stored blobs. Created at startup if absent;
    /// failure to create it is a configuration error, not a
    /// request-time one.
    pub root: PathBuf,
}

impl StorageConfig {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}
