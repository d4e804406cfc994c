//! Configuration reload response types.

use jiff::Timestamp;
use paramlab_core::Snapshot;
use serde::{Deserialize, Serialize};

/// Which documents a reload re-read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloadScope {
    /// Parameter catalog and task overrides.
    All,
    /// Task overrides only.
    Overrides,
}

/// Summary of the snapshot a successful reload installed.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReloadResponse {
    pub scope: ReloadScope,
    pub generation: u64,
    pub loaded_at: Timestamp,
    /// Parameters across every stage of the catalog.
    pub parameters: usize,
    /// Override records across every task.
    pub overrides: usize,
}

impl ReloadResponse {
    pub fn new(scope: ReloadScope, snapshot: &Snapshot) -> Self {
        Self {
            scope,
            generation: snapshot.generation(),
            loaded_at: snapshot.loaded_at(),
            parameters: snapshot.catalog().len(),
            overrides: snapshot.overrides().len(),
        }
    }
}
