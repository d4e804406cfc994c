//! Health response types.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Health of the service and the configuration it currently serves.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `false` once the resolver has been closed for shutdown.
    pub is_healthy: bool,
    /// Generation of the active configuration snapshot, starting at 1.
    pub generation: u64,
    /// When the active snapshot was loaded.
    pub loaded_at: Timestamp,
    /// Whether `POST /config/reload` can re-read the documents.
    pub reloadable: bool,
    pub updated_at: Timestamp,
}
