//! Response types for HTTP handlers.

mod error_response;
mod monitors;
mod reloads;

pub use error_response::ErrorResponse;
pub use monitors::HealthResponse;
pub use reloads::{ReloadResponse, ReloadScope};
