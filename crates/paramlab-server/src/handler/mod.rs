//! All `axum::`[`Router`]s with related `axum::`[`Handler`]s.
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use paramlab_core::ConfigResolver;
//! use paramlab_server::handler::routes;
//! use paramlab_server::service::ServiceState;
//!
//! # fn example() -> paramlab_core::Result<()> {
//! let state = ServiceState::new(ConfigResolver::builtin()?);
//! let app: axum::Router = routes().with_state(state);
//! # Ok(())
//! # }
//! ```
//!
//! [`Router`]: axum::routing::Router
//! [`Handler`]: axum::handler::Handler

mod error;
mod models;
mod monitors;
mod pipelines;
mod reloads;
mod request;
mod response;
mod tasks;

use axum::Router;
use axum::response::{IntoResponse, Response};

pub use crate::handler::error::{Error, ErrorKind, Result};
pub use crate::handler::request::PipelineBody;
pub use crate::handler::response::{ErrorResponse, HealthResponse, ReloadResponse, ReloadScope};
use crate::service::ServiceState;

#[inline]
async fn handler() -> Response {
    ErrorKind::NotFound.into_response()
}

/// Returns a [`Router`] with every route and a 404 fallback.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .merge(monitors::routes())
        .merge(tasks::routes())
        .merge(pipelines::routes())
        .merge(models::routes())
        .merge(reloads::routes())
        .fallback(handler)
}
