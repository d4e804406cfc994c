//! HTTP server startup with graceful shutdown.

mod error;
mod http_server;

pub use error::{Result, ServerError};
pub use http_server::serve_http;
