//! Application state and dependency injection.

mod config;
mod state;

pub use paramlab_core::{Error, Result};

pub use crate::service::config::ResolverConfig;
pub use crate::service::state::ServiceState;
