#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod extract;
pub mod handler;
pub mod middleware;
pub mod service;

pub use crate::handler::{Error, ErrorKind, Result};

/// Tracing target for request handlers.
pub const TRACING_TARGET_HANDLER: &str = "paramlab_server::handler";

/// Tracing target for configuration reloads triggered over HTTP.
pub const TRACING_TARGET_RELOAD: &str = "paramlab_server::reload";

/// Error recovery including middleware errors and request failures.
pub const TRACING_TARGET_RECOVERY_ERROR: &str = "paramlab_server::recovery::error";

/// Panic recovery including handler panics and service failures.
pub const TRACING_TARGET_RECOVERY_PANIC: &str = "paramlab_server::recovery::panic";
