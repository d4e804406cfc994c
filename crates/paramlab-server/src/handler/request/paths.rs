//! Path parameter types for HTTP handlers.
//!
//! Stages and roles are kept as strings here and parsed by the handlers, so
//! an unknown name answers 404 like an unknown task does.

use serde::{Deserialize, Serialize};

/// Path parameters for task-level operations.
#[must_use]
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskPathParams {
    /// Registered task name, e.g. `RAG-based QA`.
    pub task: String,
}

/// Path parameters for one stage of a task.
#[must_use]
#[derive(Debug, Serialize, Deserialize)]
pub struct StagePathParams {
    pub task: String,
    /// Stage name; the legacy `*_parameters` spellings are accepted.
    pub stage: String,
}

/// Path parameters for one parameter of a stage.
#[must_use]
#[derive(Debug, Serialize, Deserialize)]
pub struct ParameterPathParams {
    pub task: String,
    pub stage: String,
    pub parameter: String,
}

/// Path parameters for model listings.
#[must_use]
#[derive(Debug, Serialize, Deserialize)]
pub struct RolePathParams {
    /// `encoder`, `decoder` or `encoder_decoder`.
    pub role: String,
}
