//! Request types for HTTP handlers.

mod paths;
mod pipelines;

pub use paths::{ParameterPathParams, RolePathParams, StagePathParams, TaskPathParams};
pub use pipelines::PipelineBody;
