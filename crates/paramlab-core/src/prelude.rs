//! Convenient re-exports for common use.

pub use crate::error::{Error, Result};
pub use crate::models::ModelRole;
pub use crate::param::{ParamValue, Stage, ValueType, WidgetKind};
pub use crate::resolver::{
    ConfigResolver, PipelineEdits, ResolvedParameter, StageResolution, TaskResolution,
};
pub use crate::source::ConfigSources;
