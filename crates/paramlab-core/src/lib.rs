#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for parameter catalog loading.
pub const TRACING_TARGET_CATALOG: &str = "paramlab_core::catalog";

/// Tracing target for task override loading.
pub const TRACING_TARGET_OVERRIDES: &str = "paramlab_core::overrides";

/// Tracing target for task registry loading.
pub const TRACING_TARGET_REGISTRY: &str = "paramlab_core::registry";

/// Tracing target for model catalog loading.
pub const TRACING_TARGET_MODELS: &str = "paramlab_core::models";

/// Tracing target for parameter documentation loading.
pub const TRACING_TARGET_DOCUMENTATION: &str = "paramlab_core::documentation";

/// Tracing target for resolution, reloads and pipeline requests.
pub const TRACING_TARGET_RESOLVER: &str = "paramlab_core::resolver";

mod catalog;
mod documentation;
mod error;
mod models;
mod overrides;
mod registry;
mod resolver;
mod source;

pub mod param;
pub mod prelude;

pub use catalog::ParameterCatalog;
pub use documentation::{OptionDoc, ParameterDoc, ParameterDocs};
pub use error::{
    CatalogLoadError, DocumentationLoadError, Error, ModelCatalogLoadError, OverrideLoadError,
    RegistryLoadError, Result,
};
pub use models::{ModelCatalog, ModelDescriptor, ModelRole};
pub use overrides::{OverrideRecord, TaskOverrideTable};
pub use registry::{DEFAULT_TASK_ICON, TaskDescriptor, TaskRegistry};
pub use resolver::{
    ConfigInconsistency, ConfigResolver, ModelChoices, ParameterValues, PipelineEdits,
    PipelineRequest, ResolvedParameter, Snapshot, StageResolution, TaskResolution,
};
pub use source::{
    ConfigSources, DOCUMENTATION_FILE, DocumentSource, MODELS_FILE, OVERRIDES_FILE,
    PARAMETERS_FILE, TASKS_FILE,
};
