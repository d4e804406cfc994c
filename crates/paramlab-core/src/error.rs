//! Error types for loading configuration documents and resolving parameters.
//!
//! Load errors are fatal on startup and recoverable on reload: a failed
//! reload reports the error and leaves the previous configuration active.
//! Lookup errors always carry the identifier that was not found.
//!
//! Inconsistencies found while merging a task override are not errors of
//! this module; they are collected per parameter as
//! [`ConfigInconsistency`](crate::ConfigInconsistency) values.

use std::io;

use crate::models::ModelRole;
use crate::param::{ParamValue, SpecViolation, Stage, ValueType};

/// Result type alias for resolver operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The parameter catalog document could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum CatalogLoadError {
    #[error("failed to read parameter catalog from {origin}")]
    Io {
        origin: String,
        #[source]
        error: io::Error,
    },
    #[error("parameter catalog {origin} is not valid JSON of the expected shape")]
    Malformed {
        origin: String,
        #[source]
        error: serde_json::Error,
    },
    #[error("parameter catalog declares unknown stage '{stage}'")]
    UnknownStage { stage: String },
    #[error("parameter catalog declares stage '{stage}' more than once")]
    DuplicateStage { stage: Stage },
    #[error("parameter '{parameter}' in stage '{stage}' is malformed")]
    MalformedParameter {
        stage: Stage,
        parameter: String,
        #[source]
        error: serde_json::Error,
    },
    #[error("parameter '{parameter}' in stage '{stage}' is invalid: {violation}")]
    InvalidParameter {
        stage: Stage,
        parameter: String,
        violation: SpecViolation,
    },
}

/// The task override document could not be loaded or does not match the
/// catalog and task registry it is applied to.
#[derive(Debug, thiserror::Error)]
pub enum OverrideLoadError {
    #[error("failed to read task overrides from {origin}")]
    Io {
        origin: String,
        #[source]
        error: io::Error,
    },
    #[error("task overrides {origin} are not valid JSON of the expected shape")]
    Malformed {
        origin: String,
        #[source]
        error: serde_json::Error,
    },
    #[error("overrides reference unknown task '{task}'")]
    UnknownTask { task: String },
    #[error("overrides for task '{task}' reference unknown stage '{stage}'")]
    UnknownStage { task: String, stage: String },
    #[error("overrides for task '{task}' declare stage '{stage}' more than once")]
    DuplicateStage { task: String, stage: Stage },
    #[error("overrides for task '{task}' reference unknown parameter '{stage}.{parameter}'")]
    UnknownParameter {
        task: String,
        stage: Stage,
        parameter: String,
    },
    #[error("override for '{stage}.{parameter}' of task '{task}' is malformed")]
    MalformedRecord {
        task: String,
        stage: Stage,
        parameter: String,
        #[source]
        error: serde_json::Error,
    },
}

/// The task registry document could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum RegistryLoadError {
    #[error("failed to read task registry from {origin}")]
    Io {
        origin: String,
        #[source]
        error: io::Error,
    },
    #[error("task registry {origin} is not valid JSON of the expected shape")]
    Malformed {
        origin: String,
        #[source]
        error: serde_json::Error,
    },
    #[error("task '{task}' is malformed")]
    MalformedTask {
        task: String,
        #[source]
        error: serde_json::Error,
    },
    #[error("task '{task}' lists unknown stage '{stage}'")]
    UnknownStage { task: String, stage: String },
    #[error("task '{task}' lists stage '{stage}' more than once")]
    DuplicateStage { task: String, stage: Stage },
    #[error("task '{task}' lists unknown model role '{role}'")]
    UnknownModelRole { task: String, role: String },
}

/// The model catalog document could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ModelCatalogLoadError {
    #[error("failed to read model catalog from {origin}")]
    Io {
        origin: String,
        #[source]
        error: io::Error,
    },
    #[error("model catalog {origin} is not valid JSON of the expected shape")]
    Malformed {
        origin: String,
        #[source]
        error: serde_json::Error,
    },
    #[error("model catalog declares unknown group '{group}'")]
    UnknownGroup { group: String },
    #[error("model '{model}' is listed under {expected} but declares role {found}")]
    RoleMismatch {
        model: String,
        expected: ModelRole,
        found: ModelRole,
    },
    #[error("model '{model}' is listed more than once for role {role}")]
    DuplicateModel { role: ModelRole, model: String },
}

/// The parameter documentation document could not be loaded or describes
/// parameters the catalog does not have.
#[derive(Debug, thiserror::Error)]
pub enum DocumentationLoadError {
    #[error("failed to read parameter documentation from {origin}")]
    Io {
        origin: String,
        #[source]
        error: io::Error,
    },
    #[error("parameter documentation {origin} is not valid JSON of the expected shape")]
    Malformed {
        origin: String,
        #[source]
        error: serde_json::Error,
    },
    #[error("parameter documentation declares unknown stage '{stage}'")]
    UnknownStage { stage: String },
    #[error("parameter documentation declares stage '{stage}' more than once")]
    DuplicateStage { stage: Stage },
    #[error("documentation of '{stage}.{parameter}' is malformed")]
    MalformedEntry {
        stage: Stage,
        parameter: String,
        #[source]
        error: serde_json::Error,
    },
    #[error("documentation references unknown parameter '{stage}.{parameter}'")]
    UnknownParameter { stage: Stage, parameter: String },
    #[error("documentation of '{stage}.{parameter}' describes options but the parameter has none")]
    OptionsWithoutChoices { stage: Stage, parameter: String },
    #[error("documentation of '{stage}.{parameter}' describes unknown option '{option}'")]
    UnknownOption {
        stage: Stage,
        parameter: String,
        option: String,
    },
}

/// Errors returned by the resolver and its registries.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    CatalogLoad(#[from] CatalogLoadError),
    #[error(transparent)]
    OverrideLoad(#[from] OverrideLoadError),
    #[error(transparent)]
    RegistryLoad(#[from] RegistryLoadError),
    #[error(transparent)]
    ModelCatalogLoad(#[from] ModelCatalogLoadError),
    #[error(transparent)]
    DocumentationLoad(#[from] DocumentationLoadError),

    #[error("unknown task '{task}'")]
    UnknownTask { task: String },
    #[error("unknown stage '{stage}'")]
    UnknownStage { stage: String },
    #[error("unknown parameter '{parameter}' in stage '{stage}'")]
    UnknownParameter { stage: Stage, parameter: String },
    #[error("unknown model role '{role}'")]
    UnknownModelRole { role: String },
    #[error("unknown {role} model '{model}'")]
    UnknownModel { role: ModelRole, model: String },
    #[error("no {role} models are available")]
    NoModelForRole { role: ModelRole },
    #[error("task '{task}' has no {role} model slot")]
    InapplicableModelRole { task: String, role: ModelRole },
    #[error("task '{task}' does not use stage '{stage}'")]
    InapplicableStage { task: String, stage: Stage },
    #[error("value {value} cannot be used as {expected} for '{stage}.{parameter}'")]
    InvalidValue {
        stage: Stage,
        parameter: String,
        expected: ValueType,
        value: ParamValue,
    },
    #[error("resolver was built without configuration sources and cannot reload")]
    NotReloadable,
    #[error("resolver is closed")]
    Closed,
}

impl Error {
    /// Returns `true` if the error reports a document that failed to load.
    #[must_use]
    pub const fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::CatalogLoad(_)
                | Self::OverrideLoad(_)
                | Self::RegistryLoad(_)
                | Self::ModelCatalogLoad(_)
                | Self::DocumentationLoad(_)
        )
    }

    /// Returns `true` if the error reports an identifier that does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UnknownTask { .. }
                | Self::UnknownStage { .. }
                | Self::UnknownParameter { .. }
                | Self::UnknownModelRole { .. }
                | Self::UnknownModel { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_identifier() {
        let error = Error::UnknownParameter {
            stage: Stage::Decoding,
            parameter: "top_q".into(),
        };
        assert_eq!(error.to_string(), "unknown parameter 'top_q' in stage 'decoding'");
        assert!(error.is_not_found());
        assert!(!error.is_load_error());
    }

    #[test]
    fn load_errors_convert_transparently() {
        let error: Error = OverrideLoadError::UnknownTask {
            task: "Translation".into(),
        }
        .into();
        assert!(error.is_load_error());
        assert_eq!(error.to_string(), "overrides reference unknown task 'Translation'");
    }
}
