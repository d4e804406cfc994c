//! Resolved parameter views handed to presentation layers.

use derive_more::Deref;
use serde::ser::{Serialize, SerializeStruct, Serializer};

use super::ParameterValues;
use crate::documentation::ParameterDoc;
use crate::param::{ParameterSpec, SpecField, SpecViolation, Stage};
use crate::registry::TaskDescriptor;

/// A task override that leaves one parameter in an invalid state.
///
/// Inconsistencies never abort a resolution. They are attached to the
/// affected [`ResolvedParameter`] while the rest of the stage resolves.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("parameter '{stage}.{parameter}' of task '{task}': {violation}")]
pub struct ConfigInconsistency {
    pub task: String,
    pub stage: Stage,
    pub parameter: String,
    pub violation: SpecViolation,
}

impl ConfigInconsistency {
    /// Returns the stable snake_case name of the broken rule.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.violation.kind()
    }
}

impl Serialize for ConfigInconsistency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ConfigInconsistency", 5)?;
        state.serialize_field("task", &self.task)?;
        state.serialize_field("stage", &self.stage)?;
        state.serialize_field("parameter", &self.parameter)?;
        state.serialize_field("kind", self.kind())?;
        state.serialize_field("message", &self.violation.to_string())?;
        state.end()
    }
}

/// A catalog parameter with its task override applied.
///
/// Dereferences to the merged [`ParameterSpec`]. Carries the parameter's
/// documentation when the loaded configuration has any.
#[derive(Debug, Clone, PartialEq, Deref, serde::Serialize)]
pub struct ResolvedParameter {
    #[deref]
    #[serde(flatten)]
    spec: ParameterSpec,
    overridden: Vec<SpecField>,
    issues: Vec<ConfigInconsistency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    documentation: Option<ParameterDoc>,
}

impl ResolvedParameter {
    pub(crate) fn new(
        spec: ParameterSpec,
        overridden: Vec<SpecField>,
        issues: Vec<ConfigInconsistency>,
    ) -> Self {
        Self {
            spec,
            overridden,
            issues,
            documentation: None,
        }
    }

    pub(crate) fn with_documentation(mut self, documentation: Option<ParameterDoc>) -> Self {
        self.documentation = documentation;
        self
    }

    /// Wraps a catalog parameter that has no override.
    pub(crate) fn unchanged(spec: &ParameterSpec) -> Self {
        Self::new(spec.clone(), Vec::new(), Vec::new())
    }

    pub fn spec(&self) -> &ParameterSpec {
        &self.spec
    }

    pub fn into_spec(self) -> ParameterSpec {
        self.spec
    }

    /// Returns the fields the task override replaced, in field order.
    pub fn overridden(&self) -> &[SpecField] {
        &self.overridden
    }

    pub fn is_overridden(&self, field: SpecField) -> bool {
        self.overridden.contains(&field)
    }

    pub fn issues(&self) -> &[ConfigInconsistency] {
        &self.issues
    }

    pub fn documentation(&self) -> Option<&ParameterDoc> {
        self.documentation.as_ref()
    }

    /// Returns `true` if the merge broke no rule.
    pub fn is_consistent(&self) -> bool {
        self.issues.is_empty()
    }
}

/// The resolved parameters of one (task, stage) pair in catalog order.
#[derive(Debug, Clone, PartialEq)]
pub struct StageResolution {
    task: String,
    stage: Stage,
    parameters: Vec<ResolvedParameter>,
}

impl StageResolution {
    pub(crate) fn new(task: impl Into<String>, stage: Stage, parameters: Vec<ResolvedParameter>) -> Self {
        Self {
            task: task.into(),
            stage,
            parameters,
        }
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Returns the parameter called `name`.
    pub fn get(&self, name: &str) -> Option<&ResolvedParameter> {
        self.parameters.iter().find(|parameter| parameter.name() == name)
    }

    pub fn parameters(&self) -> &[ResolvedParameter] {
        &self.parameters
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResolvedParameter> {
        self.parameters.iter()
    }

    /// Returns the parameter names in catalog order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.parameters.iter().map(|parameter| parameter.name())
    }

    /// Returns every inconsistency of the stage.
    pub fn issues(&self) -> impl Iterator<Item = &ConfigInconsistency> + '_ {
        self.parameters.iter().flat_map(ResolvedParameter::issues)
    }

    /// Returns the number of parameters without inconsistencies.
    pub fn clean_count(&self) -> usize {
        self.parameters
            .iter()
            .filter(|parameter| parameter.is_consistent())
            .count()
    }

    /// Returns the number of parameters with at least one inconsistency.
    pub fn issue_count(&self) -> usize {
        self.parameters.len() - self.clean_count()
    }

    pub fn is_consistent(&self) -> bool {
        self.issue_count() == 0
    }

    /// Returns the resolved default of every parameter as a flat mapping.
    pub fn values(&self) -> ParameterValues {
        self.parameters
            .iter()
            .map(|parameter| (parameter.name().to_owned(), parameter.default_value()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

impl<'a> IntoIterator for &'a StageResolution {
    type IntoIter = std::slice::Iter<'a, ResolvedParameter>;
    type Item = &'a ResolvedParameter;

    fn into_iter(self) -> Self::IntoIter {
        self.parameters.iter()
    }
}

impl Serialize for StageResolution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("StageResolution", 5)?;
        state.serialize_field("task", &self.task)?;
        state.serialize_field("stage", &self.stage)?;
        state.serialize_field("parameters", &self.parameters)?;
        state.serialize_field("clean_count", &self.clean_count())?;
        state.serialize_field("issue_count", &self.issue_count())?;
        state.end()
    }
}

/// Every stage of one task, resolved against the same snapshot.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TaskResolution {
    pub task: TaskDescriptor,
    pub stages: Vec<StageResolution>,
}

impl TaskResolution {
    /// Returns the resolution of `stage` if the task uses it.
    pub fn stage(&self, stage: Stage) -> Option<&StageResolution> {
        self.stages.iter().find(|resolution| resolution.stage == stage)
    }

    pub fn issues(&self) -> impl Iterator<Item = &ConfigInconsistency> + '_ {
        self.stages.iter().flat_map(StageResolution::issues)
    }

    /// Returns the number of parameters with inconsistencies across stages.
    pub fn issue_count(&self) -> usize {
        self.stages.iter().map(StageResolution::issue_count).sum()
    }
}
