//! Input contract of the pipeline orchestrator.
//!
//! The orchestrator receives one flat `name -> value` mapping per stage,
//! made of the task's resolved defaults overlaid with user edits, plus the
//! selected model name for every model slot of the task.

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::{Deserialize, Deserializer};
use strum::IntoEnumIterator;

use super::{ConfigInconsistency, ConfigResolver};
use crate::TRACING_TARGET_RESOLVER;
use crate::error::{Error, Result};
use crate::models::ModelRole;
use crate::param::{ParamValue, Stage};

/// Ordered `name -> value` mapping that serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterValues(Vec<(String, ParamValue)>);

impl ParameterValues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Sets `name` to `value`, keeping the position of an existing entry.
    pub fn set(&mut self, name: impl Into<String>, value: ParamValue) {
        let name = name.into();
        match self.0.iter_mut().find(|(key, _)| *key == name) {
            Some((_, current)) => *current = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> + '_ {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, ParamValue)> for ParameterValues {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (name, value) in iter {
            values.set(name, value);
        }
        values
    }
}

impl IntoIterator for ParameterValues {
    type IntoIter = std::vec::IntoIter<(String, ParamValue)>;
    type Item = (String, ParamValue);

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Serialize for ParameterValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ParameterValues {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        map.into_iter()
            .map(|(name, value)| {
                ParamValue::deserialize(value)
                    .map(|value| (name, value))
                    .map_err(serde::de::Error::custom)
            })
            .collect()
    }
}

/// User edits to the resolved defaults, grouped by stage.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineEdits {
    pub preprocessing: ParameterValues,
    pub encoding: ParameterValues,
    pub decoding: ParameterValues,
}

impl PipelineEdits {
    /// Returns the edits of `stage`.
    #[must_use]
    pub fn for_stage(&self, stage: Stage) -> &ParameterValues {
        match stage {
            Stage::Preprocessing => &self.preprocessing,
            Stage::Encoding => &self.encoding,
            Stage::Decoding => &self.decoding,
        }
    }

    fn for_stage_mut(&mut self, stage: Stage) -> &mut ParameterValues {
        match stage {
            Stage::Preprocessing => &mut self.preprocessing,
            Stage::Encoding => &mut self.encoding,
            Stage::Decoding => &mut self.decoding,
        }
    }

    /// Adds an edit.
    #[must_use]
    pub fn with_edit(
        mut self,
        stage: Stage,
        name: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Self {
        self.for_stage_mut(stage).set(name, value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        Stage::iter().all(|stage| self.for_stage(stage).is_empty())
    }
}

/// Model name chosen per role.
pub type ModelChoices = BTreeMap<ModelRole, String>;

/// Everything the orchestrator needs to run one pipeline invocation.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PipelineRequest {
    pub task: String,
    pub preprocessing: ParameterValues,
    pub encoding: ParameterValues,
    pub decoding: ParameterValues,
    /// Selected model name for every model slot of the task.
    pub models: ModelChoices,
    /// Inconsistencies of the resolved defaults the values were built on.
    pub issues: Vec<ConfigInconsistency>,
}

impl PipelineRequest {
    /// Returns the values of `stage`.
    #[must_use]
    pub fn stage(&self, stage: Stage) -> &ParameterValues {
        match stage {
            Stage::Preprocessing => &self.preprocessing,
            Stage::Encoding => &self.encoding,
            Stage::Decoding => &self.decoding,
        }
    }
}

impl ConfigResolver {
    /// Builds the orchestrator input for `task`.
    ///
    /// Each stage the task uses starts from its resolved defaults; every
    /// edit is cast to the parameter's value type and replaces the default.
    /// Stages the task does not use stay empty. Numeric edits are not
    /// range-checked.
    ///
    /// Every model slot of the task gets the chosen model, or the first
    /// model of its role when none was chosen.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownTask`] if the task is not registered.
    /// - [`Error::InapplicableStage`] for edits of a stage the task does not use.
    /// - [`Error::UnknownParameter`] for edits of a parameter missing from the stage.
    /// - [`Error::InvalidValue`] for edits that cannot be cast.
    /// - [`Error::InapplicableModelRole`] for choices of a role the task does not use.
    /// - [`Error::UnknownModel`] for a chosen model missing from its role.
    /// - [`Error::NoModelForRole`] if a slot has no choice and no model exists.
    pub fn pipeline_request(
        &self,
        task: &str,
        edits: &PipelineEdits,
        choices: &ModelChoices,
    ) -> Result<PipelineRequest> {
        let descriptor = self.registry().describe(task)?;
        let snapshot = self.snapshot();

        let mut stages = BTreeMap::new();
        let mut issues = Vec::new();
        for stage in Stage::iter() {
            let stage_edits = edits.for_stage(stage);
            if !descriptor.has_stage(stage) {
                if !stage_edits.is_empty() {
                    return Err(Error::InapplicableStage {
                        task: task.to_owned(),
                        stage,
                    });
                }
                stages.insert(stage, ParameterValues::new());
                continue;
            }

            let resolution = snapshot.resolve(task, stage);
            let mut values = resolution.values();
            for (name, value) in stage_edits.iter() {
                let parameter = resolution.get(name).ok_or_else(|| Error::UnknownParameter {
                    stage,
                    parameter: name.to_owned(),
                })?;
                let expected = parameter.value_type();
                let value = value.cast(expected).ok_or_else(|| Error::InvalidValue {
                    stage,
                    parameter: name.to_owned(),
                    expected,
                    value: value.clone(),
                })?;
                values.set(name, value);
            }

            issues.extend(resolution.issues().cloned());
            stages.insert(stage, values);
        }

        let models = self.select_models(task, &descriptor.model_slots, choices)?;

        tracing::debug!(
            target: TRACING_TARGET_RESOLVER,
            task = %task,
            generation = snapshot.generation(),
            models = models.len(),
            issues = issues.len(),
            "pipeline request built"
        );

        let mut take = |stage| stages.remove(&stage).unwrap_or_default();
        Ok(PipelineRequest {
            task: task.to_owned(),
            preprocessing: take(Stage::Preprocessing),
            encoding: take(Stage::Encoding),
            decoding: take(Stage::Decoding),
            models,
            issues,
        })
    }

    fn select_models(
        &self,
        task: &str,
        slots: &[ModelRole],
        choices: &ModelChoices,
    ) -> Result<ModelChoices> {
        if let Some(&role) = choices.keys().find(|role| !slots.contains(role)) {
            return Err(Error::InapplicableModelRole {
                task: task.to_owned(),
                role,
            });
        }

        let mut selected = ModelChoices::new();
        for &role in slots {
            let model = match choices.get(&role) {
                Some(name) => self
                    .models()
                    .get(role, name)
                    .ok_or_else(|| Error::UnknownModel {
                        role,
                        model: name.clone(),
                    })?,
                None => self
                    .models()
                    .default_for(role)
                    .ok_or(Error::NoModelForRole { role })?,
            };
            selected.insert(role, model.name.clone());
        }
        Ok(selected)
    }
}
