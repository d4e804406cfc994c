//! Registered tasks and the stages and model slots each one uses.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::TRACING_TARGET_REGISTRY;
use crate::error::{Error, RegistryLoadError, Result};
use crate::models::ModelRole;
use crate::param::Stage;
use crate::source::DocumentSource;

/// Icon used for tasks that do not declare one.
pub const DEFAULT_TASK_ICON: &str = "🤖";

fn default_icon() -> String {
    DEFAULT_TASK_ICON.to_owned()
}

/// Descriptive metadata of one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub long_description: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    /// Stages to resolve for the task, in display order.
    pub stages: Vec<Stage>,
    /// Model selectors the task needs, in display order.
    pub model_slots: Vec<ModelRole>,
}

impl TaskDescriptor {
    /// Creates a task without stages or model slots.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            long_description: String::new(),
            icon: default_icon(),
            stages: Vec::new(),
            model_slots: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_stages(mut self, stages: impl IntoIterator<Item = Stage>) -> Self {
        self.stages = stages.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_model_slots(mut self, slots: impl IntoIterator<Item = ModelRole>) -> Self {
        self.model_slots = slots.into_iter().collect();
        self
    }

    /// Returns `true` if the task resolves `stage`.
    #[must_use]
    pub fn has_stage(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }

    /// Returns `true` if the task has a selector for `role`.
    #[must_use]
    pub fn has_model_slot(&self, role: ModelRole) -> bool {
        self.model_slots.contains(&role)
    }
}

/// A task entry as the registry document spells it.
///
/// `param_blocks` and `ui_blocks` are the legacy keys. `ui_blocks` mixes
/// stage names with model roles, so only the role names are kept from it.
#[derive(Debug, Deserialize)]
struct RawTask {
    #[serde(default)]
    description: String,
    #[serde(default)]
    long_description: String,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default, alias = "param_blocks")]
    stages: Vec<String>,
    #[serde(default)]
    model_slots: Option<Vec<String>>,
    #[serde(default)]
    ui_blocks: Option<Vec<String>>,
}

impl RawTask {
    fn into_descriptor(self, name: String) -> Result<TaskDescriptor, RegistryLoadError> {
        let mut stages = Vec::with_capacity(self.stages.len());
        for stage_name in self.stages {
            let stage = Stage::from_str(&stage_name).map_err(|_| {
                RegistryLoadError::UnknownStage {
                    task: name.clone(),
                    stage: stage_name,
                }
            })?;
            if stages.contains(&stage) {
                return Err(RegistryLoadError::DuplicateStage { task: name, stage });
            }
            stages.push(stage);
        }

        let model_slots = match (self.model_slots, self.ui_blocks) {
            (Some(slots), _) => slots
                .into_iter()
                .map(|role| {
                    ModelRole::from_str(&role).map_err(|_| RegistryLoadError::UnknownModelRole {
                        task: name.clone(),
                        role,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            (None, Some(blocks)) => blocks
                .iter()
                .filter_map(|block| ModelRole::from_str(block).ok())
                .collect(),
            (None, None) => Vec::new(),
        };

        let mut model_slots_unique = Vec::with_capacity(model_slots.len());
        for role in model_slots {
            if !model_slots_unique.contains(&role) {
                model_slots_unique.push(role);
            }
        }

        Ok(TaskDescriptor {
            name,
            description: self.description,
            long_description: self.long_description,
            icon: self.icon.unwrap_or_else(default_icon),
            stages,
            model_slots: model_slots_unique,
        })
    }
}

/// Ordered set of registered tasks.
///
/// The registry is authoritative: overrides and resolutions for tasks it
/// does not list are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskRegistry {
    tasks: Vec<TaskDescriptor>,
    index: HashMap<String, usize>,
}

impl TaskRegistry {
    /// Builds a registry from descriptors, keeping their order.
    ///
    /// A repeated name replaces the earlier descriptor in place.
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = TaskDescriptor>) -> Self {
        let mut registry = Self::default();
        for descriptor in descriptors {
            registry.insert(descriptor);
        }
        registry
    }

    fn insert(&mut self, descriptor: TaskDescriptor) {
        match self.index.get(&descriptor.name) {
            Some(&position) => self.tasks[position] = descriptor,
            None => {
                self.index.insert(descriptor.name.clone(), self.tasks.len());
                self.tasks.push(descriptor);
            }
        }
    }

    /// Parses a registry document.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON and on unknown or repeated stage names.
    pub fn from_json(json: &str) -> Result<Self, RegistryLoadError> {
        Self::parse(json, "<inline>")
    }

    /// Reads and parses the registry document behind `source`.
    ///
    /// # Errors
    ///
    /// Fails if the source cannot be read or [`Self::from_json`] fails.
    pub fn load(source: &DocumentSource) -> Result<Self, RegistryLoadError> {
        let origin = source.origin();
        let json = source.read().map_err(|error| RegistryLoadError::Io {
            origin: origin.clone(),
            error,
        })?;

        let registry = Self::parse(&json, &origin)?;
        tracing::info!(
            target: TRACING_TARGET_REGISTRY,
            origin = %origin,
            tasks = registry.len(),
            "task registry loaded"
        );
        Ok(registry)
    }

    fn parse(json: &str, origin: &str) -> Result<Self, RegistryLoadError> {
        let document: Map<String, Value> =
            serde_json::from_str(json).map_err(|error| RegistryLoadError::Malformed {
                origin: origin.to_owned(),
                error,
            })?;

        let mut registry = Self::default();
        for (name, entry) in document {
            let raw = RawTask::deserialize(entry).map_err(|error| {
                RegistryLoadError::MalformedTask {
                    task: name.clone(),
                    error,
                }
            })?;
            registry.insert(raw.into_descriptor(name)?);
        }
        Ok(registry)
    }

    /// Returns the task names in registration order.
    pub fn tasks(&self) -> impl Iterator<Item = &str> + '_ {
        self.tasks.iter().map(|descriptor| descriptor.name.as_str())
    }

    /// Returns every descriptor in registration order.
    #[must_use]
    pub fn descriptors(&self) -> &[TaskDescriptor] {
        &self.tasks
    }

    /// Returns the descriptor of `task`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTask`] if the task is not registered.
    pub fn describe(&self, task: &str) -> Result<&TaskDescriptor> {
        self.index
            .get(task)
            .map(|&position| &self.tasks[position])
            .ok_or_else(|| Error::UnknownTask {
                task: task.to_owned(),
            })
    }

    /// Returns the stages of `task` in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTask`] if the task is not registered.
    pub fn stages_for(&self, task: &str) -> Result<&[Stage]> {
        self.describe(task).map(|descriptor| descriptor.stages.as_slice())
    }

    /// Returns the model slots of `task` in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTask`] if the task is not registered.
    pub fn model_slots_for(&self, task: &str) -> Result<&[ModelRole]> {
        self.describe(task)
            .map(|descriptor| descriptor.model_slots.as_slice())
    }

    /// Returns `true` if `task` is registered and resolves `stage`.
    #[must_use]
    pub fn has_stage(&self, task: &str, stage: Stage) -> bool {
        self.describe(task)
            .is_ok_and(|descriptor| descriptor.has_stage(stage))
    }

    /// Returns `true` if `task` is registered.
    #[must_use]
    pub fn contains(&self, task: &str) -> bool {
        self.index.contains_key(task)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_registration_order() {
        let json = r#"{
            "Summarisation": {"stages": ["decoding"], "model_slots": ["encoder_decoder"]},
            "RAG-based QA": {
                "icon": "🔍",
                "stages": ["preprocessing", "encoding"],
                "model_slots": ["encoder", "decoder"]
            }
        }"#;
        let registry = TaskRegistry::from_json(json).unwrap();

        assert_eq!(
            registry.tasks().collect::<Vec<_>>(),
            vec!["Summarisation", "RAG-based QA"]
        );
        assert_eq!(
            registry.stages_for("RAG-based QA").unwrap(),
            &[Stage::Preprocessing, Stage::Encoding]
        );
        assert_eq!(
            registry.model_slots_for("RAG-based QA").unwrap(),
            &[ModelRole::Encoder, ModelRole::Decoder]
        );
        assert_eq!(registry.describe("Summarisation").unwrap().icon, DEFAULT_TASK_ICON);
        assert!(registry.has_stage("Summarisation", Stage::Decoding));
        assert!(!registry.has_stage("Summarisation", Stage::Encoding));
    }

    #[test]
    fn accepts_legacy_block_keys() {
        let json = r#"{
            "Normal QA": {
                "ui_blocks": ["preprocessing", "encoding", "decoding", "encoder_decoder"],
                "param_blocks": ["preprocessing", "encoding", "decoding"]
            }
        }"#;
        let registry = TaskRegistry::from_json(json).unwrap();
        let descriptor = registry.describe("Normal QA").unwrap();
        assert_eq!(descriptor.stages.len(), 3);
        assert_eq!(descriptor.model_slots, vec![ModelRole::EncoderDecoder]);
    }

    #[test]
    fn unknown_task_is_reported_with_its_name() {
        let registry = TaskRegistry::from_descriptors([TaskDescriptor::new("Normal QA")]);
        let error = registry.describe("Translation").unwrap_err();
        assert!(matches!(error, Error::UnknownTask { ref task } if task == "Translation"));
        assert!(registry.stages_for("Translation").is_err());
    }

    #[test]
    fn rejects_bad_stage_lists() {
        let error = TaskRegistry::from_json(r#"{"A": {"stages": ["retrieval"]}}"#).unwrap_err();
        assert!(matches!(error, RegistryLoadError::UnknownStage { .. }));

        let error =
            TaskRegistry::from_json(r#"{"A": {"stages": ["encoding", "encoding_parameters"]}}"#)
                .unwrap_err();
        assert!(matches!(
            error,
            RegistryLoadError::DuplicateStage { stage: Stage::Encoding, .. }
        ));

        let error = TaskRegistry::from_json(r#"{"A": {"model_slots": ["retriever"]}}"#).unwrap_err();
        assert!(matches!(error, RegistryLoadError::UnknownModelRole { .. }));
    }
}
