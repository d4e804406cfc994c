//! Task-specific partial overrides of catalog parameters.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::TRACING_TARGET_OVERRIDES;
use crate::catalog::ParameterCatalog;
use crate::error::OverrideLoadError;
use crate::param::{ParamValue, Stage};
use crate::registry::TaskRegistry;
use crate::source::DocumentSource;

/// A partial replacement of one parameter's fields for one task.
///
/// Every field is optional; absent fields fall back to the catalog. Unknown
/// keys are rejected so a misspelt field fails the load instead of being
/// silently ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OverrideRecord {
    /// Task-specific ideal value.
    #[serde(default, rename = "ideal")]
    pub default_value: Option<ParamValue>,
    /// Why the ideal value suits the task.
    #[serde(default, rename = "ideal_value_reason")]
    pub rationale: Option<String>,
    #[serde(default)]
    pub min: Option<ParamValue>,
    #[serde(default)]
    pub max: Option<ParamValue>,
    #[serde(default)]
    pub step: Option<ParamValue>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
}

impl OverrideRecord {
    #[must_use]
    pub fn with_default_value(mut self, value: impl Into<ParamValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    #[must_use]
    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }

    #[must_use]
    pub fn with_min(mut self, min: impl Into<ParamValue>) -> Self {
        self.min = Some(min.into());
        self
    }

    #[must_use]
    pub fn with_max(mut self, max: impl Into<ParamValue>) -> Self {
        self.max = Some(max.into());
        self
    }

    #[must_use]
    pub fn with_step(mut self, step: impl Into<ParamValue>) -> Self {
        self.step = Some(step.into());
        self
    }

    #[must_use]
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    /// Returns `true` if the record sets no field.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

type StageOverrides = HashMap<String, OverrideRecord>;

/// Override records keyed by task, stage and parameter name.
///
/// Built once per load and never mutated; a reload builds a new table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskOverrideTable {
    tasks: BTreeMap<String, BTreeMap<Stage, StageOverrides>>,
}

impl TaskOverrideTable {
    /// Returns a table without overrides.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns a copy of the table with `record` set for the given triple.
    #[must_use]
    pub fn with_override(
        mut self,
        task: impl Into<String>,
        stage: Stage,
        parameter: impl Into<String>,
        record: OverrideRecord,
    ) -> Self {
        self.tasks
            .entry(task.into())
            .or_default()
            .entry(stage)
            .or_default()
            .insert(parameter.into(), record);
        self
    }

    /// Parses an override document.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON, stage names that are not stages and records
    /// with unknown or mistyped fields.
    pub fn from_json(json: &str) -> Result<Self, OverrideLoadError> {
        Self::parse(json, "<inline>")
    }

    /// Reads and parses the override document behind `source`.
    ///
    /// # Errors
    ///
    /// Fails if the source cannot be read or [`Self::from_json`] fails.
    pub fn load(source: &DocumentSource) -> Result<Self, OverrideLoadError> {
        let origin = source.origin();
        let json = source.read().map_err(|error| OverrideLoadError::Io {
            origin: origin.clone(),
            error,
        })?;

        let table = Self::parse(&json, &origin)?;
        tracing::info!(
            target: TRACING_TARGET_OVERRIDES,
            origin = %origin,
            tasks = table.tasks.len(),
            records = table.len(),
            "task overrides loaded"
        );
        Ok(table)
    }

    fn parse(json: &str, origin: &str) -> Result<Self, OverrideLoadError> {
        let malformed = |error| OverrideLoadError::Malformed {
            origin: origin.to_owned(),
            error,
        };
        let document: Map<String, Value> = serde_json::from_str(json).map_err(malformed)?;

        let mut tasks = BTreeMap::new();
        for (task, stages) in document {
            let stages: Map<String, Value> = serde_json::from_value(stages).map_err(malformed)?;

            let mut by_stage = BTreeMap::new();
            for (stage_name, records) in stages {
                let stage = Stage::from_str(&stage_name).map_err(|_| {
                    OverrideLoadError::UnknownStage {
                        task: task.clone(),
                        stage: stage_name,
                    }
                })?;
                let records: Map<String, Value> =
                    serde_json::from_value(records).map_err(malformed)?;

                let mut by_name = StageOverrides::with_capacity(records.len());
                for (parameter, record) in records {
                    let record = OverrideRecord::deserialize(record).map_err(|error| {
                        OverrideLoadError::MalformedRecord {
                            task: task.clone(),
                            stage,
                            parameter: parameter.clone(),
                            error,
                        }
                    })?;
                    by_name.insert(parameter, record);
                }

                if by_stage.insert(stage, by_name).is_some() {
                    return Err(OverrideLoadError::DuplicateStage { task, stage });
                }
            }
            tasks.insert(task, by_stage);
        }

        Ok(Self { tasks })
    }

    /// Checks that every override targets a registered task and an existing
    /// catalog parameter.
    pub(crate) fn validate(
        &self,
        catalog: &ParameterCatalog,
        registry: &TaskRegistry,
    ) -> Result<(), OverrideLoadError> {
        for (task, stages) in &self.tasks {
            if !registry.contains(task) {
                return Err(OverrideLoadError::UnknownTask { task: task.clone() });
            }

            for (&stage, records) in stages {
                if !catalog.contains_stage(stage) {
                    return Err(OverrideLoadError::UnknownStage {
                        task: task.clone(),
                        stage: stage.to_string(),
                    });
                }

                // Sorted so the reported parameter does not depend on hashing.
                let mut names: Vec<&String> = records.keys().collect();
                names.sort();
                if let Some(unknown) = names
                    .into_iter()
                    .find(|name| catalog.get(stage, name).is_none())
                {
                    return Err(OverrideLoadError::UnknownParameter {
                        task: task.clone(),
                        stage,
                        parameter: unknown.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Returns the override of `name` in `stage` for `task`, if any.
    #[must_use]
    pub fn get_override(&self, task: &str, stage: Stage, name: &str) -> Option<&OverrideRecord> {
        self.tasks.get(task)?.get(&stage)?.get(name)
    }

    /// Returns every override of `stage` for `task`, keyed by parameter name.
    #[must_use]
    pub fn overrides_for(&self, task: &str, stage: Stage) -> Option<&HashMap<String, OverrideRecord>> {
        self.tasks.get(task)?.get(&stage)
    }

    /// Returns the tasks with at least one entry, sorted by name.
    pub fn tasks(&self) -> impl Iterator<Item = &str> + '_ {
        self.tasks.keys().map(String::as_str)
    }

    /// Returns the number of override records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks
            .values()
            .flat_map(BTreeMap::values)
            .map(HashMap::len)
            .sum()
    }

    /// Returns `true` if the table holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "RAG-based QA": {
            "encoding_parameters": {
                "pooling": {"ideal": "cls", "ideal_value_reason": "captures whole sequence"}
            },
            "decoding": {
                "top_k": {"max": 40},
                "temperature": {"ideal": 0.3, "min": 0.1, "step": 0.1}
            }
        }
    }"#;

    #[test]
    fn parses_partial_records() {
        let table = TaskOverrideTable::from_json(DOCUMENT).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.tasks().collect::<Vec<_>>(), vec!["RAG-based QA"]);

        let pooling = table
            .get_override("RAG-based QA", Stage::Encoding, "pooling")
            .unwrap();
        assert_eq!(
            pooling,
            &OverrideRecord::default()
                .with_default_value("cls")
                .with_rationale("captures whole sequence")
        );

        let top_k = table
            .get_override("RAG-based QA", Stage::Decoding, "top_k")
            .unwrap();
        assert_eq!(top_k.max, Some(ParamValue::Int(40)));
        assert!(top_k.default_value.is_none());

        assert!(table.get_override("Normal QA", Stage::Decoding, "top_k").is_none());
        assert_eq!(
            table.overrides_for("RAG-based QA", Stage::Decoding).map(HashMap::len),
            Some(2)
        );
    }

    #[test]
    fn rejects_unknown_record_fields() {
        let json = r#"{"Normal QA": {"decoding": {"top_k": {"ideal_reason": "typo"}}}}"#;
        let error = TaskOverrideTable::from_json(json).unwrap_err();
        assert!(matches!(
            error,
            OverrideLoadError::MalformedRecord { stage: Stage::Decoding, .. }
        ));
    }

    #[test]
    fn rejects_unknown_stage_names() {
        let json = r#"{"Normal QA": {"retrieval": {}}}"#;
        let error = TaskOverrideTable::from_json(json).unwrap_err();
        assert!(matches!(error, OverrideLoadError::UnknownStage { .. }));
    }

    #[test]
    fn rejects_malformed_document() {
        let error = TaskOverrideTable::from_json(r#"{"Normal QA": []}"#).unwrap_err();
        assert!(matches!(error, OverrideLoadError::Malformed { .. }));
    }

    #[test]
    fn empty_table() {
        let table = TaskOverrideTable::empty();
        assert!(table.is_empty());
        assert!(OverrideRecord::default().is_empty());
        assert!(!OverrideRecord::default().with_max(1).is_empty());
    }
}
