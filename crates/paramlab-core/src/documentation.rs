//! Long-form documentation for catalog parameters and their options.
//!
//! The documentation document is optional. A missing file loads as an empty
//! set, but every entry that is present must describe a parameter of the
//! catalog it is loaded against.

use std::collections::BTreeMap;
use std::io;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::TRACING_TARGET_DOCUMENTATION;
use crate::catalog::ParameterCatalog;
use crate::error::DocumentationLoadError;
use crate::param::Stage;
use crate::source::DocumentSource;

/// Documentation of one dropdown option.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mathematical_definition: Option<String>,
    #[serde(deserialize_with = "notes", skip_serializing_if = "Vec::is_empty")]
    pub use_cases: Vec<String>,
    #[serde(deserialize_with = "notes")]
    pub advantages: Vec<String>,
    #[serde(deserialize_with = "notes")]
    pub disadvantages: Vec<String>,
    #[serde(deserialize_with = "notes")]
    pub recommended_for: Vec<String>,
    #[serde(deserialize_with = "notes")]
    pub not_recommended_for: Vec<String>,
}

/// Documentation of one catalog parameter.
///
/// `options` is keyed by option value and is only allowed on dropdown
/// parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mathematical_definition: Option<String>,
    #[serde(deserialize_with = "notes", skip_serializing_if = "Vec::is_empty")]
    pub use_cases: Vec<String>,
    #[serde(deserialize_with = "notes", skip_serializing_if = "Vec::is_empty")]
    pub advantages: Vec<String>,
    #[serde(deserialize_with = "notes", skip_serializing_if = "Vec::is_empty")]
    pub disadvantages: Vec<String>,
    #[serde(deserialize_with = "notes", skip_serializing_if = "Vec::is_empty")]
    pub recommended_for: Vec<String>,
    #[serde(deserialize_with = "notes", skip_serializing_if = "Vec::is_empty")]
    pub not_recommended_for: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, OptionDoc>,
}

impl ParameterDoc {
    /// Returns the documentation of option `value`.
    pub fn option(&self, value: &str) -> Option<&OptionDoc> {
        self.options.get(value)
    }
}

/// Accepts a plain list or a map of category to list.
///
/// Grouped notes flatten to `"category: note"` in document order.
fn notes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Notes {
        List(Vec<String>),
        Grouped(Map<String, Value>),
    }

    match Notes::deserialize(deserializer)? {
        Notes::List(notes) => Ok(notes),
        Notes::Grouped(groups) => {
            let mut notes = Vec::new();
            for (category, entries) in groups {
                let entries: Vec<String> =
                    serde_json::from_value(entries).map_err(serde::de::Error::custom)?;
                notes.extend(entries.into_iter().map(|note| format!("{category}: {note}")));
            }
            Ok(notes)
        }
    }
}

/// Parameter documentation grouped by [`Stage`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterDocs {
    stages: BTreeMap<Stage, BTreeMap<String, ParameterDoc>>,
}

impl ParameterDocs {
    /// Returns a set without any documentation.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds or replaces the documentation of `stage.name`.
    #[must_use]
    pub fn with_doc(mut self, stage: Stage, name: impl Into<String>, doc: ParameterDoc) -> Self {
        self.stages.entry(stage).or_default().insert(name.into(), doc);
        self
    }

    /// Parses a documentation document.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON, unknown stages and malformed entries.
    pub fn from_json(json: &str) -> Result<Self, DocumentationLoadError> {
        Self::parse(json, "<inline>")
    }

    /// Reads and parses the documentation behind `source`.
    ///
    /// A file that does not exist yields an empty set.
    ///
    /// # Errors
    ///
    /// Fails on any other read error or if [`Self::from_json`] fails.
    pub fn load(source: &DocumentSource) -> Result<Self, DocumentationLoadError> {
        let origin = source.origin();
        let json = match source.read() {
            Ok(json) => json,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(
                    target: TRACING_TARGET_DOCUMENTATION,
                    origin = %origin,
                    "no parameter documentation found"
                );
                return Ok(Self::empty());
            }
            Err(error) => return Err(DocumentationLoadError::Io { origin, error }),
        };

        let docs = Self::parse(&json, &origin)?;
        tracing::info!(
            target: TRACING_TARGET_DOCUMENTATION,
            origin = %origin,
            documented = docs.len(),
            "parameter documentation loaded"
        );
        Ok(docs)
    }

    fn parse(json: &str, origin: &str) -> Result<Self, DocumentationLoadError> {
        let malformed = |error| DocumentationLoadError::Malformed {
            origin: origin.to_owned(),
            error,
        };
        let document: Map<String, Value> = serde_json::from_str(json).map_err(malformed)?;

        let mut stages = BTreeMap::new();
        for (stage_name, entries) in document {
            let stage = Stage::from_str(&stage_name)
                .map_err(|_| DocumentationLoadError::UnknownStage { stage: stage_name })?;
            let entries: Map<String, Value> = serde_json::from_value(entries).map_err(malformed)?;

            let mut docs = BTreeMap::new();
            for (name, entry) in entries {
                let doc: ParameterDoc = serde_json::from_value(entry).map_err(|error| {
                    DocumentationLoadError::MalformedEntry {
                        stage,
                        parameter: name.clone(),
                        error,
                    }
                })?;
                docs.insert(name, doc);
            }

            if stages.insert(stage, docs).is_some() {
                return Err(DocumentationLoadError::DuplicateStage { stage });
            }
        }

        Ok(Self { stages })
    }

    /// Checks every entry against `catalog`.
    ///
    /// # Errors
    ///
    /// Fails on the first entry for a parameter the catalog lacks, option
    /// documentation on a parameter without options, or documentation for an
    /// option value the parameter does not offer.
    pub fn validate(&self, catalog: &ParameterCatalog) -> Result<(), DocumentationLoadError> {
        for (&stage, docs) in &self.stages {
            for (name, doc) in docs {
                let Some(spec) = catalog.get(stage, name) else {
                    return Err(DocumentationLoadError::UnknownParameter {
                        stage,
                        parameter: name.clone(),
                    });
                };
                if doc.options.is_empty() {
                    continue;
                }

                let Some(options) = spec.options() else {
                    return Err(DocumentationLoadError::OptionsWithoutChoices {
                        stage,
                        parameter: name.clone(),
                    });
                };
                if let Some(option) = doc.options.keys().find(|key| !options.contains(key)) {
                    return Err(DocumentationLoadError::UnknownOption {
                        stage,
                        parameter: name.clone(),
                        option: option.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Returns the documentation of parameter `name` of `stage`.
    #[must_use]
    pub fn get(&self, stage: Stage, name: &str) -> Option<&ParameterDoc> {
        self.stages.get(&stage)?.get(name)
    }

    /// Returns the number of documented parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::{Bounds, Control, Numeric, ParameterSpec, ValueType};

    fn catalog() -> ParameterCatalog {
        let pooling = ParameterSpec::new(
            "pooling",
            Control::Dropdown {
                options: vec!["mean".into(), "cls".into()],
                default: "mean".into(),
            },
        )
        .unwrap();
        let top_k = ParameterSpec::new(
            "top_k",
            Control::Slider(Numeric::new(ValueType::Int, Bounds::new(0, 100), 50)),
        )
        .unwrap();

        ParameterCatalog::from_stages([
            (Stage::Encoding, vec![pooling]),
            (Stage::Decoding, vec![top_k]),
        ])
    }

    #[test]
    fn parses_legacy_sections_and_grouped_notes() {
        let docs = ParameterDocs::from_json(
            r#"{
                "encoding_parameters": {
                    "pooling": {
                        "description": "Aggregates token embeddings.",
                        "options": {
                            "cls": {
                                "name": "CLS Token",
                                "description": "Uses the first token.",
                                "advantages": ["Cheap"],
                                "recommended_for": ["Classification"]
                            }
                        }
                    }
                },
                "decoding": {
                    "top_k": {
                        "description": "Keeps the K best tokens.",
                        "mathematical_definition": "argtop_k(p)",
                        "advantages": {"quality": ["Focused"], "speed": ["Small candidate set"]}
                    }
                }
            }"#,
        )
        .unwrap();
        docs.validate(&catalog()).unwrap();
        assert_eq!(docs.len(), 2);

        let pooling = docs.get(Stage::Encoding, "pooling").unwrap();
        let cls = pooling.option("cls").unwrap();
        assert_eq!(cls.name.as_deref(), Some("CLS Token"));
        assert_eq!(cls.recommended_for, ["Classification"]);
        assert!(cls.not_recommended_for.is_empty());

        let top_k = docs.get(Stage::Decoding, "top_k").unwrap();
        assert_eq!(top_k.advantages, ["quality: Focused", "speed: Small candidate set"]);
        assert!(docs.get(Stage::Decoding, "top_p").is_none());
    }

    #[test]
    fn rejects_entries_the_catalog_does_not_back() {
        let docs = ParameterDocs::from_json(r#"{"decoding": {"top_q": {"description": "?"}}}"#).unwrap();
        assert!(matches!(
            docs.validate(&catalog()),
            Err(DocumentationLoadError::UnknownParameter { stage: Stage::Decoding, .. })
        ));

        let docs = ParameterDocs::from_json(
            r#"{"decoding": {"top_k": {"description": "", "options": {"ten": {}}}}}"#,
        )
        .unwrap();
        assert!(matches!(
            docs.validate(&catalog()),
            Err(DocumentationLoadError::OptionsWithoutChoices { .. })
        ));

        let docs = ParameterDocs::from_json(
            r#"{"encoding": {"pooling": {"description": "", "options": {"max": {}}}}}"#,
        )
        .unwrap();
        let error = docs.validate(&catalog()).unwrap_err();
        assert!(
            matches!(&error, DocumentationLoadError::UnknownOption { option, .. } if option == "max")
        );
    }

    #[test]
    fn rejects_unknown_sections_and_malformed_entries() {
        assert!(matches!(
            ParameterDocs::from_json(r#"{"pooling_strategies": {}}"#),
            Err(DocumentationLoadError::UnknownStage { .. })
        ));
        assert!(matches!(
            ParameterDocs::from_json(r#"{"decoding": {"top_k": {"use_cases": 3}}}"#),
            Err(DocumentationLoadError::MalformedEntry { .. })
        ));
        assert!(matches!(
            ParameterDocs::from_json("[]"),
            Err(DocumentationLoadError::Malformed { .. })
        ));
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let source = DocumentSource::file(dir.path().join("absent.json"));
        assert!(ParameterDocs::load(&source).unwrap().is_empty());
    }
}
