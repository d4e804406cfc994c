//! The base catalog of tunable parameters, grouped by stage.

mod document;

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use serde_json::{Map, Value};

pub(crate) use self::document::coerce;
use self::document::RawParameter;
use crate::TRACING_TARGET_CATALOG;
use crate::error::CatalogLoadError;
use crate::param::{ParameterSpec, Stage};
use crate::source::DocumentSource;

/// Parameters of one stage in document order.
#[derive(Debug, Clone, Default, PartialEq)]
struct StageCatalog {
    parameters: Vec<ParameterSpec>,
    index: HashMap<String, usize>,
}

impl StageCatalog {
    fn push(&mut self, spec: ParameterSpec) {
        match self.index.get(spec.name()) {
            Some(&position) => self.parameters[position] = spec,
            None => {
                self.index.insert(spec.name().to_owned(), self.parameters.len());
                self.parameters.push(spec);
            }
        }
    }
}

/// Every [`ParameterSpec`] known to the process, grouped by [`Stage`].
///
/// Immutable once built. Iteration within a stage follows the order of the
/// source document, which is also the order every resolution returns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterCatalog {
    stages: BTreeMap<Stage, StageCatalog>,
}

impl ParameterCatalog {
    /// Builds a catalog from already validated specifications.
    ///
    /// A repeated name within a stage replaces the earlier entry in place.
    pub fn from_stages<I, P>(stages: I) -> Self
    where
        I: IntoIterator<Item = (Stage, P)>,
        P: IntoIterator<Item = ParameterSpec>,
    {
        let mut catalog = Self::default();
        for (stage, parameters) in stages {
            let entry = catalog.stages.entry(stage).or_default();
            for spec in parameters {
                entry.push(spec);
            }
        }
        catalog
    }

    /// Parses a catalog document.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON, unknown stages and the first parameter that
    /// breaks a specification rule.
    pub fn from_json(json: &str) -> Result<Self, CatalogLoadError> {
        Self::parse(json, "<inline>")
    }

    /// Reads and parses the catalog document behind `source`.
    ///
    /// # Errors
    ///
    /// Fails if the source cannot be read or [`Self::from_json`] fails.
    pub fn load(source: &DocumentSource) -> Result<Self, CatalogLoadError> {
        let origin = source.origin();
        let json = source.read().map_err(|error| CatalogLoadError::Io {
            origin: origin.clone(),
            error,
        })?;

        let catalog = Self::parse(&json, &origin)?;
        tracing::info!(
            target: TRACING_TARGET_CATALOG,
            origin = %origin,
            stages = catalog.stages.len(),
            parameters = catalog.len(),
            "parameter catalog loaded"
        );
        Ok(catalog)
    }

    fn parse(json: &str, origin: &str) -> Result<Self, CatalogLoadError> {
        let document: Map<String, Value> =
            serde_json::from_str(json).map_err(|error| CatalogLoadError::Malformed {
                origin: origin.to_owned(),
                error,
            })?;

        let mut stages = BTreeMap::new();
        for (stage_name, entries) in document {
            let stage = Stage::from_str(&stage_name)
                .map_err(|_| CatalogLoadError::UnknownStage { stage: stage_name })?;
            let entries: Map<String, Value> =
                serde_json::from_value(entries).map_err(|error| CatalogLoadError::Malformed {
                    origin: origin.to_owned(),
                    error,
                })?;

            let mut catalog = StageCatalog::default();
            for (name, entry) in entries {
                let raw: RawParameter = serde_json::from_value(entry).map_err(|error| {
                    CatalogLoadError::MalformedParameter {
                        stage,
                        parameter: name.clone(),
                        error,
                    }
                })?;
                let spec = raw.into_spec(&name).map_err(|violation| {
                    CatalogLoadError::InvalidParameter {
                        stage,
                        parameter: name.clone(),
                        violation,
                    }
                })?;

                tracing::trace!(
                    target: TRACING_TARGET_CATALOG,
                    stage = %stage,
                    parameter = %name,
                    widget = %spec.widget_kind(),
                    "parameter registered"
                );
                catalog.push(spec);
            }

            if stages.insert(stage, catalog).is_some() {
                return Err(CatalogLoadError::DuplicateStage { stage });
            }
        }

        Ok(Self { stages })
    }

    /// Returns the parameter `name` of `stage`.
    #[must_use]
    pub fn get(&self, stage: Stage, name: &str) -> Option<&ParameterSpec> {
        let catalog = self.stages.get(&stage)?;
        catalog.index.get(name).map(|&position| &catalog.parameters[position])
    }

    /// Returns the parameters of `stage` in document order.
    ///
    /// A stage without entries yields an empty slice.
    #[must_use]
    pub fn all(&self, stage: Stage) -> &[ParameterSpec] {
        self.stages
            .get(&stage)
            .map(|catalog| catalog.parameters.as_slice())
            .unwrap_or_default()
    }

    /// Returns `true` if the catalog has entries for `stage`.
    #[must_use]
    pub fn contains_stage(&self, stage: Stage) -> bool {
        self.stages.contains_key(&stage)
    }

    /// Returns the stages with entries in pipeline order.
    pub fn stages(&self) -> impl Iterator<Item = Stage> + '_ {
        self.stages.keys().copied()
    }

    /// Returns the total number of parameters across stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.values().map(|catalog| catalog.parameters.len()).sum()
    }

    /// Returns `true` if the catalog has no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::{ParamValue, WidgetKind};

    const DOCUMENT: &str = r#"{
        "encoding_parameters": {
            "pooling": {
                "label": "Pooling Strategy",
                "type": "dropdown",
                "value_type": "str",
                "ideal": "mean",
                "options": ["mean", "max", "cls"]
            },
            "layer": {"type": "number", "value_type": "int", "ideal": -1, "min": -12, "max": 12}
        },
        "decoding": {
            "top_k": {"type": "slider", "value_type": "int", "ideal": 50, "min": 0, "max": 100},
            "early_stopping": {"type": "checkbox", "value_type": "bool", "ideal": true},
            "temperature": {"type": "slider", "value_type": "float", "ideal": 0.7, "min": 0.0, "max": 1.5}
        }
    }"#;

    #[test]
    fn preserves_document_order() {
        let catalog = ParameterCatalog::from_json(DOCUMENT).unwrap();
        let names: Vec<_> = catalog
            .all(Stage::Decoding)
            .iter()
            .map(ParameterSpec::name)
            .collect();
        assert_eq!(names, vec!["top_k", "early_stopping", "temperature"]);
        assert_eq!(catalog.len(), 5);
    }

    #[test]
    fn lookups() {
        let catalog = ParameterCatalog::from_json(DOCUMENT).unwrap();
        let pooling = catalog.get(Stage::Encoding, "pooling").unwrap();
        assert_eq!(pooling.widget_kind(), WidgetKind::Dropdown);
        assert_eq!(pooling.default_value(), ParamValue::Text("mean".into()));

        assert!(catalog.get(Stage::Encoding, "top_k").is_none());
        assert!(catalog.all(Stage::Preprocessing).is_empty());
        assert!(!catalog.contains_stage(Stage::Preprocessing));
        assert_eq!(
            catalog.stages().collect::<Vec<_>>(),
            vec![Stage::Encoding, Stage::Decoding]
        );
    }

    #[test]
    fn fails_fast_on_invalid_parameter() {
        let json = r#"{"decoding": {"top_k": {"type": "slider", "ideal": 50, "min": 0, "max": 40}}}"#;
        let error = ParameterCatalog::from_json(json).unwrap_err();
        assert!(matches!(
            error,
            CatalogLoadError::InvalidParameter { stage: Stage::Decoding, ref parameter, .. }
                if parameter == "top_k"
        ));
    }

    #[test]
    fn fails_fast_on_missing_ideal() {
        let json = r#"{"decoding": {"top_k": {"type": "slider", "min": 0, "max": 100}}}"#;
        let error = ParameterCatalog::from_json(json).unwrap_err();
        assert!(matches!(
            error,
            CatalogLoadError::InvalidParameter {
                violation: crate::param::SpecViolation::MissingField { .. },
                ..
            }
        ));
    }

    #[test]
    fn rejects_unknown_and_duplicate_stages() {
        let error = ParameterCatalog::from_json(r#"{"retrieval": {}}"#).unwrap_err();
        assert!(matches!(error, CatalogLoadError::UnknownStage { .. }));

        let error =
            ParameterCatalog::from_json(r#"{"encoding": {}, "encoding_parameters": {}}"#).unwrap_err();
        assert!(matches!(
            error,
            CatalogLoadError::DuplicateStage { stage: Stage::Encoding }
        ));
    }

    #[test]
    fn rejects_malformed_entries() {
        let error = ParameterCatalog::from_json(r#"{"decoding": {"top_k": {"type": "knob"}}}"#)
            .unwrap_err();
        assert!(matches!(error, CatalogLoadError::MalformedParameter { .. }));

        let error = ParameterCatalog::from_json("[1, 2]").unwrap_err();
        assert!(matches!(error, CatalogLoadError::Malformed { .. }));
    }

    #[test]
    fn builtin_catalog_is_valid() {
        let catalog = ParameterCatalog::load(&crate::ConfigSources::builtin().parameters).unwrap();
        assert_eq!(catalog.all(Stage::Preprocessing).len(), 12);
        assert_eq!(catalog.all(Stage::Encoding).len(), 6);
        assert_eq!(catalog.all(Stage::Decoding).len(), 9);
    }
}
