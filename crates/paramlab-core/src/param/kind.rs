//! Closed vocabularies shared by catalog documents and resolved views.
//!
//! Every enum here parses from the names used in the JSON configuration
//! documents, including the legacy aliases older documents still carry.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::{Error, Result};

/// A phase of the generation pipeline with its own tunable parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(AsRefStr, Display, EnumString, EnumIter, IntoStaticStr)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Text cleaning and chunking before encoding.
    #[strum(to_string = "preprocessing", serialize = "preprocessing_parameters")]
    #[serde(alias = "preprocessing_parameters")]
    Preprocessing,
    /// Turning text into embeddings.
    #[strum(to_string = "encoding", serialize = "encoding_parameters")]
    #[serde(alias = "encoding_parameters")]
    Encoding,
    /// Text generation.
    #[strum(to_string = "decoding", serialize = "decoding_parameters")]
    #[serde(alias = "decoding_parameters")]
    Decoding,
}

impl Stage {
    /// Parses a stage name, accepting the legacy `*_parameters` keys.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownStage`] naming the rejected input.
    pub fn parse(name: &str) -> Result<Self> {
        Self::from_str(name).map_err(|_| Error::UnknownStage {
            stage: name.to_owned(),
        })
    }
}

/// The interaction affordance a parameter expects from a presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[derive(Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
    /// Bounded numeric range.
    Slider,
    /// Free numeric entry within bounds.
    #[strum(to_string = "number", serialize = "number_input")]
    #[serde(alias = "number_input")]
    Number,
    /// Boolean toggle.
    Checkbox,
    /// One value out of a fixed list of options.
    #[strum(to_string = "dropdown", serialize = "select")]
    #[serde(alias = "select")]
    Dropdown,
    /// Free text.
    Text,
}

impl WidgetKind {
    /// Returns `true` for widgets that carry numeric bounds.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Slider | Self::Number)
    }
}

/// Data type of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[derive(Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Signed 64-bit integer.
    Int,
    /// 64-bit float.
    Float,
    /// Boolean flag.
    Bool,
    /// UTF-8 string.
    #[strum(to_string = "string", serialize = "str")]
    #[serde(alias = "str")]
    String,
}

impl ValueType {
    /// Returns `true` for `int` and `float`.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn stage_accepts_legacy_names() {
        assert_eq!(Stage::from_str("encoding").unwrap(), Stage::Encoding);
        assert_eq!(
            Stage::from_str("decoding_parameters").unwrap(),
            Stage::Decoding
        );
        assert!(matches!(
            Stage::parse("postprocessing"),
            Err(Error::UnknownStage { ref stage }) if stage == "postprocessing"
        ));
    }

    #[test]
    fn stage_display_uses_canonical_name() {
        assert_eq!(Stage::Preprocessing.to_string(), "preprocessing");
        assert_eq!(Stage::Encoding.as_ref(), "encoding");
    }

    #[test]
    fn stage_iteration_follows_pipeline_order() {
        let stages: Vec<Stage> = Stage::iter().collect();
        assert_eq!(
            stages,
            vec![Stage::Preprocessing, Stage::Encoding, Stage::Decoding]
        );
    }

    #[test]
    fn widget_kind_aliases() {
        assert_eq!(WidgetKind::from_str("number_input").unwrap(), WidgetKind::Number);
        assert_eq!(WidgetKind::from_str("select").unwrap(), WidgetKind::Dropdown);
        assert_eq!(WidgetKind::Number.to_string(), "number");

        let kind: WidgetKind = serde_json::from_str("\"number_input\"").unwrap();
        assert_eq!(kind, WidgetKind::Number);
        assert!(kind.is_numeric());
        assert!(!WidgetKind::Checkbox.is_numeric());
    }

    #[test]
    fn value_type_accepts_str_alias() {
        let value_type: ValueType = serde_json::from_str("\"str\"").unwrap();
        assert_eq!(value_type, ValueType::String);
        assert_eq!(serde_json::to_string(&value_type).unwrap(), "\"string\"");
        assert_eq!(ValueType::from_str("str").unwrap(), ValueType::String);
    }
}
