//! Pipeline request body.

use paramlab_core::{ModelChoices, ParameterValues, PipelineEdits};
use serde::Deserialize;

/// Body of `POST /tasks/{task}/pipeline`.
///
/// Every field is optional: an empty object asks for the resolved defaults
/// and the first model of each slot.
#[must_use]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineBody {
    pub preprocessing: ParameterValues,
    pub encoding: ParameterValues,
    pub decoding: ParameterValues,
    /// Model name per role, e.g. `{"decoder": "gpt2"}`.
    pub models: ModelChoices,
}

impl PipelineBody {
    /// Splits the body into stage edits and model choices.
    pub fn into_parts(self) -> (PipelineEdits, ModelChoices) {
        let edits = PipelineEdits {
            preprocessing: self.preprocessing,
            encoding: self.encoding,
            decoding: self.decoding,
        };
        (edits, self.models)
    }
}
