//! Static catalog of selectable models grouped by architecture role.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

use crate::TRACING_TARGET_MODELS;
use crate::error::{Error, ModelCatalogLoadError, Result};
use crate::source::DocumentSource;

/// Architectural category of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(AsRefStr, Display, EnumString, EnumIter, IntoStaticStr)]
#[derive(Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ModelRole {
    /// Encoder-only models, used for embeddings.
    Encoder,
    /// Decoder-only models, used for generation.
    Decoder,
    /// Sequence-to-sequence models.
    #[strum(to_string = "encoder_decoder", serialize = "encoder-decoder")]
    #[serde(alias = "encoder-decoder")]
    EncoderDecoder,
}

impl ModelRole {
    /// Returns the key grouping this role in the models document.
    #[must_use]
    pub const fn group_key(self) -> &'static str {
        match self {
            Self::Encoder => "ENCODER_ONLY_MODELS",
            Self::Decoder => "DECODER_ONLY_MODELS",
            Self::EncoderDecoder => "ENCODER_DECODER_MODELS",
        }
    }

    /// Parses a role name, accepting `encoder-decoder`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownModelRole`] naming the rejected input.
    pub fn parse(name: &str) -> Result<Self> {
        Self::from_str(name).map_err(|_| Error::UnknownModelRole {
            role: name.to_owned(),
        })
    }

    fn from_group_key(key: &str) -> Option<Self> {
        match key {
            "ENCODER_ONLY_MODELS" => Some(Self::Encoder),
            "DECODER_ONLY_MODELS" => Some(Self::Decoder),
            "ENCODER_DECODER_MODELS" => Some(Self::EncoderDecoder),
            _ => None,
        }
    }
}

/// One selectable model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub name: String,
    #[serde(alias = "type")]
    pub role: ModelRole,
    /// Parameter count as written by the publisher, e.g. `"22M"`.
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub trained_on: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub intended_use: String,
    /// Where the model is published.
    #[serde(default)]
    pub source: String,
}

impl ModelDescriptor {
    pub fn new(name: impl Into<String>, role: ModelRole) -> Self {
        Self {
            name: name.into(),
            role,
            size: String::new(),
            trained_on: String::new(),
            description: String::new(),
            intended_use: String::new(),
            source: String::new(),
        }
    }
}

/// Models available for selection, grouped by [`ModelRole`].
///
/// Role membership is fixed when the catalog is built; nothing here is
/// task-specific.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelCatalog {
    roles: BTreeMap<ModelRole, Vec<ModelDescriptor>>,
}

impl ModelCatalog {
    /// Builds a catalog from descriptors, keeping their order within a role.
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = ModelDescriptor>) -> Self {
        let mut roles: BTreeMap<ModelRole, Vec<ModelDescriptor>> = BTreeMap::new();
        for descriptor in descriptors {
            roles.entry(descriptor.role).or_default().push(descriptor);
        }
        Self { roles }
    }

    /// Parses a models document.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON, unknown group keys, entries whose declared
    /// role disagrees with their group and duplicate names within a role.
    pub fn from_json(json: &str) -> Result<Self, ModelCatalogLoadError> {
        Self::parse(json, "<inline>")
    }

    /// Reads and parses the models document behind `source`.
    ///
    /// # Errors
    ///
    /// Fails if the source cannot be read or [`Self::from_json`] fails.
    pub fn load(source: &DocumentSource) -> Result<Self, ModelCatalogLoadError> {
        let origin = source.origin();
        let json = source.read().map_err(|error| ModelCatalogLoadError::Io {
            origin: origin.clone(),
            error,
        })?;

        let catalog = Self::parse(&json, &origin)?;
        tracing::info!(
            target: TRACING_TARGET_MODELS,
            origin = %origin,
            models = catalog.len(),
            "model catalog loaded"
        );
        Ok(catalog)
    }

    fn parse(json: &str, origin: &str) -> Result<Self, ModelCatalogLoadError> {
        let malformed = |error| ModelCatalogLoadError::Malformed {
            origin: origin.to_owned(),
            error,
        };
        let document: Map<String, Value> = serde_json::from_str(json).map_err(malformed)?;

        let mut roles = BTreeMap::new();
        for (group, entries) in document {
            let expected = ModelRole::from_group_key(&group)
                .ok_or(ModelCatalogLoadError::UnknownGroup { group })?;
            let entries: Vec<ModelDescriptor> =
                serde_json::from_value(entries).map_err(malformed)?;

            let mut models: Vec<ModelDescriptor> = Vec::with_capacity(entries.len());
            for entry in entries {
                if entry.role != expected {
                    return Err(ModelCatalogLoadError::RoleMismatch {
                        model: entry.name,
                        expected,
                        found: entry.role,
                    });
                }
                if models.iter().any(|model| model.name == entry.name) {
                    return Err(ModelCatalogLoadError::DuplicateModel {
                        role: expected,
                        model: entry.name,
                    });
                }
                models.push(entry);
            }
            roles.insert(expected, models);
        }

        Ok(Self { roles })
    }

    /// Returns the models of `role` in document order.
    #[must_use]
    pub fn by_role(&self, role: ModelRole) -> &[ModelDescriptor] {
        self.roles
            .get(&role)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns the model `name` of `role`.
    #[must_use]
    pub fn get(&self, role: ModelRole, name: &str) -> Option<&ModelDescriptor> {
        self.by_role(role).iter().find(|model| model.name == name)
    }

    /// Returns the first model called `name`, searching roles in order.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&ModelDescriptor> {
        self.roles
            .values()
            .flatten()
            .find(|model| model.name == name)
    }

    /// Returns the model selected when a caller does not choose one.
    #[must_use]
    pub fn default_for(&self, role: ModelRole) -> Option<&ModelDescriptor> {
        self.by_role(role).first()
    }

    /// Returns the total number of models.
    #[must_use]
    pub fn len(&self) -> usize {
        self.roles.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
