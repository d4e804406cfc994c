use std::path::PathBuf;

#[cfg(feature = "config")]
use clap::Args;
use paramlab_core::{ConfigResolver, ConfigSources};
use serde::{Deserialize, Serialize};

use crate::service::Result;

/// Where the resolver reads its documents from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct ResolverConfig {
    /// Directory holding `parameters.json`, `task_overrides.json`,
    /// `tasks.json` and `models.json`.
    ///
    /// Without it the documents bundled with the binary are served, and
    /// reloads re-read those.
    #[cfg_attr(feature = "config", arg(long, env = "PARAMLAB_CONFIG_DIR"))]
    pub config_dir: Option<PathBuf>,
}

impl ResolverConfig {
    /// Reads documents from `dir`.
    pub fn with_config_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: Some(dir.into()),
        }
    }

    pub fn sources(&self) -> ConfigSources {
        match &self.config_dir {
            Some(dir) => ConfigSources::from_dir(dir),
            None => ConfigSources::builtin(),
        }
    }

    /// Loads every document.
    ///
    /// # Errors
    ///
    /// Returns the first document that fails to load or validate.
    pub fn load_resolver(&self) -> Result<ConfigResolver> {
        ConfigResolver::load(self.sources())
    }
}

#[cfg(test)]
mod tests {
    use paramlab_core::DocumentSource;

    use super::*;

    #[test]
    fn defaults_to_bundled_documents() {
        let config = ResolverConfig::default();
        assert!(matches!(config.sources().parameters, DocumentSource::Inline { .. }));
        assert!(config.load_resolver().is_ok());
    }

    #[test]
    fn missing_directory_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let config = ResolverConfig::with_config_dir(dir.path().join("absent"));
        let error = config.load_resolver().unwrap_err();
        assert!(error.is_load_error());
    }
}
