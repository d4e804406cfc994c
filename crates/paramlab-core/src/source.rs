//! Where configuration documents come from.

use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File name of the parameter catalog document.
pub const PARAMETERS_FILE: &str = "parameters.json";
/// File name of the task override document.
pub const OVERRIDES_FILE: &str = "task_overrides.json";
/// File name of the task registry document.
pub const TASKS_FILE: &str = "tasks.json";
/// File name of the model catalog document.
pub const MODELS_FILE: &str = "models.json";
/// File name of the optional parameter documentation document.
pub const DOCUMENTATION_FILE: &str = "parameter_documentation.json";

const BUILTIN_PARAMETERS: &str = include_str!("../config/parameters.json");
const BUILTIN_OVERRIDES: &str = include_str!("../config/task_overrides.json");
const BUILTIN_TASKS: &str = include_str!("../config/tasks.json");
const BUILTIN_MODELS: &str = include_str!("../config/models.json");
const BUILTIN_DOCUMENTATION: &str = include_str!("../config/parameter_documentation.json");

/// A single JSON document, either on disk or held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    /// A file that is re-read on every load.
    File(PathBuf),
    /// Document content held in memory, identified by `name` in errors.
    Inline {
        name: Cow<'static, str>,
        content: Cow<'static, str>,
    },
}

impl DocumentSource {
    /// Creates a source backed by a file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// Creates a source backed by in-memory content.
    pub fn inline(name: impl Into<Cow<'static, str>>, content: impl Into<Cow<'static, str>>) -> Self {
        Self::Inline {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Returns a human-readable description of the source for errors and logs.
    #[must_use]
    pub fn origin(&self) -> String {
        self.to_string()
    }

    /// Reads the document content.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the backing file cannot be read.
    pub fn read(&self) -> io::Result<Cow<'_, str>> {
        match self {
            Self::File(path) => fs::read_to_string(path).map(Cow::Owned),
            Self::Inline { content, .. } => Ok(Cow::Borrowed(content)),
        }
    }
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Inline { name, .. } => write!(f, "<{name}>"),
        }
    }
}

/// The documents a resolver is built from.
///
/// `documentation` is optional; without it parameters resolve undocumented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSources {
    pub parameters: DocumentSource,
    pub overrides: DocumentSource,
    pub tasks: DocumentSource,
    pub models: DocumentSource,
    pub documentation: Option<DocumentSource>,
}

impl ConfigSources {
    /// Uses the standard file names inside `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            parameters: DocumentSource::file(dir.join(PARAMETERS_FILE)),
            overrides: DocumentSource::file(dir.join(OVERRIDES_FILE)),
            tasks: DocumentSource::file(dir.join(TASKS_FILE)),
            models: DocumentSource::file(dir.join(MODELS_FILE)),
            documentation: Some(DocumentSource::file(dir.join(DOCUMENTATION_FILE))),
        }
    }

    /// Uses the documents compiled into the crate.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            parameters: DocumentSource::inline("builtin parameters", BUILTIN_PARAMETERS),
            overrides: DocumentSource::inline("builtin task overrides", BUILTIN_OVERRIDES),
            tasks: DocumentSource::inline("builtin tasks", BUILTIN_TASKS),
            models: DocumentSource::inline("builtin models", BUILTIN_MODELS),
            documentation: Some(DocumentSource::inline(
                "builtin parameter documentation",
                BUILTIN_DOCUMENTATION,
            )),
        }
    }

    /// Replaces the override document.
    #[must_use]
    pub fn with_overrides(mut self, overrides: DocumentSource) -> Self {
        self.overrides = overrides;
        self
    }

    /// Replaces the parameter catalog document.
    #[must_use]
    pub fn with_parameters(mut self, parameters: DocumentSource) -> Self {
        self.parameters = parameters;
        self
    }

    /// Replaces the documentation document; `None` disables documentation.
    #[must_use]
    pub fn with_documentation(mut self, documentation: Option<DocumentSource>) -> Self {
        self.documentation = documentation;
        self
    }
}

impl Default for ConfigSources {
    fn default() -> Self {
        Self::builtin()
    }
}
