//! Merging the parameter catalog with task overrides.
//!
//! [`ConfigResolver`] owns the loaded configuration and is meant to be
//! constructed once and shared (for example behind an `Arc`) by every
//! consumer. The catalog, override table and parameter documentation live
//! in an immutable
//! [`Snapshot`]; a reload builds a complete new snapshot and swaps it in,
//! so readers see either the old configuration or the new one and never a
//! mix of both.

mod merge;
mod pipeline;
mod resolved;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use jiff::Timestamp;

pub use self::pipeline::{ModelChoices, ParameterValues, PipelineEdits, PipelineRequest};
pub use self::resolved::{ConfigInconsistency, ResolvedParameter, StageResolution, TaskResolution};
use crate::TRACING_TARGET_RESOLVER;
use crate::catalog::ParameterCatalog;
use crate::documentation::ParameterDocs;
use crate::error::{Error, Result};
use crate::models::ModelCatalog;
use crate::overrides::TaskOverrideTable;
use crate::param::{ParamValue, ParameterSpec, Stage};
use crate::registry::TaskRegistry;
use crate::source::ConfigSources;

/// One immutable generation of the reloadable configuration.
#[derive(Debug)]
pub struct Snapshot {
    catalog: Arc<ParameterCatalog>,
    overrides: Arc<TaskOverrideTable>,
    documentation: Arc<ParameterDocs>,
    generation: u64,
    loaded_at: Timestamp,
}

impl Snapshot {
    fn new(
        catalog: Arc<ParameterCatalog>,
        overrides: Arc<TaskOverrideTable>,
        documentation: Arc<ParameterDocs>,
        generation: u64,
    ) -> Self {
        Self {
            catalog,
            overrides,
            documentation,
            generation,
            loaded_at: Timestamp::now(),
        }
    }

    pub fn catalog(&self) -> &ParameterCatalog {
        &self.catalog
    }

    pub fn overrides(&self) -> &TaskOverrideTable {
        &self.overrides
    }

    pub fn documentation(&self) -> &ParameterDocs {
        &self.documentation
    }

    /// Starts at 1 and increases by one on every successful reload.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub const fn loaded_at(&self) -> Timestamp {
        self.loaded_at
    }

    /// Resolves `stage` for `task`.
    ///
    /// A pure function of the snapshot: repeated calls return equal
    /// results. Does not consult the task registry, so an unregistered
    /// task resolves to the plain catalog.
    pub fn resolve(&self, task: &str, stage: Stage) -> StageResolution {
        let parameters = self
            .catalog
            .all(stage)
            .iter()
            .map(|spec| self.resolve_spec(task, stage, spec))
            .collect();
        let resolution = StageResolution::new(task, stage, parameters);

        tracing::trace!(
            target: TRACING_TARGET_RESOLVER,
            task = %task,
            stage = %stage,
            generation = self.generation,
            parameters = resolution.len(),
            issues = resolution.issue_count(),
            "stage resolved"
        );
        resolution
    }

    /// Resolves one parameter, or returns `None` if the catalog lacks it.
    pub fn resolve_parameter(&self, task: &str, stage: Stage, name: &str) -> Option<ResolvedParameter> {
        let spec = self.catalog.get(stage, name)?;
        Some(self.resolve_spec(task, stage, spec))
    }

    fn resolve_spec(&self, task: &str, stage: Stage, spec: &ParameterSpec) -> ResolvedParameter {
        let documentation = self.documentation.get(stage, spec.name()).cloned();
        let Some(record) = self.overrides.get_override(task, stage, spec.name()) else {
            return ResolvedParameter::unchanged(spec).with_documentation(documentation);
        };

        let merged = merge::merge(spec, record);
        let issues = merged
            .violations
            .into_iter()
            .map(|violation| {
                tracing::warn!(
                    target: TRACING_TARGET_RESOLVER,
                    task = %task,
                    stage = %stage,
                    parameter = %spec.name(),
                    kind = violation.kind(),
                    "inconsistent task override: {violation}"
                );
                ConfigInconsistency {
                    task: task.to_owned(),
                    stage,
                    parameter: spec.name().to_owned(),
                    violation,
                }
            })
            .collect();

        ResolvedParameter::new(merged.spec, merged.overridden, issues).with_documentation(documentation)
    }
}

/// Resolves task-specific parameter views.
///
/// The catalog, override table and documentation are reloadable; the task
/// registry and model catalog are fixed for the resolver's lifetime.
///
/// Reloads are serialized: each one reads, validates and swaps while
/// holding `reload_lock`, so a reload never installs parts read before a
/// concurrent reload completed. Reads never take that lock.
#[derive(Debug)]
pub struct ConfigResolver {
    sources: Option<ConfigSources>,
    registry: Arc<TaskRegistry>,
    models: Arc<ModelCatalog>,
    current: RwLock<Arc<Snapshot>>,
    reload_lock: Mutex<()>,
    closed: AtomicBool,
}

impl ConfigResolver {
    /// Loads and cross-validates every document of `sources`.
    ///
    /// # Errors
    ///
    /// Returns the first load error. Callers should treat it as fatal.
    pub fn load(sources: ConfigSources) -> Result<Self> {
        let registry = TaskRegistry::load(&sources.tasks)?;
        let models = ModelCatalog::load(&sources.models)?;
        let catalog = ParameterCatalog::load(&sources.parameters)?;
        let overrides = TaskOverrideTable::load(&sources.overrides)?;
        let documentation = load_documentation(&sources)?;

        let mut resolver =
            Self::from_parts(catalog, overrides, registry, models)?.with_documentation(documentation)?;
        resolver.sources = Some(sources);
        Ok(resolver)
    }

    /// Loads the documents compiled into the crate.
    ///
    /// # Errors
    ///
    /// Fails only if the bundled documents are inconsistent.
    pub fn builtin() -> Result<Self> {
        Self::load(ConfigSources::builtin())
    }

    /// Builds a resolver from already loaded parts.
    ///
    /// The resulting resolver has no sources and no documentation, so
    /// [`Self::reload`] fails with [`Error::NotReloadable`].
    ///
    /// # Errors
    ///
    /// Fails if an override targets an unregistered task or a parameter
    /// missing from the catalog.
    pub fn from_parts(
        catalog: ParameterCatalog,
        overrides: TaskOverrideTable,
        registry: TaskRegistry,
        models: ModelCatalog,
    ) -> Result<Self> {
        overrides.validate(&catalog, &registry)?;

        let snapshot = Snapshot::new(
            Arc::new(catalog),
            Arc::new(overrides),
            Arc::new(ParameterDocs::empty()),
            1,
        );
        tracing::info!(
            target: TRACING_TARGET_RESOLVER,
            tasks = registry.len(),
            parameters = snapshot.catalog.len(),
            overrides = snapshot.overrides.len(),
            models = models.len(),
            "config resolver ready"
        );

        Ok(Self {
            sources: None,
            registry: Arc::new(registry),
            models: Arc::new(models),
            current: RwLock::new(Arc::new(snapshot)),
            reload_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
        })
    }

    /// Attaches parameter documentation to the current snapshot.
    ///
    /// # Errors
    ///
    /// Fails if an entry describes a parameter or option the catalog lacks.
    pub fn with_documentation(mut self, documentation: ParameterDocs) -> Result<Self> {
        let current = self.current.get_mut().unwrap_or_else(PoisonError::into_inner);
        documentation.validate(&current.catalog)?;

        tracing::debug!(
            target: TRACING_TARGET_RESOLVER,
            documented = documentation.len(),
            "parameter documentation attached"
        );
        *current = Arc::new(Snapshot::new(
            Arc::clone(&current.catalog),
            Arc::clone(&current.overrides),
            Arc::new(documentation),
            current.generation,
        ));
        Ok(self)
    }

    /// Returns the current snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&current)
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn models(&self) -> &ModelCatalog {
        &self.models
    }

    pub fn sources(&self) -> Option<&ConfigSources> {
        self.sources.as_ref()
    }

    /// Resolves `stage` for the registered `task`.
    ///
    /// Parameters are returned in catalog order. A stage without catalog
    /// entries resolves to an empty view; a stage the task does not list
    /// still resolves to the catalog view. Inconsistent overrides are
    /// reported on the affected parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTask`] if the task is not registered.
    pub fn resolve(&self, task: &str, stage: Stage) -> Result<StageResolution> {
        self.registry.describe(task)?;
        Ok(self.snapshot().resolve(task, stage))
    }

    /// Resolves one parameter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTask`] or [`Error::UnknownParameter`].
    pub fn resolve_parameter(&self, task: &str, stage: Stage, name: &str) -> Result<ResolvedParameter> {
        self.registry.describe(task)?;
        self.snapshot()
            .resolve_parameter(task, stage, name)
            .ok_or_else(|| Error::UnknownParameter {
                stage,
                parameter: name.to_owned(),
            })
    }

    /// Returns the merged ideal value, or `None` for unknown names.
    pub fn resolve_value(&self, task: &str, stage: Stage, name: &str) -> Option<ParamValue> {
        self.resolve_parameter(task, stage, name)
            .ok()
            .map(|parameter| parameter.default_value())
    }

    /// Returns the merged rationale, or `None` for unknown names and
    /// parameters without one.
    pub fn resolve_rationale(&self, task: &str, stage: Stage, name: &str) -> Option<String> {
        self.resolve_parameter(task, stage, name)
            .ok()
            .and_then(|parameter| parameter.into_spec().rationale)
    }

    /// Resolves every stage of `task` against one snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTask`] if the task is not registered.
    pub fn resolve_task(&self, task: &str) -> Result<TaskResolution> {
        let descriptor = self.registry.describe(task)?;
        let snapshot = self.snapshot();
        let stages = descriptor
            .stages
            .iter()
            .map(|&stage| snapshot.resolve(task, stage))
            .collect();

        Ok(TaskResolution {
            task: descriptor.clone(),
            stages,
        })
    }

    /// Re-reads the catalog, override and documentation documents and swaps
    /// them in.
    ///
    /// On any failure the previous snapshot stays active and the error is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Closed`], [`Error::NotReloadable`] or the load error.
    pub fn reload(&self) -> Result<Arc<Snapshot>> {
        let _reloading = self.reload_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let sources = self.reloadable_sources()?;
        let loaded = ParameterCatalog::load(&sources.parameters)
            .map_err(Error::from)
            .and_then(|catalog| {
                let overrides = TaskOverrideTable::load(&sources.overrides)?;
                overrides.validate(&catalog, &self.registry)?;
                let documentation = load_documentation(sources)?;
                documentation.validate(&catalog)?;
                Ok((catalog, overrides, documentation))
            });

        match loaded {
            Ok((catalog, overrides, documentation)) => Ok(self.swap(
                Arc::new(catalog),
                Arc::new(overrides),
                Arc::new(documentation),
            )),
            Err(error) => Err(self.reload_failed(error)),
        }
    }

    /// Re-reads only the override document and swaps it in.
    ///
    /// # Errors
    ///
    /// Same as [`Self::reload`].
    pub fn reload_overrides(&self) -> Result<Arc<Snapshot>> {
        let _reloading = self.reload_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let sources = self.reloadable_sources()?;
        let current = self.snapshot();
        let loaded = TaskOverrideTable::load(&sources.overrides).and_then(|overrides| {
            overrides.validate(&current.catalog, &self.registry)?;
            Ok(overrides)
        });

        match loaded {
            Ok(overrides) => Ok(self.swap(
                Arc::clone(&current.catalog),
                Arc::new(overrides),
                Arc::clone(&current.documentation),
            )),
            Err(error) => Err(self.reload_failed(error.into())),
        }
    }

    /// Stops accepting reloads. Reads keep serving the last snapshot.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::info!(
                target: TRACING_TARGET_RESOLVER,
                generation = self.snapshot().generation,
                "config resolver closed"
            );
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn reloadable_sources(&self) -> Result<&ConfigSources> {
        if self.is_closed() {
            return Err(Error::Closed);
        }
        self.sources.as_ref().ok_or(Error::NotReloadable)
    }

    fn swap(
        &self,
        catalog: Arc<ParameterCatalog>,
        overrides: Arc<TaskOverrideTable>,
        documentation: Arc<ParameterDocs>,
    ) -> Arc<Snapshot> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let snapshot = Arc::new(Snapshot::new(
            catalog,
            overrides,
            documentation,
            current.generation + 1,
        ));
        *current = Arc::clone(&snapshot);
        drop(current);

        tracing::info!(
            target: TRACING_TARGET_RESOLVER,
            generation = snapshot.generation,
            parameters = snapshot.catalog.len(),
            overrides = snapshot.overrides.len(),
            documented = snapshot.documentation.len(),
            "configuration reloaded"
        );
        snapshot
    }

    fn reload_failed(&self, error: Error) -> Error {
        tracing::warn!(
            target: TRACING_TARGET_RESOLVER,
            error = %error,
            generation = self.snapshot().generation,
            "reload failed, keeping previous configuration"
        );
        error
    }
}

/// Loads the optional documentation document of `sources`.
fn load_documentation(sources: &ConfigSources) -> Result<ParameterDocs> {
    match &sources.documentation {
        Some(source) => Ok(ParameterDocs::load(source)?),
        None => Ok(ParameterDocs::empty()),
    }
}
