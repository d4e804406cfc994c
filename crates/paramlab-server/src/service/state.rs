use std::sync::Arc;

use paramlab_core::ConfigResolver;

use crate::service::{ResolverConfig, Result};

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Debug, Clone)]
pub struct ServiceState {
    resolver: Arc<ConfigResolver>,
}

impl ServiceState {
    pub fn new(resolver: ConfigResolver) -> Self {
        Self {
            resolver: Arc::new(resolver),
        }
    }

    /// Loads the resolver described by `config`.
    pub fn from_config(config: &ResolverConfig) -> Result<Self> {
        config.load_resolver().map(Self::new)
    }

    pub fn resolver(&self) -> &Arc<ConfigResolver> {
        &self.resolver
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

impl_di!(resolver: Arc<ConfigResolver>);
