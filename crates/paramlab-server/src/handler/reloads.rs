//! Configuration reload handlers.
//!
//! Reloads read documents from disk, so they run on the blocking pool. A
//! failed reload answers with the load error while the previous
//! configuration keeps serving.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::routing::post;
use paramlab_core::ConfigResolver;

use super::response::{ReloadResponse, ReloadScope};
use crate::TRACING_TARGET_RELOAD;
use crate::extract::Json;
use crate::handler::{ErrorKind, Result};
use crate::service::ServiceState;

async fn reload(resolver: Arc<ConfigResolver>, scope: ReloadScope) -> Result<Json<ReloadResponse>> {
    let result = tokio::task::spawn_blocking(move || match scope {
        ReloadScope::All => resolver.reload(),
        ReloadScope::Overrides => resolver.reload_overrides(),
    })
    .await;

    let snapshot = match result {
        Ok(Ok(snapshot)) => snapshot,
        Ok(Err(error)) => {
            tracing::warn!(
                target: TRACING_TARGET_RELOAD,
                scope = ?scope,
                error = %error,
                "reload rejected"
            );
            return Err(error.into());
        }
        Err(join_error) => {
            tracing::error!(
                target: TRACING_TARGET_RELOAD,
                error = %join_error,
                "reload task failed"
            );
            return Err(ErrorKind::InternalServerError.with_message("Reload did not complete"));
        }
    };

    tracing::info!(
        target: TRACING_TARGET_RELOAD,
        scope = ?scope,
        generation = snapshot.generation(),
        "configuration reloaded"
    );

    Ok(Json(ReloadResponse::new(scope, &snapshot)))
}

/// Re-reads the parameter catalog and the task overrides.
#[tracing::instrument(skip_all)]
async fn reload_all(
    State(resolver): State<Arc<ConfigResolver>>,
) -> Result<Json<ReloadResponse>> {
    reload(resolver, ReloadScope::All).await
}

/// Re-reads the task overrides against the active catalog.
#[tracing::instrument(skip_all)]
async fn reload_overrides(
    State(resolver): State<Arc<ConfigResolver>>,
) -> Result<Json<ReloadResponse>> {
    reload(resolver, ReloadScope::Overrides).await
}

/// Returns a [`Router`] with reload routes.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route("/config/reload", post(reload_all))
        .route("/config/reload/overrides", post(reload_overrides))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use axum::http::StatusCode;
    use paramlab_core::{ConfigSources, OVERRIDES_FILE};
    use serde_json::Value;

    use super::*;
    use crate::handler::test::{create_test_server_with_state, write_builtin_documents};
    use crate::service::ResolverConfig;

    #[tokio::test]
    async fn reload_bumps_generation() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        write_builtin_documents(dir.path())?;
        let state = ServiceState::from_config(&ResolverConfig::with_config_dir(dir.path()))?;
        let server = create_test_server_with_state(routes(), state)?;

        let response = server.post("/config/reload").await;
        response.assert_status_ok();

        let body = response.json::<ReloadResponse>();
        assert_eq!(body.scope, ReloadScope::All);
        assert_eq!(body.generation, 2);

        Ok(())
    }

    #[tokio::test]
    async fn failed_reload_keeps_serving_previous_configuration() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        write_builtin_documents(dir.path())?;
        let state = ServiceState::from_config(&ResolverConfig::with_config_dir(dir.path()))?;
        let server = create_test_server_with_state(routes(), state.clone())?;

        fs::write(dir.path().join(OVERRIDES_FILE), "{ not json")?;
        let response = server.post("/config/reload/overrides").await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.json::<Value>()["resource"], "config");

        let snapshot = state.resolver().snapshot();
        assert_eq!(snapshot.generation(), 1);
        assert!(!snapshot.overrides().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn resolver_without_sources_cannot_reload() -> anyhow::Result<()> {
        let loaded = ConfigResolver::load(ConfigSources::builtin())?;
        let snapshot = loaded.snapshot();
        let resolver = ConfigResolver::from_parts(
            snapshot.catalog().clone(),
            snapshot.overrides().clone(),
            loaded.registry().clone(),
            loaded.models().clone(),
        )?;
        let server = create_test_server_with_state(routes(), ServiceState::new(resolver))?;

        server
            .post("/config/reload")
            .await
            .assert_status(StatusCode::CONFLICT);

        Ok(())
    }
}
