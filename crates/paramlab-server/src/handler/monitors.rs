//! Service health handler.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use jiff::Timestamp;
use paramlab_core::ConfigResolver;

use super::response::HealthResponse;
use crate::TRACING_TARGET_HANDLER;
use crate::extract::Json;
use crate::service::ServiceState;

/// Reports the active configuration generation.
///
/// Answers 503 once the resolver is closed, so load balancers stop routing
/// to an instance that is shutting down.
#[tracing::instrument(skip_all)]
async fn health_status(
    State(resolver): State<Arc<ConfigResolver>>,
) -> (StatusCode, Json<HealthResponse>) {
    let snapshot = resolver.snapshot();
    let is_healthy = !resolver.is_closed();

    let response = HealthResponse {
        is_healthy,
        generation: snapshot.generation(),
        loaded_at: snapshot.loaded_at(),
        reloadable: resolver.sources().is_some(),
        updated_at: Timestamp::now(),
    };

    let status_code = if is_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    tracing::trace!(
        target: TRACING_TARGET_HANDLER,
        is_healthy,
        generation = response.generation,
        "health status prepared"
    );

    (status_code, Json(response))
}

/// Returns a [`Router`] with the health route.
pub fn routes() -> Router<ServiceState> {
    Router::new().route("/health", get(health_status))
}
