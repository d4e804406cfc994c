//! Model catalog handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::routing::get;
use paramlab_core::{ConfigResolver, ModelDescriptor, ModelRole};
use strum::IntoEnumIterator;

use super::request::RolePathParams;
use crate::extract::{Json, Path};
use crate::handler::Result;
use crate::service::ServiceState;

/// Lists every model, grouped by role.
#[tracing::instrument(skip_all)]
async fn list_models(
    State(resolver): State<Arc<ConfigResolver>>,
) -> Json<BTreeMap<ModelRole, Vec<ModelDescriptor>>> {
    let models = ModelRole::iter()
        .map(|role| (role, resolver.models().by_role(role).to_vec()))
        .collect();
    Json(models)
}

/// Lists the models of one role in document order.
#[tracing::instrument(skip_all, fields(role = %path.role))]
async fn list_role_models(
    State(resolver): State<Arc<ConfigResolver>>,
    Path(path): Path<RolePathParams>,
) -> Result<Json<Vec<ModelDescriptor>>> {
    let role = ModelRole::parse(&path.role)?;
    Ok(Json(resolver.models().by_role(role).to_vec()))
}

/// Returns a [`Router`] with model catalog routes.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route("/models", get(list_models))
        .route("/models/{role}", get(list_role_models))
}
