//! Task listing and parameter resolution handlers.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::routing::get;
use paramlab_core::param::Stage;
use paramlab_core::{ConfigResolver, ResolvedParameter, StageResolution, TaskDescriptor, TaskResolution};

use super::request::{ParameterPathParams, StagePathParams, TaskPathParams};
use crate::TRACING_TARGET_HANDLER;
use crate::extract::{Json, Path};
use crate::handler::Result;
use crate::service::ServiceState;

/// Lists registered tasks in registry order.
#[tracing::instrument(skip_all)]
async fn list_tasks(
    State(resolver): State<Arc<ConfigResolver>>,
) -> Json<Vec<TaskDescriptor>> {
    Json(resolver.registry().descriptors().to_vec())
}

/// Returns one task descriptor.
#[tracing::instrument(skip_all, fields(task = %path.task))]
async fn describe_task(
    State(resolver): State<Arc<ConfigResolver>>,
    Path(path): Path<TaskPathParams>,
) -> Result<Json<TaskDescriptor>> {
    let descriptor = resolver.registry().describe(&path.task)?;
    Ok(Json(descriptor.clone()))
}

/// Resolves every stage the task uses.
#[tracing::instrument(skip_all, fields(task = %path.task))]
async fn resolve_task(
    State(resolver): State<Arc<ConfigResolver>>,
    Path(path): Path<TaskPathParams>,
) -> Result<Json<TaskResolution>> {
    let resolution = resolver.resolve_task(&path.task)?;

    tracing::debug!(
        target: TRACING_TARGET_HANDLER,
        stages = resolution.stages.len(),
        issues = resolution.issue_count(),
        "task resolved"
    );

    Ok(Json(resolution))
}

#[tracing::instrument(skip_all, fields(task = %path.task, stage = %path.stage))]
async fn resolve_stage(
    State(resolver): State<Arc<ConfigResolver>>,
    Path(path): Path<StagePathParams>,
) -> Result<Json<StageResolution>> {
    let stage = Stage::parse(&path.stage)?;
    let resolution = resolver.resolve(&path.task, stage)?;

    tracing::debug!(
        target: TRACING_TARGET_HANDLER,
        parameters = resolution.len(),
        issues = resolution.issue_count(),
        "stage resolved"
    );

    Ok(Json(resolution))
}

#[tracing::instrument(
    skip_all,
    fields(task = %path.task, stage = %path.stage, parameter = %path.parameter)
)]
async fn resolve_parameter(
    State(resolver): State<Arc<ConfigResolver>>,
    Path(path): Path<ParameterPathParams>,
) -> Result<Json<ResolvedParameter>> {
    let stage = Stage::parse(&path.stage)?;
    let parameter = resolver.resolve_parameter(&path.task, stage, &path.parameter)?;
    Ok(Json(parameter))
}

/// Returns a [`Router`] with task and resolution routes.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route("/tasks", get(list_tasks))
        .route("/tasks/{task}", get(describe_task))
        .route("/tasks/{task}/parameters", get(resolve_task))
        .route("/tasks/{task}/stages/{stage}", get(resolve_stage))
        .route("/tasks/{task}/stages/{stage}/{parameter}", get(resolve_parameter))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::Value;

    use super::*;
    use crate::handler::test::create_test_server_with_router;

    #[tokio::test]
    async fn lists_tasks_in_registry_order() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;

        let response = server.get("/tasks").await;
        response.assert_status_ok();

        let tasks = response.json::<Vec<TaskDescriptor>>();
        let names: Vec<_> = tasks.iter().map(|task| task.name.as_str()).collect();
        assert_eq!(names, ["RAG-based QA", "Normal QA", "Summarisation"]);

        Ok(())
    }

    #[tokio::test]
    async fn describes_task_by_encoded_name() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;

        let response = server.get("/tasks/RAG-based%20QA").await;
        response.assert_status_ok();
        assert_eq!(response.json::<TaskDescriptor>().name, "RAG-based QA");

        Ok(())
    }

    #[tokio::test]
    async fn unknown_task_is_not_found() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;

        let response = server.get("/tasks/Translation/stages/decoding").await;
        response.assert_status(StatusCode::NOT_FOUND);

        let body = response.json::<Value>();
        assert_eq!(body["name"], "not_found");
        assert_eq!(body["resource"], "task");
        assert_eq!(body["context"], "Translation");

        Ok(())
    }

    #[tokio::test]
    async fn unknown_stage_is_not_found() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;

        let response = server.get("/tasks/Normal%20QA/stages/postprocessing").await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["resource"], "stage");

        Ok(())
    }

    #[tokio::test]
    async fn resolves_stage_with_override_applied() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;

        let response = server.get("/tasks/RAG-based%20QA/stages/decoding").await;
        response.assert_status_ok();

        let body = response.json::<Value>();
        assert_eq!(body["task"], "RAG-based QA");
        assert_eq!(body["stage"], "decoding");
        assert_eq!(body["issue_count"], 0);
        assert_eq!(body["parameters"][0]["name"], "temperature");
        assert_eq!(body["parameters"][1]["name"], "top_k");
        assert_eq!(body["parameters"][1]["default_value"], 20);
        assert_eq!(body["parameters"][1]["overridden"][0], "default_value");

        Ok(())
    }

    #[tokio::test]
    async fn legacy_stage_names_are_accepted() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;

        let response = server
            .get("/tasks/Summarisation/stages/decoding_parameters/top_k")
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["name"], "top_k");

        Ok(())
    }

    #[tokio::test]
    async fn parameter_carries_option_documentation() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;

        let response = server.get("/tasks/RAG-based%20QA/stages/encoding/pooling").await;
        response.assert_status_ok();

        let body = response.json::<Value>();
        let documentation = &body["documentation"];
        assert!(documentation["description"].is_string());
        let cls = &documentation["options"]["cls"];
        assert!(cls["description"].is_string());
        assert!(!cls["recommended_for"].as_array().unwrap().is_empty());

        let response = server.get("/tasks/RAG-based%20QA/stages/preprocessing/separator").await;
        response.assert_status_ok();
        assert!(response.json::<Value>().get("documentation").is_none());

        Ok(())
    }

    #[tokio::test]
    async fn missing_parameter_is_not_found() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;

        let response = server.get("/tasks/Normal%20QA/stages/decoding/top_q").await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["context"], "decoding.top_q");

        Ok(())
    }

    #[tokio::test]
    async fn resolves_every_stage_of_a_task() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;

        let response = server.get("/tasks/Summarisation/parameters").await;
        response.assert_status_ok();

        let body = response.json::<Value>();
        assert_eq!(body["task"]["name"], "Summarisation");
        let stages = body["stages"].as_array().unwrap();
        assert_eq!(stages.len(), body["task"]["stages"].as_array().unwrap().len());

        Ok(())
    }
}
