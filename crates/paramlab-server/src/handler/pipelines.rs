//! Pipeline request assembly.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::routing::post;
use paramlab_core::{ConfigResolver, PipelineRequest};

use super::request::{PipelineBody, TaskPathParams};
use crate::TRACING_TARGET_HANDLER;
use crate::extract::{Json, Path};
use crate::handler::Result;
use crate::service::ServiceState;

/// Builds the orchestrator input for a task from the resolved defaults,
/// the submitted edits and the model choices.
///
/// A missing body is the same as `{}`.
#[tracing::instrument(skip_all, fields(task = %path.task))]
async fn build_pipeline(
    State(resolver): State<Arc<ConfigResolver>>,
    Path(path): Path<TaskPathParams>,
    body: Option<Json<PipelineBody>>,
) -> Result<Json<PipelineRequest>> {
    let Json(body) = body.unwrap_or_default();
    let (edits, choices) = body.into_parts();

    let request = resolver.pipeline_request(&path.task, &edits, &choices)?;

    tracing::info!(
        target: TRACING_TARGET_HANDLER,
        models = request.models.len(),
        issues = request.issues.len(),
        "pipeline request built"
    );

    Ok(Json(request))
}

/// Returns a [`Router`] with pipeline routes.
pub fn routes() -> Router<ServiceState> {
    Router::new().route("/tasks/{task}/pipeline", post(build_pipeline))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use super::*;
    use crate::handler::test::create_test_server_with_router;

    #[tokio::test]
    async fn empty_body_uses_defaults_and_first_models() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;

        let response = server.post("/tasks/RAG-based%20QA/pipeline").await;
        response.assert_status_ok();

        let body = response.json::<Value>();
        assert_eq!(body["task"], "RAG-based QA");
        assert_eq!(body["decoding"]["top_k"], 20);
        assert_eq!(body["models"]["encoder"], "all-MiniLM-L6-v2");
        assert_eq!(body["models"]["decoder"], "gpt2");

        Ok(())
    }

    #[tokio::test]
    async fn edits_are_cast_to_the_parameter_type() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;

        let response = server
            .post("/tasks/Normal%20QA/pipeline")
            .json(&json!({
                "decoding": {"top_k": "12"},
                "models": {"encoder_decoder": "t5-small"}
            }))
            .await;
        response.assert_status_ok();

        let body = response.json::<Value>();
        assert_eq!(body["decoding"]["top_k"], 12);
        assert_eq!(body["models"]["encoder_decoder"], "t5-small");

        Ok(())
    }

    #[tokio::test]
    async fn invalid_edits_are_bad_requests() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;

        let response = server
            .post("/tasks/Normal%20QA/pipeline")
            .json(&json!({"decoding": {"top_k": "many"}}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["context"], "decoding.top_k");

        let response = server
            .post("/tasks/Normal%20QA/pipeline")
            .json(&json!({"models": {"decoder": "gpt2"}}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["resource"], "model_role");

        let response = server
            .post("/tasks/Normal%20QA/pipeline")
            .json(&json!({"postprocessing": {}}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        Ok(())
    }

    #[tokio::test]
    async fn unknown_model_is_not_found() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;

        let response = server
            .post("/tasks/Summarisation/pipeline")
            .json(&json!({"models": {"encoder_decoder": "gpt2"}}))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["context"], "gpt2");

        Ok(())
    }
}
