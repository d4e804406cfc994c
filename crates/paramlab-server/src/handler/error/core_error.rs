//! Resolver error to HTTP error conversion.

use std::error::Error as StdError;

use paramlab_core::Error as CoreError;

use crate::TRACING_TARGET_HANDLER;
use crate::handler::{Error, ErrorKind};

impl From<CoreError> for Error<'static> {
    fn from(error: CoreError) -> Self {
        let message = error.to_string();
        match error {
            CoreError::UnknownTask { task } => ErrorKind::NotFound
                .with_message(message)
                .with_resource("task")
                .with_context(task),
            CoreError::UnknownStage { stage } => ErrorKind::NotFound
                .with_message(message)
                .with_resource("stage")
                .with_context(stage),
            CoreError::UnknownParameter { stage, parameter } => ErrorKind::NotFound
                .with_message(message)
                .with_resource("parameter")
                .with_context(format!("{stage}.{parameter}")),
            CoreError::UnknownModelRole { role } => ErrorKind::NotFound
                .with_message(message)
                .with_resource("model_role")
                .with_context(role),
            CoreError::UnknownModel { model, .. } => ErrorKind::NotFound
                .with_message(message)
                .with_resource("model")
                .with_context(model),

            CoreError::InapplicableStage { stage, .. } => ErrorKind::BadRequest
                .with_message(message)
                .with_resource("stage")
                .with_context(stage.to_string()),
            CoreError::InapplicableModelRole { role, .. } => ErrorKind::BadRequest
                .with_message(message)
                .with_resource("model_role")
                .with_context(role.to_string()),
            CoreError::InvalidValue { stage, parameter, .. } => ErrorKind::BadRequest
                .with_message(message)
                .with_resource("parameter")
                .with_context(format!("{stage}.{parameter}")),

            CoreError::NotReloadable => ErrorKind::Conflict.with_message(message),
            CoreError::Closed => ErrorKind::ServiceUnavailable.with_message(message),
            CoreError::NoModelForRole { .. } => {
                tracing::error!(
                    target: TRACING_TARGET_HANDLER,
                    error = %message,
                    "model catalog has an empty role"
                );
                ErrorKind::InternalServerError.with_message(message)
            }

            ref load if load.is_load_error() => {
                let error = ErrorKind::UnprocessableEntity
                    .with_message(message)
                    .with_resource("config");
                match source_chain(load) {
                    Some(context) => error.with_context(context),
                    None => error,
                }
            }
            other => {
                tracing::error!(
                    target: TRACING_TARGET_HANDLER,
                    error = %other,
                    "unmapped resolver error"
                );
                ErrorKind::InternalServerError.into_error()
            }
        }
    }
}

/// Joins the messages of every error in the `source` chain.
fn source_chain(error: &dyn StdError) -> Option<String> {
    let mut messages = Vec::new();
    let mut current = error.source();
    while let Some(source) = current {
        messages.push(source.to_string());
        current = source.source();
    }
    (!messages.is_empty()).then(|| messages.join(": "))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use paramlab_core::param::Stage;
    use paramlab_core::{CatalogLoadError, ModelRole};

    use super::*;

    #[test]
    fn lookups_map_to_not_found() {
        let error: Error = CoreError::UnknownTask {
            task: "Translation".into(),
        }
        .into();
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert_eq!(error.resource(), Some("task"));
        assert_eq!(error.context(), Some("Translation"));

        let error: Error = CoreError::UnknownParameter {
            stage: Stage::Decoding,
            parameter: "top_q".into(),
        }
        .into();
        assert_eq!(error.kind().status_code(), StatusCode::NOT_FOUND);
        assert_eq!(error.context(), Some("decoding.top_q"));
    }

    #[test]
    fn invalid_edits_map_to_bad_request() {
        let error: Error = CoreError::InapplicableModelRole {
            task: "Normal QA".into(),
            role: ModelRole::Encoder,
        }
        .into();
        assert_eq!(error.kind(), ErrorKind::BadRequest);
        assert_eq!(error.context(), Some("encoder"));
    }

    #[test]
    fn load_errors_map_to_unprocessable_entity() {
        let error: Error = CoreError::from(CatalogLoadError::UnknownStage {
            stage: "postprocessing".into(),
        })
        .into();
        assert_eq!(error.kind(), ErrorKind::UnprocessableEntity);
        assert_eq!(error.resource(), Some("config"));
    }

    #[test]
    fn lifecycle_errors() {
        let error: Error = CoreError::Closed.into();
        assert_eq!(error.kind(), ErrorKind::ServiceUnavailable);
        let error: Error = CoreError::NotReloadable.into();
        assert_eq!(error.kind(), ErrorKind::Conflict);
    }
}
