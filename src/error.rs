//! Unified error handling
//!
//! Schema, routing and persistence failures all funnel into [`ApiError`],
//! which renders a consistent JSON error body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Malformed configuration or payload rejected at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Validation error: {message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ValidationError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// A mutation schema that does not fit the model it is bound to.
///
/// These are developer mistakes and are never swallowed.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error(
        "Got an invalid argument error when calling `{model}.{manager}.create()` from \
         `{schema}.perform_create()`. This may be because you have a writable field on the \
         schema `{schema}` that is not a valid argument to `{model}.{manager}.create()`. \
         You may need to make the field read-only, or override the \
         {schema}.perform_create() method to handle this correctly.\n\
         Original exception was:\n {detail}"
    )]
    CreateArguments {
        model: &'static str,
        manager: String,
        schema: String,
        detail: String,
    },

    #[error(
        "`{schema}` tried to assign `{field}`, which is not a declared field of `{model}`. \
         Remove the field from the schema or add it to `{model}::FIELDS`."
    )]
    UnknownField {
        model: &'static str,
        schema: String,
        field: String,
    },

    #[error("`{schema}` must serialize to a JSON object to be used as a field mapping")]
    NotAnObject { schema: String },
}

/// Errors raised by a persistence [`Manager`](crate::persistence::Manager).
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("{model}() got an unexpected keyword argument '{field}'")]
    UnexpectedArgument { model: &'static str, field: String },

    #[error("Invalid value for {model}: {source}")]
    InvalidValue {
        model: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{model} matching query does not exist (id = {pk})")]
    DoesNotExist { model: &'static str, pk: i64 },

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Persistence(PersistenceError::DoesNotExist { .. }) => StatusCode::NOT_FOUND,
            Self::Persistence(PersistenceError::Constraint(_)) => StatusCode::CONFLICT,
            Self::Persistence(_) | Self::Configuration(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Persistence(PersistenceError::DoesNotExist { .. }) => "NOT_FOUND",
            Self::Persistence(PersistenceError::Constraint(_)) => "CONFLICT",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::NotFound(msg) | Self::BadRequest(msg) => msg.clone(),
            Self::Validation(err) => err.message.clone(),
            Self::Persistence(err @ PersistenceError::DoesNotExist { .. })
            | Self::Persistence(err @ PersistenceError::Constraint(_)) => err.to_string(),
            // Don't leak schema/model internals
            Self::Configuration(_) | Self::Persistence(_) | Self::Internal(_) => {
                "An internal error occurred".to_string()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal(e) => {
                tracing::error!(error = ?e, "Internal server error");
            }
            Self::Configuration(e) => {
                tracing::error!(error = %e, "Schema configuration error");
            }
            Self::Persistence(e) => {
                tracing::error!(error = %e, "Persistence error");
            }
            _ => {
                tracing::warn!(error = %self, "API error");
            }
        }

        let status = self.status_code();
        let body = ErrorResponse {
            code: self.error_code().to_string(),
            message: self.public_message(),
            request_id: None,
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(ValidationError::new("bad")).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(PersistenceError::Constraint("unique".into())).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(ConfigurationError::NotAnObject {
                schema: "TaskSchema".into()
            })
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_configuration_details_are_not_public() {
        let err = ApiError::from(ConfigurationError::CreateArguments {
            model: "Task",
            manager: "objects".into(),
            schema: "CreateTask".into(),
            detail: "Task() got an unexpected keyword argument 'owner'".into(),
        });
        assert_eq!(err.public_message(), "An internal error occurred");
        assert!(err.to_string().contains("Task.objects.create()"));
    }
}
