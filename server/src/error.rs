use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shared::{ChatResponse, ErrorPayload};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The chat request itself is unusable.
    #[error("{0}")]
    Validation(String),

    /// The body could not be read as a chat request.
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Configuration(String),

    /// The provider call failed. `details` is the provider's error body, kept as-is.
    #[error("{message}")]
    Upstream {
        message: String,
        details: Option<serde_json::Value>,
    },
}

impl GatewayError {
    pub fn upstream(message: impl Into<String>) -> Self {
        GatewayError::Upstream {
            message: message.into(),
            details: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) | GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Configuration(_) | GatewayError::Upstream { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn payload(&self) -> ErrorPayload {
        match self {
            GatewayError::Upstream {
                details: Some(details),
                ..
            } => ErrorPayload::Body(details.clone()),
            other => ErrorPayload::Message(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::upstream(err.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), Json(ChatResponse::failure(self.payload()))).into_response()
    }
}
