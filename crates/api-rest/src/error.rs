//! HTTP error rendering.
//!
//! Every error body is `{"message": "..."}`. Internal failures are logged with their full
//! cause and reported with a generic message.

use api_shared::ErrorRes;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use cutis_core::conversation::ChatError;
use cutis_core::CoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorRes {
                message: self.message,
            }),
        )
            .into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidInput(message) => Self::new(StatusCode::BAD_REQUEST, message),
            CoreError::NotFound(message) => Self::new(StatusCode::NOT_FOUND, message),
            CoreError::Chat(ChatError::NotConfigured) => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "Conversations are not available",
            ),
            CoreError::Chat(e) => {
                tracing::error!(error = %e, "conversation model failed");
                Self::new(
                    StatusCode::BAD_GATEWAY,
                    "Failed to get a reply from the assistant",
                )
            }
            other => {
                tracing::error!(error = %other, "request failed");
                Self::internal()
            }
        }
    }
}
