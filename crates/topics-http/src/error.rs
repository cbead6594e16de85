use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The server has already been started.
    #[error("The server has already been started")]
    AlreadyStarted,

    /// Failed to bind to address.
    #[error("Failed to bind to address: {0}")]
    Bind(#[from] std::io::Error),
}

/// An error response with a JSON body.
#[derive(Debug)]
pub(crate) struct ApiError {
    message: String,
    status: StatusCode,
}

impl ApiError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: StatusCode::BAD_REQUEST,
        }
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: StatusCode::NOT_FOUND,
        }
    }
}

impl From<topicbridge_topics::Error> for ApiError {
    fn from(error: topicbridge_topics::Error) -> Self {
        use topicbridge_topics::Error as E;

        let status = match &error {
            E::TopicNotFound(_) => StatusCode::NOT_FOUND,
            E::AlreadySubscribed(_) | E::TopicNotCreated(_) => StatusCode::CONFLICT,
            E::Remote { .. } => StatusCode::BAD_GATEWAY,
            E::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            E::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        Self {
            message: error.to_string(),
            status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
