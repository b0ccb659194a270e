//! Relay error taxonomy and its HTTP mapping.
//!
//! Three validation failures carry fixed statuses and messages. Everything
//! else is reported as 500 with the failure's own description.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::upstream::{ContentError, UpstreamError};

/// Errors produced while handling a generation request.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Body absent, unparseable, or not a non-empty JSON object.
    #[error("Invalid JSON input")]
    InvalidInput,

    /// The `X-API-Key` header was absent or empty.
    #[error("API key is missing")]
    MissingCredential,

    /// `prompt` absent, empty, or not a string.
    #[error("Prompt is required")]
    MissingPrompt,

    /// `images` present but not an array of strings.
    #[error("'images' must be an array of base64 strings")]
    MalformedImages,

    /// An image failed to decode.
    #[error(transparent)]
    InvalidImage(#[from] ContentError),

    /// Client construction or the generation call failed.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// The image decoding task panicked or was cancelled.
    #[error("Image decoding task failed: {0}")]
    DecodeTask(#[from] tokio::task::JoinError),
}

impl RelayError {
    /// HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::InvalidInput | RelayError::MissingPrompt => StatusCode::BAD_REQUEST,
            RelayError::MissingCredential => StatusCode::UNAUTHORIZED,
            RelayError::MalformedImages
            | RelayError::InvalidImage(_)
            | RelayError::Upstream(_)
            | RelayError::DecodeTask(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether this is one of the validation failures detected before any
    /// upstream interaction.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            RelayError::InvalidInput | RelayError::MissingCredential | RelayError::MissingPrompt
        )
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
