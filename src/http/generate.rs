//! The generation endpoint.
//!
//! Validation happens in a fixed order: body, then credential, then prompt.
//! Only after all three pass is the client cache consulted. Every failure
//! past validation surfaces as a 500 carrying its own message.

use std::time::Instant;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RelayError;
use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::upstream::build_contents;

/// Route served by [`generate_handler`].
pub const GENERATE_PATH: &str = "/api/ai/generate";

/// Header carrying the caller's upstream credential.
pub const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// Successful response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub text: String,
}

/// A request that passed validation.
pub struct GenerateRequest {
    credential: String,
    pub prompt: String,
    pub images: Vec<String>,
}

impl GenerateRequest {
    /// Extract and validate the request fields.
    pub fn parse(headers: &HeaderMap, body: &[u8]) -> Result<Self, RelayError> {
        let object = match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) if !map.is_empty() => map,
            _ => return Err(RelayError::InvalidInput),
        };

        let credential = headers
            .get(&API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or(RelayError::MissingCredential)?
            .to_string();

        let prompt = match object.get("prompt") {
            Some(Value::String(prompt)) if !prompt.is_empty() => prompt.clone(),
            _ => return Err(RelayError::MissingPrompt),
        };

        let images = match object.get("images") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or(RelayError::MalformedImages)
                })
                .collect::<Result<_, _>>()?,
            Some(_) => return Err(RelayError::MalformedImages),
        };

        Ok(Self {
            credential,
            prompt,
            images,
        })
    }

    pub fn credential(&self) -> &str {
        &self.credential
    }
}

impl std::fmt::Debug for GenerateRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerateRequest")
            .field("credential", &"<redacted>")
            .field("prompt_len", &self.prompt.len())
            .field("images", &self.images.len())
            .finish()
    }
}

/// `POST /api/ai/generate`.
pub async fn generate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let start = Instant::now();
    let request_id = request_id(&headers).to_string();

    let response = match generate(&state, &headers, &body).await {
        Ok(text) => {
            tracing::info!(
                request_id = %request_id,
                text_len = text.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Generation succeeded"
            );
            (StatusCode::OK, Json(GenerateResponse { text })).into_response()
        }
        Err(e) if e.is_validation() => {
            tracing::warn!(request_id = %request_id, error = %e, "Rejected generation request");
            e.into_response()
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Generation failed");
            e.into_response()
        }
    };

    metrics::record_request(response.status().as_u16(), start);
    response
}

async fn generate(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<String, RelayError> {
    let request = GenerateRequest::parse(headers, body)?;
    let client = state.clients.get_client(request.credential())?;

    let GenerateRequest { prompt, images, .. } = request;
    let image_count = images.len();
    // Pixel decoding is CPU-bound; keep it off the async workers.
    let contents =
        tokio::task::spawn_blocking(move || build_contents(&prompt, &images)).await??;

    tracing::debug!(images = image_count, "Forwarding to upstream");
    Ok(client.generate(&contents).await?)
}
