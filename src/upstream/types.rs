//! Upstream error definitions and wire types for the `generateContent` API.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while talking to the generative API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The credential was rejected before any request was made.
    #[error("Invalid API key: {0}")]
    InvalidCredential(String),

    /// Client settings could not be turned into a working client.
    #[error("Upstream configuration error: {0}")]
    Configuration(String),

    /// Network, TLS or body decoding failure.
    #[error("Upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("{status} {message}")]
    Api { status: u16, message: String },

    /// The API answered successfully but produced no text.
    #[error("Response contained no text: {0}")]
    EmptyResponse(String),
}

/// Result type for upstream operations.
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Request body for `models/{model}:generateContent`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateContentRequest {
    pub contents: Vec<WireContent>,
}

/// One conversational turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WireContent {
    pub role: String,
    pub parts: Vec<WirePart>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum WirePart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(alias = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InlineData {
    #[serde(alias = "mimeType")]
    pub mime_type: String,
    pub data: String,
}

/// Successful response body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

/// Error envelope returned with non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub message: String,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    ///
    /// Mirrors the behavior of the official SDKs: a response without any
    /// candidate text is an error rather than an empty string.
    pub fn into_text(self) -> UpstreamResult<String> {
        let block_reason = self
            .prompt_feedback
            .and_then(|f| f.block_reason);

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(UpstreamError::EmptyResponse(match block_reason {
                Some(reason) => format!("prompt blocked ({reason})"),
                None => "no candidates returned".to_string(),
            }));
        };

        let texts: Vec<String> = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if texts.is_empty() {
            let reason = candidate
                .finish_reason
                .unwrap_or_else(|| "UNKNOWN".to_string());
            return Err(UpstreamError::EmptyResponse(format!(
                "finish reason {reason}"
            )));
        }

        Ok(texts.concat())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_parts_are_concatenated() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Hello, "}, {"text": "world"}]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(response.into_text().unwrap(), "Hello, world");
    }

    #[test]
    fn test_blocked_prompt() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        let err = response.into_text().unwrap_err();
        assert_eq!(err.to_string(), "Response contained no text: prompt blocked (SAFETY)");
    }

    #[test]
    fn test_candidate_without_text() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"finishReason": "RECITATION"}]
        }))
        .unwrap();
        assert!(response
            .into_text()
            .unwrap_err()
            .to_string()
            .contains("RECITATION"));
    }

    #[test]
    fn test_request_serialization() {
        let request = GenerateContentRequest {
            contents: vec![WireContent {
                role: "user".into(),
                parts: vec![
                    WirePart::Text { text: "hi".into() },
                    WirePart::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/png".into(),
                            data: "AAAA".into(),
                        },
                    },
                ],
            }],
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"contents": [{"role": "user", "parts": [
                {"text": "hi"},
                {"inline_data": {"mime_type": "image/png", "data": "AAAA"}}
            ]}]})
        );
    }
}
