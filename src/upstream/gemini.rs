//! Gemini REST client.
//!
//! # Responsibilities
//! - Build the `generateContent` endpoint for the configured model
//! - Translate the content sequence into request parts
//! - Map error statuses and empty responses to `UpstreamError`

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderValue;
use url::Url;

use crate::config::UpstreamConfig;
use crate::upstream::client::{ClientFactory, GenerationClient};
use crate::upstream::content::Content;
use crate::upstream::types::{
    ApiErrorEnvelope, GenerateContentRequest, GenerateContentResponse, InlineData, UpstreamError,
    UpstreamResult, WireContent, WirePart,
};

/// Header carrying the credential on every upstream call.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Factory producing [`GeminiClient`]s that share one connection pool.
#[derive(Clone)]
pub struct GeminiClientFactory {
    http: reqwest::Client,
    endpoint: Url,
}

impl GeminiClientFactory {
    /// Create a factory from upstream settings.
    pub fn new(config: &UpstreamConfig) -> UpstreamResult<Self> {
        let endpoint = generate_endpoint(&config.base_url, &config.model)?;

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build()?;

        tracing::info!(
            endpoint = %endpoint,
            timeout_secs = ?config.timeout_secs,
            "Gemini client factory initialized"
        );

        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl ClientFactory for GeminiClientFactory {
    fn create(&self, credential: &str) -> UpstreamResult<Arc<dyn GenerationClient>> {
        let mut api_key = HeaderValue::from_str(credential)
            .map_err(|_| UpstreamError::InvalidCredential("contains invalid characters".into()))?;
        api_key.set_sensitive(true);

        Ok(Arc::new(GeminiClient {
            http: self.http.clone(),
            endpoint: self.endpoint.clone(),
            api_key,
        }))
    }
}

/// A Gemini client bound to a single API key.
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: Url,
    api_key: HeaderValue,
}

impl GeminiClient {
    fn build_request(contents: &[Content]) -> GenerateContentRequest {
        let parts = contents
            .iter()
            .map(|content| match content {
                Content::Text(text) => WirePart::Text { text: text.clone() },
                Content::Image(image) => WirePart::InlineData {
                    inline_data: InlineData {
                        mime_type: image.mime_type().to_string(),
                        data: image.to_base64(),
                    },
                },
            })
            .collect();

        GenerateContentRequest {
            contents: vec![WireContent {
                role: "user".to_string(),
                parts,
            }],
        }
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(&self, contents: &[Content]) -> UpstreamResult<String> {
        let request = Self::build_request(contents);

        let response = self
            .http
            .post(self.endpoint.clone())
            .header(API_KEY_HEADER, self.api_key.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("Upstream error")
                        .to_string()
                });
            tracing::warn!(status = status.as_u16(), "Upstream returned error status");
            return Err(UpstreamError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateContentResponse = response.json().await?;
        body.into_text()
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// `{base}/v1beta/models/{model}:generateContent`, tolerating a trailing slash
/// on the base URL.
fn generate_endpoint(base_url: &str, model: &str) -> UpstreamResult<Url> {
    let base = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&base)
        .and_then(|base| base.join(&format!("v1beta/models/{model}:generateContent")))
        .map_err(|e| UpstreamError::Configuration(format!("invalid base URL '{base_url}': {e}")))
}
