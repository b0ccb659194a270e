//! Client abstractions for the upstream generative API.
//!
//! # Responsibilities
//! - `ClientFactory`: configure a client with a credential
//! - `GenerationClient`: generate text from an ordered content sequence
//!
//! The relay only ever sees these traits; the Gemini implementation lives in
//! `gemini.rs` and tests substitute in-memory fakes.

use std::sync::Arc;

use async_trait::async_trait;

use crate::upstream::content::Content;
use crate::upstream::types::UpstreamResult;

/// A client bound to one credential.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Run one generation call and return the produced text.
    async fn generate(&self, contents: &[Content]) -> UpstreamResult<String>;
}

/// Constructs credential-bound clients.
pub trait ClientFactory: Send + Sync {
    /// Build a client authenticated with `credential`.
    ///
    /// Fails only when the credential or settings are rejected locally;
    /// no network traffic happens here.
    fn create(&self, credential: &str) -> UpstreamResult<Arc<dyn GenerationClient>>;
}
