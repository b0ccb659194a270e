//! Upstream generative API subsystem.
//!
//! # Data Flow
//! ```text
//! Validated request (credential, prompt, images)
//!     → cache.rs (credential → client, built once via ClientFactory)
//!     → content.rs (prompt + decoded images → Vec<Content>)
//!     → client.rs / gemini.rs (generateContent call)
//!     → generated text or UpstreamError
//! ```
//!
//! # Design Decisions
//! - One client per credential for the process lifetime, no eviction
//! - All Gemini clients share one reqwest connection pool
//! - Credentials never appear in logs or Debug output

pub mod cache;
pub mod client;
pub mod content;
pub mod gemini;
pub mod types;

#[cfg(test)]
pub(crate) mod testutils;

pub use cache::ClientCache;
pub use client::{ClientFactory, GenerationClient};
pub use content::{build_contents, Content, ContentError, DecodedImage};
pub use gemini::{GeminiClient, GeminiClientFactory};
pub use types::{UpstreamError, UpstreamResult};
