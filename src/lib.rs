//! Generation relay library.
//!
//! Accepts a prompt plus optional base64 images over HTTP, forwards them to
//! the Gemini `generateContent` API with the caller's own API key, and
//! returns the generated text.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod upstream;

pub use config::RelayConfig;
pub use error::RelayError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
