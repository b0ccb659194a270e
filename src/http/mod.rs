//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID assigned or propagated)
//!     → generate.rs (validate, resolve client, translate, call upstream)
//!     → JSON response {"text"} or {"error"}
//! ```

pub mod generate;
pub mod health;
pub mod request;
pub mod server;

pub use generate::{GenerateRequest, GenerateResponse, API_KEY_HEADER, GENERATE_PATH};
pub use request::{request_id, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
