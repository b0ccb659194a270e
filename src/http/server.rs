//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, body limit)
//! - Own the process-wide client cache
//! - Serve on a listener until shutdown

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::config::RelayConfig;
use crate::http::generate::{generate_handler, GENERATE_PATH};
use crate::http::health::health_handler;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::shutdown_signal;
use crate::upstream::{ClientCache, ClientFactory, GeminiClientFactory, UpstreamResult};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub clients: ClientCache,
}

/// HTTP server for the generation relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
    clients: ClientCache,
}

impl HttpServer {
    /// Create a server that talks to the configured Gemini endpoint.
    pub fn new(config: RelayConfig) -> UpstreamResult<Self> {
        let factory = GeminiClientFactory::new(&config.upstream)?;
        Ok(Self::with_factory(config, Arc::new(factory)))
    }

    /// Create a server whose clients come from `factory`.
    pub fn with_factory(config: RelayConfig, factory: Arc<dyn ClientFactory>) -> Self {
        let clients = ClientCache::new(factory);
        let state = AppState {
            clients: clients.clone(),
        };
        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            clients,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        Router::new()
            .route(GENERATE_PATH, post(generate_handler))
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::disable())
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(propagate_request_id_layer())
                    .layer(RequestBodyLimitLayer::new(config.limits.max_body_size)),
            )
    }

    /// Run the server, accepting connections on the given listener until
    /// Ctrl+C or a shutdown broadcast.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            max_body_size = self.config.limits.max_body_size,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        tracing::info!(clients = self.clients.len(), "HTTP server stopped");
        Ok(())
    }

    /// A clone of the router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}
