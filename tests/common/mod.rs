//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::Value;
use tokio::net::TcpListener;

use generation_relay::{HttpServer, RelayConfig, Shutdown};

/// A request received by the mock upstream.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub api_key: Option<String>,
    pub body: Value,
}

/// How the mock upstream answers.
#[derive(Clone)]
pub enum Behavior {
    Respond(u16, Value),
    Delay(Duration, Value),
}

#[derive(Clone)]
struct MockState {
    behavior: Behavior,
    recorded: Arc<Mutex<Vec<Recorded>>>,
}

/// A mock `generateContent` endpoint.
pub struct MockUpstream {
    pub addr: SocketAddr,
    recorded: Arc<Mutex<Vec<Recorded>>>,
}

impl MockUpstream {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.recorded.lock().unwrap().clone()
    }
}

async fn mock_handler(
    State(state): State<MockState>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.recorded.lock().unwrap().push(Recorded {
        path: uri.path().to_string(),
        api_key: headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });

    match state.behavior {
        Behavior::Respond(status, body) => {
            (StatusCode::from_u16(status).unwrap(), Json(body)).into_response()
        }
        Behavior::Delay(delay, body) => {
            tokio::time::sleep(delay).await;
            (StatusCode::OK, Json(body)).into_response()
        }
    }
}

/// Start a mock upstream on an ephemeral port.
pub async fn start_mock_upstream(behavior: Behavior) -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let recorded = Arc::new(Mutex::new(Vec::new()));

    let app = Router::new()
        .route("/{*path}", post(mock_handler))
        .with_state(MockState {
            behavior,
            recorded: recorded.clone(),
        });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockUpstream { addr, recorded }
}

/// A candidate response carrying `text`.
pub fn text_response(text: &str) -> Value {
    serde_json::json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

/// Start the relay pointed at `base_url`; returns its address and the
/// shutdown handle.
pub async fn start_relay(base_url: &str, configure: impl FnOnce(&mut RelayConfig)) -> (SocketAddr, Shutdown) {
    let mut config = RelayConfig::default();
    config.upstream.base_url = base_url.to_string();
    configure(&mut config);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
