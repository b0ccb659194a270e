//! In-memory fakes for the upstream traits.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::upstream::client::{ClientFactory, GenerationClient};
use crate::upstream::content::Content;
use crate::upstream::types::{UpstreamError, UpstreamResult};

/// What a fake client answers with.
#[derive(Clone)]
pub enum Reply {
    Text(String),
    Status(u16, String),
}

/// Factory that counts constructions and hands out [`RecordingClient`]s
/// sharing one call log.
pub struct RecordingFactory {
    reply: Reply,
    created: AtomicUsize,
    credentials: Mutex<Vec<String>>,
    calls: Arc<Mutex<Vec<Vec<Content>>>>,
}

impl RecordingFactory {
    pub fn new(text: &str) -> Self {
        Self::with_reply(Reply::Text(text.to_string()))
    }

    pub fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            created: AtomicUsize::new(0),
            credentials: Mutex::new(Vec::new()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn credentials(&self) -> Vec<String> {
        self.credentials.lock().unwrap().clone()
    }

    /// Content sequences received by any client from this factory.
    pub fn calls(&self) -> Vec<Vec<Content>> {
        self.calls.lock().unwrap().clone()
    }
}

impl ClientFactory for RecordingFactory {
    fn create(&self, credential: &str) -> UpstreamResult<Arc<dyn GenerationClient>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        self.credentials.lock().unwrap().push(credential.to_string());
        Ok(Arc::new(RecordingClient {
            reply: self.reply.clone(),
            calls: self.calls.clone(),
        }))
    }
}

pub struct RecordingClient {
    reply: Reply,
    calls: Arc<Mutex<Vec<Vec<Content>>>>,
}

#[async_trait]
impl GenerationClient for RecordingClient {
    async fn generate(&self, contents: &[Content]) -> UpstreamResult<String> {
        self.calls.lock().unwrap().push(contents.to_vec());
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Status(status, message) => Err(UpstreamError::Api {
                status: *status,
                message: message.clone(),
            }),
        }
    }
}

/// Factory that rejects every credential.
pub struct FailingFactory;

impl ClientFactory for FailingFactory {
    fn create(&self, _credential: &str) -> UpstreamResult<Arc<dyn GenerationClient>> {
        Err(UpstreamError::InvalidCredential("rejected".into()))
    }
}
