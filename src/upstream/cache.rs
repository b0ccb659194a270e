//! Per-credential client cache.
//!
//! Each credential maps to exactly one client for the life of the process.
//! Entries are never evicted, refreshed or expired, so the map grows with
//! the number of distinct credentials presented.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::observability::metrics;
use crate::upstream::client::{ClientFactory, GenerationClient};
use crate::upstream::types::UpstreamResult;

/// A thread-safe credential → client map.
#[derive(Clone)]
pub struct ClientCache {
    clients: Arc<DashMap<String, Arc<dyn GenerationClient>>>,
    factory: Arc<dyn ClientFactory>,
}

impl ClientCache {
    /// Create an empty cache that builds clients with `factory`.
    pub fn new(factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            clients: Arc::new(DashMap::new()),
            factory,
        }
    }

    /// Return the client for `credential`, constructing it on first use.
    ///
    /// Construction runs while the entry's shard is locked, so concurrent
    /// first requests for the same credential build a single client. A
    /// failed construction stores nothing.
    pub fn get_client(&self, credential: &str) -> UpstreamResult<Arc<dyn GenerationClient>> {
        if let Some(client) = self.clients.get(credential) {
            return Ok(client.value().clone());
        }

        let client = match self.clients.entry(credential.to_string()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let client = self.factory.create(credential)?;
                entry.insert(client.clone());
                metrics::record_client_created();
                tracing::debug!("Constructed upstream client for new credential");
                client
            }
        };

        // Shard locks are released here; len() would deadlock while holding one.
        metrics::record_cache_size(self.clients.len());
        Ok(client)
    }

    /// Number of cached clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl std::fmt::Debug for ClientCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCache")
            .field("clients", &self.clients.len())
            .finish()
    }
}
