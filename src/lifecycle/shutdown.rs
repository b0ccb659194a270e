//! Stop signal shared by the binary, the HTTP server and tests.

use tokio::sync::broadcast;

/// Handle that tells running servers to stop accepting connections and drain.
///
/// Clones share one channel, so a clone moved into a signal task can stop
/// servers subscribed through the original.
#[derive(Clone, Debug)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver to pass to [`HttpServer::run`](crate::HttpServer::run).
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Ask every subscribed server to drain. Returns how many were notified;
    /// zero when none are running.
    pub fn trigger(&self) -> usize {
        self.tx.send(()).unwrap_or(0)
    }

    /// Servers still holding a receiver.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
