//! Connection registry backing the update broadcaster.

use dashmap::DashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;
use uuid::Uuid;

use crate::dto::sse::ServerEvent;

/// Buffered events per viewer before fan-out starts dropping for it.
const DEFAULT_VIEWER_BUFFER: usize = 32;

/// Registry of connected viewers, each reachable through a bounded channel.
///
/// Fan-out is at-most-once and never blocks the caller: a viewer whose
/// buffer is full misses that event, a viewer whose channel is closed is
/// pruned. Viewers with a gap re-fetch the snapshot on reconnect.
pub struct ViewerRegistry {
    viewers: DashMap<Uuid, ViewerConnection>,
    buffer: usize,
}

/// Handle used to push events to a single connected viewer.
struct ViewerConnection {
    tx: mpsc::Sender<ServerEvent>,
}

impl ViewerRegistry {
    /// Create an empty registry with the default per-viewer buffer.
    pub fn new() -> Self {
        Self::with_buffer(DEFAULT_VIEWER_BUFFER)
    }

    /// Create an empty registry with an explicit per-viewer buffer size.
    pub fn with_buffer(buffer: usize) -> Self {
        Self {
            viewers: DashMap::new(),
            buffer,
        }
    }

    /// Register a new viewer and hand back its id and event receiver.
    pub fn register(&self) -> (Uuid, mpsc::Receiver<ServerEvent>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(self.buffer);
        self.viewers.insert(id, ViewerConnection { tx });
        (id, rx)
    }

    /// Drop a viewer from the registry, closing its stream.
    pub fn unregister(&self, id: Uuid) {
        self.viewers.remove(&id);
    }

    /// Fan an event out to every registered viewer without blocking.
    pub fn broadcast(&self, event: ServerEvent) {
        let mut disconnected = Vec::new();

        for entry in self.viewers.iter() {
            match entry.value().tx.try_send(event.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    // Slow viewer: this event is lost for it, the stream
                    // itself stays up.
                    debug!(viewer_id = %entry.key(), "viewer buffer full, dropping event");
                }
                Err(TrySendError::Closed(_)) => disconnected.push(*entry.key()),
            }
        }

        for id in disconnected {
            self.viewers.remove(&id);
            debug!(viewer_id = %id, "pruned disconnected viewer");
        }
    }

    /// Number of currently registered viewers.
    pub fn connected(&self) -> usize {
        self.viewers.len()
    }

    /// Tear down every connection, ending all live streams. Called once on
    /// process shutdown.
    pub fn shutdown(&self) {
        self.viewers.clear();
    }
}

impl Default for ViewerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str) -> ServerEvent {
        ServerEvent {
            event: Some(name.to_string()),
            data: "{}".to_string(),
        }
    }

    #[tokio::test]
    async fn broadcast_reaches_every_viewer() {
        let registry = ViewerRegistry::new();
        let (_, mut first) = registry.register();
        let (_, mut second) = registry.register();

        registry.broadcast(event("score_update"));

        assert_eq!(
            first.recv().await.unwrap().event.as_deref(),
            Some("score_update")
        );
        assert_eq!(
            second.recv().await.unwrap().event.as_deref(),
            Some("score_update")
        );
    }

    #[tokio::test]
    async fn dropped_receiver_is_pruned_on_next_broadcast() {
        let registry = ViewerRegistry::new();
        let (_, receiver) = registry.register();
        let (_, mut alive) = registry.register();
        drop(receiver);

        registry.broadcast(event("score_update"));

        assert_eq!(registry.connected(), 1);
        assert!(alive.recv().await.is_some());
    }

    #[tokio::test]
    async fn full_buffer_drops_event_but_keeps_viewer() {
        let registry = ViewerRegistry::with_buffer(1);
        let (_, mut receiver) = registry.register();

        registry.broadcast(event("first"));
        registry.broadcast(event("second"));

        assert_eq!(registry.connected(), 1);
        assert_eq!(receiver.recv().await.unwrap().event.as_deref(), Some("first"));
        // "second" was dropped: nothing else is buffered.
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn shutdown_ends_streams() {
        let registry = ViewerRegistry::new();
        let (_, mut receiver) = registry.register();

        registry.shutdown();

        assert_eq!(registry.connected(), 0);
        assert!(receiver.recv().await.is_none());
    }

    #[tokio::test]
    async fn unregister_removes_single_viewer() {
        let registry = ViewerRegistry::new();
        let (id, _receiver) = registry.register();
        let (_, _other) = registry.register();

        registry.unregister(id);

        assert_eq!(registry.connected(), 1);
    }
}
