use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info};
use uuid::Uuid;

/// Registry of connected video consumers.
///
/// Producers push opaque binary frames which are fanned out to every
/// registered consumer. Delivery is best-effort and at-most-once: a
/// consumer whose channel is gone is pruned without affecting delivery to
/// the rest, and nothing is queued for consumers that join later. Frames
/// from a single producer reach each consumer in receipt order.
#[derive(Clone)]
pub struct VideoRelay {
    inner: Arc<RelayInner>,
}

struct RelayInner {
    consumers: RwLock<HashMap<Uuid, mpsc::UnboundedSender<Bytes>>>,
}

impl VideoRelay {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RelayInner {
                consumers: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Add a consumer. Returns its id and the frame receiver.
    pub async fn register(&self) -> (Uuid, mpsc::UnboundedReceiver<Bytes>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.consumers.write().await.insert(id, tx);
        info!("Video consumer {} connected", id);
        (id, rx)
    }

    pub async fn unregister(&self, id: Uuid) {
        if self.inner.consumers.write().await.remove(&id).is_some() {
            info!("Video consumer {} disconnected", id);
        }
    }

    /// Fan a frame out to every consumer. A failed send marks that
    /// consumer dead and it is dropped from the registry; the others
    /// still receive the frame.
    pub async fn broadcast(&self, frame: Bytes) {
        let dead: Vec<Uuid> = {
            let consumers = self.inner.consumers.read().await;
            consumers
                .iter()
                .filter(|(_, tx)| tx.send(frame.clone()).is_err())
                .map(|(id, _)| *id)
                .collect()
        };

        if !dead.is_empty() {
            let mut consumers = self.inner.consumers.write().await;
            for id in dead {
                consumers.remove(&id);
                debug!("Pruned dead video consumer {}", id);
            }
        }
    }

    pub async fn consumer_count(&self) -> usize {
        self.inner.consumers.read().await.len()
    }
}

impl Default for VideoRelay {
    fn default() -> Self {
        Self::new()
    }
}
