use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use trainwatch_stomp::FeedCallbacks;
use trainwatch_store::Store;
use tracing::warn;

use crate::decoder::FeedDecoder;
use crate::registry::FeedDescriptor;

/// Routes STOMP destinations to their feed's decoder and holds the shared
/// store the decoders write into ("identifies the feed by
/// matching the payload's destination header to a feed's topic set, and
/// dispatches the payload to that feed's decoder").
pub struct FeedDispatcher {
    store: Arc<dyn Store>,
    routes: HashMap<String, Arc<dyn FeedDecoder>>,
}

impl FeedDispatcher {
    /// Build a dispatcher for exactly the feeds in `descriptors` — callers
    /// filter `registry::known_feeds()` down to the ones a deployment has
    /// enabled before constructing this.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, descriptors: &[FeedDescriptor]) -> Self {
        let mut routes = HashMap::new();
        for descriptor in descriptors {
            for subscription in &descriptor.subscriptions {
                routes.insert(subscription.topic.clone(), Arc::clone(&descriptor.decoder));
            }
        }
        Self { store, routes }
    }
}

#[async_trait]
impl FeedCallbacks for FeedDispatcher {
    async fn on_message(&self, destination: &str, body: &[u8]) {
        match self.routes.get(destination) {
            Some(decoder) => decoder.decode(self.store.as_ref(), body).await,
            None => warn!(destination, "message on unrecognised destination, dropping"),
        }
    }

    async fn on_error(&self, message: &str) {
        warn!(message, "STOMP broker reported an error");
    }

    async fn on_disconnected(&self) {
        warn!("STOMP connection closed by remote, will reconnect");
    }

    async fn on_heartbeat_timeout(&self) {
        warn!("STOMP heartbeat timeout, will reconnect");
    }
}

#[cfg(test)]
mod tests {
    use trainwatch_store::MemoryStore;

    use super::*;
    use crate::registry::known_feeds;

    #[tokio::test]
    async fn routes_a_ppm_message_to_the_ppm_decoder() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let feeds = known_feeds();
        let dispatcher = FeedDispatcher::new(Arc::clone(&store), &feeds);

        let payload = br#"{
            "RTPPMDataMsgV1": {
                "timestamp": 1609459200000,
                "RTPPMData": { "NationalPage": { "NationalPPM": {
                    "Total": 1, "OnTime": 1, "Late": 0,
                    "PPM": {"text": "100.0"}, "RollingPPM": {"text": "100.0"}
                }}}
            }
        }"#;

        dispatcher.on_message("/topic/RTPPM_ALL", payload).await;

        assert_eq!(store.scan(trainwatch_model::collections::PPM).await.len(), 1);
    }

    #[tokio::test]
    async fn unknown_destination_is_dropped_without_panicking() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let feeds = known_feeds();
        let dispatcher = FeedDispatcher::new(Arc::clone(&store), &feeds);

        dispatcher.on_message("/topic/NOT_A_REAL_FEED", b"whatever").await;

        assert!(store.list_collections().await.is_empty());
    }
}
