use async_trait::async_trait;
use trainwatch_store::Store;

/// A payload decoder for one feed ("a mapping from feed
/// identifier to a decode function").
///
/// Decoders own their store mutations directly rather than returning a
/// pure list of them — this mirrors the collector's actual write path
/// ("decoders ... perform blocking store writes") and keeps the
/// malformed-payload short-circuit local to each decoder instead of
/// threading a `Result` back through the feed manager.
#[async_trait]
pub trait FeedDecoder: Send + Sync {
    /// Decode one raw payload and apply whatever store mutations it implies.
    /// Malformed payloads are logged and dropped, never propagated.
    async fn decode(&self, store: &dyn Store, payload: &[u8]);
}
