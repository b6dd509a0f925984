use async_trait::async_trait;
use trainwatch_store::Store;
use tracing::{debug, warn};

use crate::decoder::FeedDecoder;
use crate::json;

/// Sub-types accepted by the train-movements feed (`0001`
/// through `0008`). None of them currently produce a state change — the
/// subscription exists so the durable broker replay keeps this feed warm
/// for a future extension.
const KNOWN_SUB_TYPES: &[&str] = &[
    "0001", "0002", "0003", "0004", "0005", "0006", "0007", "0008",
];

/// Decodes the train-movements feed. Every recognised
/// sub-type is a deliberate no-op.
#[derive(Debug, Default)]
pub struct TmDecoder;

#[async_trait]
impl FeedDecoder for TmDecoder {
    async fn decode(&self, _store: &dyn Store, payload: &[u8]) {
        let envelopes: Vec<serde_json::Value> = match serde_json::from_slice(payload) {
            Ok(envelopes) => envelopes,
            Err(err) => {
                warn!(error = %err, "dropping malformed TM payload");
                return;
            }
        };

        for envelope in &envelopes {
            let Ok(msg_type) = json::field_str(envelope, &["header", "msg_type"]) else {
                warn!("TM envelope missing header.msg_type");
                continue;
            };

            if !KNOWN_SUB_TYPES.contains(&msg_type) {
                debug!(msg_type, "ignoring unknown TM sub-type");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use trainwatch_store::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn known_sub_types_produce_no_mutations() {
        let store = MemoryStore::new();
        let payload = br#"[{"header":{"msg_type":"0001"},"body":{}}]"#;

        TmDecoder.decode(&store, payload).await;

        assert!(store.list_collections().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_sub_type_does_not_panic() {
        let store = MemoryStore::new();
        let payload = br#"[{"header":{"msg_type":"9999"},"body":{}}]"#;

        TmDecoder.decode(&store, payload).await;

        assert!(store.list_collections().await.is_empty());
    }
}
