use async_trait::async_trait;
use trainwatch_model::Ppm;
use trainwatch_store::Store;
use tracing::warn;

use crate::decoder::FeedDecoder;
use crate::error::DecodeError;
use crate::json;
use crate::time_util::from_epoch_ms;

const NATIONAL_PPM: &[&str] = &[
    "RTPPMDataMsgV1",
    "RTPPMData",
    "NationalPage",
    "NationalPPM",
];

/// Decodes the national performance-measure feed.
#[derive(Debug, Default)]
pub struct PpmDecoder;

impl PpmDecoder {
    fn parse(payload: &[u8]) -> Result<Ppm, DecodeError> {
        let value: serde_json::Value = serde_json::from_slice(payload)?;
        let national = json::field(&value, NATIONAL_PPM)?;

        let total = json::field_i64(national, &["Total"])?;
        let on_time = json::field_i64(national, &["OnTime"])?;
        let late = json::field_i64(national, &["Late"])?;
        let ppm = json::field_f64(national, &["PPM", "text"])?;
        let rolling_ppm = json::field_f64(national, &["RollingPPM", "text"])?;
        let timestamp_ms = json::field_i64(&value, &["RTPPMDataMsgV1", "timestamp"])?;

        Ok(Ppm {
            date: from_epoch_ms(timestamp_ms)?,
            total,
            on_time,
            late,
            ppm,
            rolling_ppm,
        })
    }
}

#[async_trait]
impl FeedDecoder for PpmDecoder {
    async fn decode(&self, store: &dyn Store, payload: &[u8]) {
        let record = match Self::parse(payload) {
            Ok(record) => record,
            Err(err) => {
                warn!(error = %err, "dropping malformed PPM payload");
                return;
            }
        };

        match bson::to_document(&record) {
            Ok(document) => store.insert(trainwatch_model::collections::PPM, document).await,
            Err(err) => warn!(error = %err, "failed to serialize PPM record"),
        }
    }
}

#[cfg(test)]
mod tests {
    use trainwatch_store::MemoryStore;

    use super::*;

    const PAYLOAD: &str = r#"{
        "RTPPMDataMsgV1": {
            "timestamp": 1609459200000,
            "RTPPMData": {
                "NationalPage": {
                    "NationalPPM": {
                        "Total": 1000,
                        "OnTime": 900,
                        "Late": 100,
                        "PPM": { "text": "90.0" },
                        "RollingPPM": { "text": "91.5" }
                    }
                }
            }
        }
    }"#;

    #[test]
    fn parses_the_national_ppm_envelope() {
        let record = PpmDecoder::parse(PAYLOAD.as_bytes()).unwrap();
        assert_eq!(record.total, 1000);
        assert_eq!(record.on_time, 900);
        assert_eq!(record.late, 100);
        assert!((record.ppm - 90.0).abs() < f64::EPSILON);
        assert!((record.rolling_ppm - 91.5).abs() < f64::EPSILON);
        assert_eq!(record.date.unix_timestamp(), 1_609_459_200);
    }

    #[tokio::test]
    async fn decode_inserts_one_ppm_document() {
        let store = MemoryStore::new();
        PpmDecoder.decode(&store, PAYLOAD.as_bytes()).await;
        assert_eq!(store.scan(trainwatch_model::collections::PPM).await.len(), 1);
    }

    #[tokio::test]
    async fn malformed_payload_is_dropped_silently() {
        let store = MemoryStore::new();
        PpmDecoder.decode(&store, b"not json").await;
        assert!(store.scan(trainwatch_model::collections::PPM).await.is_empty());
    }
}
