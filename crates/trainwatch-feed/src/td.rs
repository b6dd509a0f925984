use async_trait::async_trait;
use bson::Bson;
use trainwatch_model::{BerthName, ReportingNumber};
use trainwatch_store::{Selector, Store, UpdateDoc};
use tracing::{debug, warn};

use crate::decoder::FeedDecoder;
use crate::error::DecodeError;
use crate::json;
use crate::time_util::from_epoch_ms;

/// TD sub-types that are recognised but intentionally produce no state
/// change ("ignored silently").
const IGNORED_SUB_TYPES: &[&str] = &["CB_MSG", "CT_MSG", "SF_MSG", "SG_MSG", "SH_MSG"];

/// Decodes the train-describer berth-transition feed.
///
/// Each payload is a sequence of single-key envelopes; the sole key names
/// the sub-type. Only `CA_MSG` (berth-step) and `CC_MSG` (berth-interpose)
/// mutate state.
#[derive(Debug, Default)]
pub struct TdDecoder;

#[async_trait]
impl FeedDecoder for TdDecoder {
    async fn decode(&self, store: &dyn Store, payload: &[u8]) {
        let envelopes: Vec<serde_json::Map<String, serde_json::Value>> =
            match serde_json::from_slice(payload) {
                Ok(envelopes) => envelopes,
                Err(err) => {
                    warn!(error = %err, "dropping malformed TD payload");
                    return;
                }
            };

        for envelope in envelopes {
            let Some((sub_type, body)) = envelope.into_iter().next() else {
                continue;
            };

            match sub_type.as_str() {
                "CA_MSG" => match decode_berth_step(&body) {
                    Ok(step) => apply_berth_step(store, step).await,
                    Err(err) => warn!(error = %err, "dropping malformed CA_MSG"),
                },
                "CC_MSG" => match decode_berth_interpose(&body) {
                    Ok(interpose) => apply_berth_interpose(store, interpose).await,
                    Err(err) => warn!(error = %err, "dropping malformed CC_MSG"),
                },
                other if IGNORED_SUB_TYPES.contains(&other) => {}
                other => debug!(sub_type = other, "ignoring unknown TD sub-type"),
            }
        }
    }
}

struct BerthStep {
    descr: ReportingNumber,
    from_name: BerthName,
    to_name: BerthName,
    time: time::OffsetDateTime,
}

fn decode_berth_step(body: &serde_json::Value) -> Result<BerthStep, DecodeError> {
    let descr = ReportingNumber::try_from(json::field_str(body, &["descr"])?)?;
    let area_id = json::field_str(body, &["area_id"])?;
    let from_name = BerthName::from_parts(area_id, json::field_str(body, &["from"])?)?;
    let to_name = BerthName::from_parts(area_id, json::field_str(body, &["to"])?)?;
    let time = from_epoch_ms(json::field_i64(body, &["time"])?)?;

    Ok(BerthStep {
        descr,
        from_name,
        to_name,
        time,
    })
}

async fn apply_berth_step(store: &dyn Store, step: BerthStep) {
    let time = Bson::from(rfc3339(step.time));

    store
        .upsert(
            trainwatch_model::collections::BERTHS,
            Selector::eq("NAME", step.from_name.as_str()),
            UpdateDoc::new()
                .set("LATEST_TRAIN", ReportingNumber::vacant().as_str())
                .set("LATEST_TIME", time.clone())
                .add_to_set("CONNECTIONS", step.to_name.as_str())
                .set_on_insert("FIXED", false),
        )
        .await;

    store
        .upsert(
            trainwatch_model::collections::BERTHS,
            Selector::eq("NAME", step.to_name.as_str()),
            UpdateDoc::new()
                .set("LATEST_TRAIN", step.descr.as_str())
                .set("LATEST_TIME", time)
                .add_to_set("CONNECTIONS", step.from_name.as_str())
                .set_on_insert("FIXED", false),
        )
        .await;

    store
        .append(
            trainwatch_model::collections::TRAINS,
            Selector::eq("NAME", step.descr.as_str()),
            "BERTHS",
            Bson::String(step.to_name.as_str().to_owned()),
        )
        .await;
    store
        .append(
            trainwatch_model::collections::TRAINS,
            Selector::eq("NAME", step.descr.as_str()),
            "TIMES",
            Bson::String(rfc3339(step.time)),
        )
        .await;
}

struct BerthInterpose {
    descr: ReportingNumber,
    to_name: BerthName,
    time: time::OffsetDateTime,
}

fn decode_berth_interpose(body: &serde_json::Value) -> Result<BerthInterpose, DecodeError> {
    let descr = ReportingNumber::try_from(json::field_str(body, &["descr"])?)?;
    let area_id = json::field_str(body, &["area_id"])?;
    let to_name = BerthName::from_parts(area_id, json::field_str(body, &["to"])?)?;
    let time = from_epoch_ms(json::field_i64(body, &["time"])?)?;

    Ok(BerthInterpose { descr, to_name, time })
}

async fn apply_berth_interpose(store: &dyn Store, interpose: BerthInterpose) {
    store
        .upsert(
            trainwatch_model::collections::BERTHS,
            Selector::eq("NAME", interpose.to_name.as_str()),
            UpdateDoc::new()
                .set("LATEST_TRAIN", interpose.descr.as_str())
                .set("LATEST_TIME", rfc3339(interpose.time))
                .set_on_insert("FIXED", false),
        )
        .await;

    store
        .append(
            trainwatch_model::collections::TRAINS,
            Selector::eq("NAME", interpose.descr.as_str()),
            "BERTHS",
            Bson::String(interpose.to_name.as_str().to_owned()),
        )
        .await;
    store
        .append(
            trainwatch_model::collections::TRAINS,
            Selector::eq("NAME", interpose.descr.as_str()),
            "TIMES",
            Bson::String(rfc3339(interpose.time)),
        )
        .await;
}

fn rfc3339(instant: time::OffsetDateTime) -> String {
    instant
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use trainwatch_store::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn ca_msg_creates_two_berths_and_a_train() {
        let store = MemoryStore::new();
        let payload = br#"[{"CA_MSG": {"area_id":"MP","from":"0001","to":"0002","descr":"1A23","time":1609459200000}}]"#;

        TdDecoder.decode(&store, payload).await;

        let berths = store.scan(trainwatch_model::collections::BERTHS).await;
        assert_eq!(berths.len(), 2);
        let from = berths.iter().find(|b| b.get_str("NAME").unwrap() == "MP0001").unwrap();
        assert_eq!(from.get_str("LATEST_TRAIN").unwrap(), "0000");
        assert_eq!(from.get_array("CONNECTIONS").unwrap().len(), 1);

        let to = berths.iter().find(|b| b.get_str("NAME").unwrap() == "MP0002").unwrap();
        assert_eq!(to.get_str("LATEST_TRAIN").unwrap(), "1A23");

        let trains = store.scan(trainwatch_model::collections::TRAINS).await;
        assert_eq!(trains.len(), 1);
        assert_eq!(trains[0].get_array("BERTHS").unwrap().len(), 1);
        assert_eq!(trains[0].get_array("TIMES").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cc_msg_only_touches_the_destination_berth() {
        let store = MemoryStore::new();
        let payload = br#"[{"CC_MSG": {"area_id":"MP","to":"0003","descr":"1A23","time":1609459200000}}]"#;

        TdDecoder.decode(&store, payload).await;

        let berths = store.scan(trainwatch_model::collections::BERTHS).await;
        assert_eq!(berths.len(), 1);
        assert_eq!(berths[0].get_str("NAME").unwrap(), "MP0003");
    }

    #[tokio::test]
    async fn ignored_sub_types_produce_no_mutation() {
        let store = MemoryStore::new();
        let payload = br#"[{"SF_MSG": {"anything": "goes"}}]"#;

        TdDecoder.decode(&store, payload).await;

        assert!(store.scan(trainwatch_model::collections::BERTHS).await.is_empty());
    }

    #[tokio::test]
    async fn unknown_sub_type_is_dropped_not_panicked() {
        let store = MemoryStore::new();
        let payload = br#"[{"ZZ_MSG": {"anything": "goes"}}]"#;

        TdDecoder.decode(&store, payload).await;

        assert!(store.scan(trainwatch_model::collections::BERTHS).await.is_empty());
    }
}
