//! Known-berth bootstrap.
//!
//! The bundled fixture mirrors what `known_locations.py` assembles at
//! deploy time by joining TIPLOC, CORPUS, and SMART reference data and
//! resolving each berth's grid reference to a lat/lon pair — that join is
//! out of scope here, so the join's *output* ships as a static file instead.

use serde::Deserialize;
use trainwatch_model::collections::BERTHS;
use trainwatch_store::{Selector, Store, UpdateDoc};

const BERTHS_FIXTURE: &str = include_str!("../data/berths.json");

/// One record of the bundled fixture: a berth `NAME` plus its static
/// metadata and authoritative coordinate.
#[derive(Debug, Clone, Deserialize)]
struct BerthSeed {
    name: String,
    td: String,
    berth: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    tiploc: Option<String>,
    #[serde(default)]
    stanox: Option<String>,
    #[serde(default)]
    stanme: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    platform: Option<String>,
    #[serde(default)]
    line: Option<String>,
    #[serde(default)]
    event: Option<String>,
    #[serde(default)]
    offset: Option<String>,
}

/// Load the bundled known-berth fixture into `store`, but only if `BERTHS`
/// does not already exist ("idempotent by design; performed once
/// per fresh store").
pub async fn run(store: &dyn Store) {
    let collections = store.list_collections().await;
    if collections.iter().any(|name| name == BERTHS) {
        tracing::debug!("BERTHS collection already present, skipping known-berth bootstrap");
        return;
    }

    let seeds: Vec<BerthSeed> = match serde_json::from_str(BERTHS_FIXTURE) {
        Ok(seeds) => seeds,
        Err(error) => {
            tracing::warn!(%error, "bundled berths.json is malformed, skipping bootstrap");
            return;
        }
    };

    tracing::info!(count = seeds.len(), "loading known berths into store");
    for seed in seeds {
        let mut update = UpdateDoc::new()
            .set("TD", seed.td)
            .set("BERTH", seed.berth)
            .set("LATITUDE", seed.latitude)
            .set("LONGITUDE", seed.longitude)
            .set("FIXED", true);
        update = set_if_some(update, "TIPLOC", seed.tiploc);
        update = set_if_some(update, "STANOX", seed.stanox);
        update = set_if_some(update, "STANME", seed.stanme);
        update = set_if_some(update, "DESCRIPTION", seed.description);
        update = set_if_some(update, "PLATFORM", seed.platform);
        update = set_if_some(update, "LINE", seed.line);
        update = set_if_some(update, "EVENT", seed.event);
        update = set_if_some(update, "OFFSET", seed.offset);

        store
            .upsert(BERTHS, Selector::eq("NAME", seed.name), update)
            .await;
    }
}

fn set_if_some(update: UpdateDoc, field: &str, value: Option<String>) -> UpdateDoc {
    match value {
        Some(value) => update.set(field, value),
        None => update,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trainwatch_store::MemoryStore;

    #[tokio::test]
    async fn skips_when_berths_already_exists() {
        let store = MemoryStore::new();
        store
            .upsert(BERTHS, Selector::eq("NAME", "MP0001"), UpdateDoc::new().set("FIXED", false))
            .await;
        run(&store).await;

        let rows = store.scan(BERTHS).await;
        assert_eq!(rows.len(), 1, "bootstrap must not touch an existing BERTHS collection");
    }

    #[tokio::test]
    async fn loads_the_bundled_fixture_into_an_empty_store() {
        let store = MemoryStore::new();
        run(&store).await;

        let rows = store.scan(BERTHS).await;
        assert!(!rows.is_empty(), "bundled fixture should seed at least one berth");
        for row in &rows {
            assert_eq!(row.get_bool("FIXED").unwrap(), true);
            assert!(row.get_f64("LATITUDE").is_ok());
            assert!(row.get_f64("LONGITUDE").is_ok());
        }
    }
}
