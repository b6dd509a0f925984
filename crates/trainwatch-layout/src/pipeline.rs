use std::collections::HashMap;

use time::{Duration, OffsetDateTime};
use trainwatch_model::{Berth, BerthName, ReportingNumber, Train};
use trainwatch_store::{Selector, Store, UpdateDoc};
use trainwatch_topology::{
    build_graph, prune_isolated, prune_largest_component, prune_long_edges, BuilderConfig,
    CleanerConfig,
};

use crate::error::LayoutError;
use crate::solver::{layout, LayoutConfig};

use trainwatch_model::collections::{BERTHS as BERTH_COLLECTION, TRAINS as TRAIN_COLLECTION};

const STALE_AFTER: Duration = Duration::hours(2);
/// Threshold for the long-edge prune applied after the first layout pass;
/// the initial pass uses `PipelineConfig::cut_d_initial`.
const CUT_D_TIGHTENED: f64 = 0.15;

/// Tunables for [`run`] (`GENERATOR_*`).
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub builder: BuilderConfig,
    pub layout: LayoutConfig,
    /// Long-edge threshold applied after the first layout pass. The second
    /// prune always tightens to the fixed 0.15 the source settled on,
    /// regardless of this value (see DESIGN.md).
    pub cut_d_initial: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            builder: BuilderConfig::default(),
            layout: LayoutConfig::default(),
            cut_d_initial: 0.25,
        }
    }
}

/// Run one full Generator cycle against `store` (the multi-pass build,
/// clean, layout, clean, layout pipeline). Returns `Ok(())` whether or not
/// a write happened; an empty `BERTH` collection is a legitimate no-op, not
/// a failure.
///
/// # Errors
///
/// Propagates [`LayoutError`] from any of the three layout passes; the
/// caller must not perform the write-back step when this returns `Err`,
/// leaving the previous `SELECTED` state intact.
pub async fn run(store: &dyn Store, config: &PipelineConfig) -> Result<(), LayoutError> {
    let berths = load_berths(store).await;
    if berths.is_empty() {
        tracing::info!("no berths in store, skipping this generator run");
        return Ok(());
    }
    let trains = load_trains(store).await;

    clean_stale(store, &berths).await;

    let mut graph = build_graph(&berths, &trains, &config.builder);
    prune_largest_component(&mut graph);

    let mut rng = rand::thread_rng();
    layout(&mut graph, &config.layout, &mut rng)?;

    prune_long_edges(
        &mut graph,
        &CleanerConfig {
            cut_d: config.cut_d_initial,
            fixed_only: false,
        },
    );
    prune_isolated(&mut graph);
    prune_largest_component(&mut graph);
    layout(&mut graph, &config.layout, &mut rng)?;

    prune_long_edges(
        &mut graph,
        &CleanerConfig {
            cut_d: CUT_D_TIGHTENED,
            fixed_only: false,
        },
    );
    prune_isolated(&mut graph);
    prune_largest_component(&mut graph);
    layout(&mut graph, &config.layout, &mut rng)?;

    write_back(store, &berths, &graph).await;
    tracing::info!(nodes = graph.node_count(), "generator run completed");
    Ok(())
}

async fn load_berths(store: &dyn Store) -> HashMap<BerthName, Berth> {
    store
        .scan(BERTH_COLLECTION)
        .await
        .into_iter()
        .filter_map(|doc| match bson::from_document::<Berth>(doc) {
            Ok(berth) => Some((berth.name.clone(), berth)),
            Err(error) => {
                tracing::warn!(%error, "dropping malformed BERTH document");
                None
            }
        })
        .collect()
}

async fn load_trains(store: &dyn Store) -> Vec<Train> {
    store
        .scan(TRAIN_COLLECTION)
        .await
        .into_iter()
        .filter_map(|doc| match bson::from_document::<Train>(doc) {
            Ok(train) => Some(train),
            Err(error) => {
                tracing::warn!(%error, "dropping malformed TRAIN document");
                None
            }
        })
        .collect()
}

/// Any berth whose last report is older than [`STALE_AFTER`] is reset to
/// "no train", without touching `LATEST_TIME`.
async fn clean_stale(store: &dyn Store, berths: &HashMap<BerthName, Berth>) {
    let now = OffsetDateTime::now_utc();
    let vacant = ReportingNumber::vacant();
    for berth in berths.values() {
        if berth.latest_train.is_vacant() {
            continue;
        }
        let Some(latest_time) = berth.latest_time else {
            continue;
        };
        if now - latest_time >= STALE_AFTER {
            store
                .upsert(
                    BERTH_COLLECTION,
                    Selector::eq("NAME", berth.name.to_string()),
                    UpdateDoc::new().set("LATEST_TRAIN", vacant.to_string()),
                )
                .await;
        }
    }
}

async fn write_back(
    store: &dyn Store,
    all_berths: &HashMap<BerthName, Berth>,
    graph: &trainwatch_topology::BerthGraph,
) {
    for name in all_berths.keys() {
        store
            .upsert(
                BERTH_COLLECTION,
                Selector::eq("NAME", name.to_string()),
                UpdateDoc::new().set("SELECTED", false),
            )
            .await;
    }

    for node in graph.node_indices() {
        let data = &graph[node];
        let (Some(lat), Some(lon)) = (data.lat, data.lon) else {
            continue;
        };
        let mut neighbor_names: Vec<String> = graph
            .neighbors(node)
            .map(|n| graph[n].name.to_string())
            .collect();
        neighbor_names.sort_unstable();

        store
            .upsert(
                BERTH_COLLECTION,
                Selector::eq("NAME", data.name.to_string()),
                UpdateDoc::new()
                    .set("SELECTED", true)
                    .set("LATITUDE", lat)
                    .set("LONGITUDE", lon)
                    .set("EDGES", vec![neighbor_names]),
            )
            .await;
    }
}

#[cfg(test)]
mod tests {
    use trainwatch_store::MemoryStore;

    use super::*;

    fn fixed_berth(area: &str, code: &str, lat: f64, lon: f64) -> Berth {
        let mut berth = Berth::new_unfixed(BerthName::from_parts(area, code).unwrap());
        berth.fixed = true;
        berth.latitude = Some(lat);
        berth.longitude = Some(lon);
        berth
    }

    #[tokio::test]
    async fn empty_store_is_a_no_op() {
        let store = MemoryStore::new();
        let result = run(&store, &PipelineConfig::default()).await;
        assert!(result.is_ok());
        assert!(store.scan(BERTH_COLLECTION).await.is_empty());
    }

    #[tokio::test]
    async fn a_connected_pair_of_fixed_berths_gets_selected() {
        let store = MemoryStore::new();
        let a = fixed_berth("MP", "0001", 0.0, 0.0);
        let b = fixed_berth("MP", "0002", 0.000_1, 0.0);
        store.insert(BERTH_COLLECTION, bson::to_document(&a).unwrap()).await;
        store.insert(BERTH_COLLECTION, bson::to_document(&b).unwrap()).await;

        let mut train = Train::new(ReportingNumber::try_from("1A23").unwrap());
        let base = OffsetDateTime::now_utc();
        train.berths.push(a.name.clone());
        train.times.push(base);
        train.berths.push(b.name.clone());
        train.times.push(base + Duration::seconds(10));
        store
            .insert(TRAIN_COLLECTION, bson::to_document(&train).unwrap())
            .await;

        let config = PipelineConfig {
            layout: LayoutConfig {
                k: 1e-6,
                iterations: 50,
                scale: 1e5,
            },
            ..PipelineConfig::default()
        };
        run(&store, &config).await.unwrap();

        let docs = store.scan(BERTH_COLLECTION).await;
        let selected: Vec<Berth> = docs
            .into_iter()
            .map(|doc| bson::from_document(doc).unwrap())
            .collect();
        assert!(selected.iter().all(|b| b.selected));
    }
}
