use std::collections::HashMap;

use time::{Duration, OffsetDateTime};
use trainwatch_model::{Berth, BerthName, Train};

use crate::node::BerthNode;
use crate::BerthGraph;

/// Tunables for [`build_graph`] (`GENERATOR_DELTA_B`/`_DELTA_T`).
#[derive(Debug, Clone, Copy)]
pub struct BuilderConfig {
    /// Minimum gap between consecutive berth reports to treat them as a
    /// genuine physical step rather than the same event reported twice by
    /// adjacent signalling areas (default 5s).
    pub delta_b: Duration,
    /// Gap beyond which two reports are treated as separate journeys of
    /// the same reporting number (default 1h).
    pub delta_t: Duration,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            delta_b: Duration::seconds(5),
            delta_t: Duration::hours(1),
        }
    }
}

struct Row {
    name: BerthName,
    /// Gap since the immediately preceding shape-filtered report, frozen at
    /// the point this row was produced and never recomputed against
    /// whichever row a later stage leaves it adjacent to. `None` only for
    /// the train's very first shape-filtered report, which has no
    /// predecessor to measure against; such a row is exempt from the
    /// `delta_b` and `delta_t` tests but still eligible as an edge endpoint.
    delta: Option<Duration>,
}

/// Berth-code shape filter. Operates on the full 6-character `NAME`,
/// matching the upstream implementation's slicing (which indexes into the
/// whole name, not just the 4-character berth code component).
fn passes_shape_filter(name: &str) -> bool {
    const BAD_SUFFIXES: [&str; 6] = ["STIN", "COUT", "DATE", "TIME", "CLCK", "LS"];
    if BAD_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
        return false;
    }

    let window_2_4 = &name[2..4];
    if window_2_4 == "LS" || window_2_4 == "TR" {
        return false;
    }

    let window_2_5 = &name[2..5];
    if window_2_5 == "SMT" {
        return false;
    }

    true
}

/// Assemble an undirected graph from every train's berth history. `berths`
/// supplies each known `NAME`'s fixed/coordinate state for newly-added
/// nodes; a `NAME` absent from it is treated as unfixed.
#[must_use]
pub fn build_graph(
    berths: &HashMap<BerthName, Berth>,
    trains: &[Train],
    config: &BuilderConfig,
) -> BerthGraph {
    let mut graph = BerthGraph::new_undirected();
    let mut index_of: HashMap<BerthName, petgraph::graph::NodeIndex> = HashMap::new();

    for train in trains {
        for path in journeys(train, config) {
            for window in path.windows(2) {
                let from = get_or_insert(&mut graph, &mut index_of, berths, &window[0].name);
                let to = get_or_insert(&mut graph, &mut index_of, berths, &window[1].name);
                graph.update_edge(from, to, 1.0);
            }
        }
    }

    graph
}

/// Run one train's `(BERTHS, TIMES)` sequence through the shape filter,
/// delta checks, and journey split, producing the independent journeys it
/// splits into.
fn journeys(train: &Train, config: &BuilderConfig) -> Vec<Vec<Row>> {
    let length = train.berths.len().min(train.times.len());
    let pairs: Vec<(&BerthName, OffsetDateTime)> = train.berths[..length]
        .iter()
        .zip(train.times[..length].iter().copied())
        .collect();

    // Step 2: berth-code shape filter.
    let filtered: Vec<(&BerthName, OffsetDateTime)> = pairs
        .into_iter()
        .filter(|(name, _)| passes_shape_filter(name.as_str()))
        .collect();

    if filtered.is_empty() {
        return Vec::new();
    }

    // Step 3: delta against the immediately preceding shape-filtered
    // report; the first report has none. Step 4: drop rows (other than the
    // first) whose delta falls below `delta_b`.
    let mut kept = Vec::new();
    kept.push(Row {
        name: filtered[0].0.clone(),
        delta: None,
    });
    for i in 1..filtered.len() {
        let delta = filtered[i].1 - filtered[i - 1].1;
        if delta >= config.delta_b {
            kept.push(Row {
                name: filtered[i].0.clone(),
                delta: Some(delta),
            });
        }
    }

    // Step 5: collapse consecutive duplicate berths, keeping the last of
    // each run (its `delta` field is left untouched, not recomputed
    // against the new predecessor).
    let mut collapsed = Vec::new();
    for i in 0..kept.len() {
        let is_last_of_run = i + 1 == kept.len() || kept[i + 1].name != kept[i].name;
        if is_last_of_run {
            collapsed.push(Row {
                name: kept[i].name.clone(),
                delta: kept[i].delta,
            });
        }
    }

    // Step 6: split wherever a row's stored delta exceeds `delta_t`. A row
    // with no delta (the train's first surviving report) never triggers a
    // split; it simply opens the first path.
    let mut paths = Vec::new();
    let mut current: Vec<Row> = Vec::new();
    for row in collapsed {
        if row.delta.is_some_and(|delta| delta >= config.delta_t) {
            paths.push(std::mem::take(&mut current));
        }
        current.push(row);
    }
    if !current.is_empty() {
        paths.push(current);
    }

    paths.retain(|path| path.len() > 1);
    paths
}

fn get_or_insert(
    graph: &mut BerthGraph,
    index_of: &mut HashMap<BerthName, petgraph::graph::NodeIndex>,
    berths: &HashMap<BerthName, Berth>,
    name: &BerthName,
) -> petgraph::graph::NodeIndex {
    if let Some(&index) = index_of.get(name) {
        return index;
    }

    let node = match berths.get(name) {
        Some(berth) if berth.fixed => match (berth.latitude, berth.longitude) {
            (Some(lat), Some(lon)) => BerthNode::fixed(name.clone(), lat, lon),
            _ => BerthNode::unfixed(name.clone()),
        },
        _ => BerthNode::unfixed(name.clone()),
    };

    let index = graph.add_node(node);
    index_of.insert(name.clone(), index);
    index
}

#[cfg(test)]
mod tests {
    use trainwatch_model::ReportingNumber;

    use super::*;

    fn berth(area: &str, code: &str) -> BerthName {
        BerthName::from_parts(area, code).unwrap()
    }

    fn train_with(names: &[(&str, &str)], offsets_seconds: &[i64]) -> Train {
        let base = OffsetDateTime::from_unix_timestamp(1_609_459_200).unwrap();
        let mut train = Train::new(ReportingNumber::try_from("1A23").unwrap());
        for ((area, code), offset) in names.iter().zip(offsets_seconds) {
            train.berths.push(berth(area, code));
            train.times.push(base + Duration::seconds(*offset));
        }
        train
    }

    #[test]
    fn shape_filter_rejects_known_bad_suffixes() {
        assert!(!passes_shape_filter("MPSTIN"));
        assert!(!passes_shape_filter("MPCOUT"));
        assert!(passes_shape_filter("MP0001"));
    }

    #[test]
    fn single_step_creates_one_edge() {
        let train = train_with(&[("MP", "0001"), ("MP", "0002")], &[0, 10]);
        let graph = build_graph(&HashMap::new(), &[train], &BuilderConfig::default());
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn bad_berth_codes_are_filtered_before_pair_enumeration() {
        let mut train = Train::new(ReportingNumber::try_from("1A23").unwrap());
        let base = OffsetDateTime::from_unix_timestamp(1_609_459_200).unwrap();
        train.berths.push(berth("MP", "0001"));
        train.times.push(base);
        train.berths.push(BerthName::from_parts("MP", "STIN").unwrap());
        train.times.push(base + Duration::seconds(10));

        let graph = build_graph(&HashMap::new(), &[train], &BuilderConfig::default());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn sub_delta_b_reports_are_dropped() {
        let train = train_with(&[("MP", "0001"), ("MP", "0002")], &[0, 1]);
        let graph = build_graph(&HashMap::new(), &[train], &BuilderConfig::default());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn duplicate_consecutive_berths_collapse() {
        // The repeated "MP0002" report collapses to its last occurrence;
        // "MP0001" (no predecessor, exempt from the delta_b/delta_t tests)
        // still opens the path, giving MP0001->MP0002->MP0003.
        let train = train_with(
            &[("MP", "0001"), ("MP", "0002"), ("MP", "0002"), ("MP", "0003")],
            &[0, 10, 20, 30],
        );
        let graph = build_graph(&HashMap::new(), &[train], &BuilderConfig::default());
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn first_report_survives_as_edge_endpoint_across_a_later_split() {
        // Worked example: MP0001->MP0002->MP0003 at t, t+10s, t+2h.
        // MP0001 has no delta so it is exempt from delta_b/delta_t and
        // still opens the first path; the 2h gap before MP0003 splits the
        // journey, leaving exactly one edge: (MP0001, MP0002).
        let train = train_with(
            &[("MP", "0001"), ("MP", "0002"), ("MP", "0003")],
            &[0, 10, 10 + 2 * 3600],
        );
        let graph = build_graph(&HashMap::new(), &[train], &BuilderConfig::default());
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }
}

#[cfg(test)]
mod props {
    use proptest::prelude::*;
    use trainwatch_model::ReportingNumber;

    use super::*;

    /// Four-digit numeric berth codes always pass the shape filter: the bad
    /// suffixes/windows it rejects are all alphabetic, so a sequence built
    /// from these never loses a row there, keeping the property focused on
    /// the delta and split logic.
    fn numeric_train(offsets: Vec<u32>, codes: Vec<u16>) -> Train {
        let base = OffsetDateTime::from_unix_timestamp(1_609_459_200).unwrap();
        let mut train = Train::new(ReportingNumber::try_from("1A23").unwrap());
        let mut elapsed: i64 = 0;
        for (offset, code) in offsets.into_iter().zip(codes) {
            elapsed += i64::from(offset);
            train
                .berths
                .push(BerthName::from_parts("MP", &format!("{code:04}")).unwrap());
            train.times.push(base + Duration::seconds(elapsed));
        }
        train
    }

    proptest! {
        /// For any sequence of (berth, time) pairs, the filter/split pipeline
        /// can only ever keep a non-increasing subset of the rows and only ever
        /// emits edges between rows that survived it: every node the
        /// builder adds has degree >= 1, and the total edge count never
        /// exceeds the total number of input reports.
        #[test]
        fn builder_never_produces_isolated_nodes_or_excess_edges(
            offsets in prop::collection::vec(0u32..10_000, 0..12),
            codes in prop::collection::vec(0u16..20, 0..12),
        ) {
            let len = offsets.len().min(codes.len());
            let train = numeric_train(offsets[..len].to_vec(), codes[..len].to_vec());
            let graph = build_graph(&HashMap::new(), &[train], &BuilderConfig::default());

            for node in graph.node_indices() {
                prop_assert!(graph.neighbors(node).count() >= 1);
            }
            prop_assert!(graph.edge_count() < len.max(1));
        }
    }
}
