use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

use crate::BerthGraph;

/// Tunables for [`prune_long_edges`] (`GENERATOR_CUT_D`).
#[derive(Debug, Clone, Copy)]
pub struct CleanerConfig {
    /// Euclidean (lat, lon) distance beyond which an edge is pruned.
    pub cut_d: f64,
    /// Prune only edges whose endpoints are both `FIXED` (the source's
    /// earlier behavior) rather than any edge with two positioned
    /// endpoints (the source's later, preferred behavior).
    pub fixed_only: bool,
}

/// Remove every zero-degree node (isolate-prune).
pub fn prune_isolated(graph: &mut BerthGraph) {
    let before = graph.node_count();
    graph.retain_nodes(|frozen, node| frozen.neighbors(node).next().is_some());
    tracing::debug!(dropped = before - graph.node_count(), "isolate-prune");
}

/// Keep only the largest connected component, by node count
/// (largest-component). A graph with no nodes is left unchanged.
pub fn prune_largest_component(graph: &mut BerthGraph) {
    let mut visited: HashSet<NodeIndex> = HashSet::new();
    let mut largest: HashSet<NodeIndex> = HashSet::new();

    for start in graph.node_indices() {
        if visited.contains(&start) {
            continue;
        }
        let mut component = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(start);
        visited.insert(start);
        component.insert(start);
        while let Some(node) = queue.pop_front() {
            for neighbor in graph.neighbors(node) {
                if visited.insert(neighbor) {
                    component.insert(neighbor);
                    queue.push_back(neighbor);
                }
            }
        }
        if component.len() > largest.len() {
            largest = component;
        }
    }

    graph.retain_nodes(|_, node| largest.contains(&node));
}

/// Merge fixed nodes sharing an identical `(lat, lon)` into one node per
/// equivalence class (collapse-duplicates). The representative keeps its
/// own coordinate; edges onto the merged nodes are re-homed onto it and any
/// resulting self-loop is dropped rather than kept.
pub fn collapse_duplicate_locations(graph: &mut BerthGraph) {
    let mut groups: HashMap<(u64, u64), Vec<NodeIndex>> = HashMap::new();
    for node in graph.node_indices() {
        let data = &graph[node];
        if let (true, Some(lat), Some(lon)) = (data.fixed, data.lat, data.lon) {
            groups
                .entry((lat.to_bits(), lon.to_bits()))
                .or_default()
                .push(node);
        }
    }

    for members in groups.into_values() {
        let Some((&representative, rest)) = members.split_first() else {
            continue;
        };
        for &duplicate in rest {
            let neighbors: Vec<NodeIndex> = graph.neighbors(duplicate).collect();
            for neighbor in neighbors {
                if neighbor != representative {
                    graph.update_edge(representative, neighbor, 1.0);
                }
            }
            graph.remove_node(duplicate);
        }
    }
}

/// Remove edges whose endpoints are both positioned and farther apart than
/// `cut_d` (long-edge prune). `config.fixed_only` selects between the two
/// variants the source carried across revisions; the pipeline in this
/// workspace defaults to the *any* variant (see DESIGN.md).
pub fn prune_long_edges(graph: &mut BerthGraph, config: &CleanerConfig) {
    let stale: Vec<petgraph::graph::EdgeIndex> = graph
        .edge_references()
        .filter_map(|edge| {
            let a = &graph[edge.source()];
            let b = &graph[edge.target()];
            if config.fixed_only && !(a.fixed && b.fixed) {
                return None;
            }
            let (lat_a, lon_a) = (a.lat?, a.lon?);
            let (lat_b, lon_b) = (b.lat?, b.lon?);
            let distance = ((lat_a - lat_b).powi(2) + (lon_a - lon_b).powi(2)).sqrt();
            (distance >= config.cut_d).then_some(edge.id())
        })
        .collect();

    for edge in stale {
        graph.remove_edge(edge);
    }
}

/// Keep only nodes lying on some shortest path between two fixed nodes,
/// plus the fixed nodes themselves (floating-prune). Computed as
/// betweenness centrality restricted to fixed-to-fixed pairs (Brandes'
/// algorithm, source and target sets both equal to the fixed-node set);
/// nodes with a nonzero score survive.
pub fn prune_floating(graph: &mut BerthGraph) {
    let fixed: Vec<NodeIndex> = graph
        .node_indices()
        .filter(|&n| graph[n].fixed)
        .collect();
    let targets: HashSet<NodeIndex> = fixed.iter().copied().collect();

    let mut score: HashMap<NodeIndex, f64> = graph.node_indices().map(|n| (n, 0.0)).collect();

    for &source in &fixed {
        accumulate_betweenness(graph, source, &targets, &mut score);
    }

    graph.retain_nodes(|_, node| targets.contains(&node) || score.get(&node).copied().unwrap_or(0.0) != 0.0);
}

/// One source's contribution to the subset-restricted betweenness scores
/// (the `_accumulate_subset` step of Brandes' algorithm, networkx's
/// `betweenness_centrality_subset`).
fn accumulate_betweenness(
    graph: &BerthGraph,
    source: NodeIndex,
    targets: &HashSet<NodeIndex>,
    score: &mut HashMap<NodeIndex, f64>,
) {
    let mut stack: Vec<NodeIndex> = Vec::new();
    let mut predecessors: HashMap<NodeIndex, Vec<NodeIndex>> = HashMap::new();
    let mut sigma: HashMap<NodeIndex, f64> = HashMap::new();
    let mut distance: HashMap<NodeIndex, i64> = HashMap::new();

    for node in graph.node_indices() {
        predecessors.insert(node, Vec::new());
        sigma.insert(node, 0.0);
    }
    sigma.insert(source, 1.0);
    distance.insert(source, 0);

    let mut queue = VecDeque::new();
    queue.push_back(source);
    while let Some(v) = queue.pop_front() {
        stack.push(v);
        let dist_v = distance[&v];
        for w in graph.neighbors(v) {
            if !distance.contains_key(&w) {
                distance.insert(w, dist_v + 1);
                queue.push_back(w);
            }
            if distance[&w] == dist_v + 1 {
                *sigma.get_mut(&w).expect("every node pre-seeded into sigma") += sigma[&v];
                predecessors
                    .get_mut(&w)
                    .expect("every node pre-seeded into predecessors")
                    .push(v);
            }
        }
    }

    let mut delta: HashMap<NodeIndex, f64> = graph.node_indices().map(|n| (n, 0.0)).collect();
    while let Some(w) = stack.pop() {
        let coefficient = if targets.contains(&w) {
            (delta[&w] + 1.0) / sigma[&w]
        } else {
            delta[&w] / sigma[&w]
        };
        for &v in &predecessors[&w] {
            *delta.get_mut(&v).expect("every node pre-seeded into delta") += sigma[&v] * coefficient;
        }
        if w != source {
            let entry = score.get_mut(&w).expect("every node pre-seeded into score");
            *entry += delta[&w];
        }
    }
}

/// Run the fixed sequence of cleaner stages the source applies in one shot
/// (isolate-prune, collapse-duplicates, long-edge prune, floating prune),
/// mirroring the original's single-pass `clean_graph`. Useful standalone in
/// tests; the live Generator pipeline only invokes a subset of these
/// stages directly, in the order its own multi-pass schedule calls for.
pub fn clean_graph(graph: &mut BerthGraph, config: &CleanerConfig) {
    prune_isolated(graph);
    collapse_duplicate_locations(graph);
    prune_long_edges(graph, config);
    prune_floating(graph);
}

#[cfg(test)]
mod tests {
    use trainwatch_model::BerthName;

    use super::*;
    use crate::node::BerthNode;

    fn name(area: &str, code: &str) -> BerthName {
        BerthName::from_parts(area, code).unwrap()
    }

    #[test]
    fn isolate_prune_drops_zero_degree_nodes() {
        let mut graph = BerthGraph::new_undirected();
        let a = graph.add_node(BerthNode::unfixed(name("MP", "0001")));
        let b = graph.add_node(BerthNode::unfixed(name("MP", "0002")));
        graph.add_node(BerthNode::unfixed(name("MP", "0003")));
        graph.update_edge(a, b, 1.0);

        prune_isolated(&mut graph);
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn largest_component_drops_the_smaller_one() {
        let mut graph = BerthGraph::new_undirected();
        let a = graph.add_node(BerthNode::unfixed(name("MP", "0001")));
        let b = graph.add_node(BerthNode::unfixed(name("MP", "0002")));
        let c = graph.add_node(BerthNode::unfixed(name("MP", "0003")));
        graph.update_edge(a, b, 1.0);
        graph.update_edge(a, c, 1.0);
        let d = graph.add_node(BerthNode::unfixed(name("MP", "0004")));
        let e = graph.add_node(BerthNode::unfixed(name("MP", "0005")));
        graph.update_edge(d, e, 1.0);

        prune_largest_component(&mut graph);
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn collapse_duplicate_locations_merges_same_coordinate_fixed_nodes() {
        let mut graph = BerthGraph::new_undirected();
        let a = graph.add_node(BerthNode::fixed(name("MP", "0001"), 53.0, -2.0));
        let b = graph.add_node(BerthNode::fixed(name("MP", "0002"), 53.0, -2.0));
        let c = graph.add_node(BerthNode::unfixed(name("MP", "0003")));
        graph.update_edge(a, c, 1.0);
        graph.update_edge(b, c, 1.0);

        collapse_duplicate_locations(&mut graph);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn long_edge_prune_removes_only_distant_edges() {
        let mut graph = BerthGraph::new_undirected();
        let a = graph.add_node(BerthNode::fixed(name("MP", "0001"), 53.0, -2.0));
        let b = graph.add_node(BerthNode::fixed(name("MP", "0002"), 60.0, -2.0));
        graph.update_edge(a, b, 1.0);

        prune_long_edges(
            &mut graph,
            &CleanerConfig {
                cut_d: 0.25,
                fixed_only: true,
            },
        );
        assert_eq!(graph.edge_count(), 0);

        let mut retained = BerthGraph::new_undirected();
        let a = retained.add_node(BerthNode::fixed(name("MP", "0001"), 53.0, -2.0));
        let b = retained.add_node(BerthNode::fixed(name("MP", "0002"), 60.0, -2.0));
        retained.update_edge(a, b, 1.0);
        prune_long_edges(
            &mut retained,
            &CleanerConfig {
                cut_d: 10.0,
                fixed_only: true,
            },
        );
        assert_eq!(retained.edge_count(), 1);
    }

    #[test]
    fn floating_prune_keeps_only_fixed_pair_corridors() {
        // A -- B -- C (chain), A and C fixed; B sits on the only A-C path.
        let mut graph = BerthGraph::new_undirected();
        let a = graph.add_node(BerthNode::fixed(name("MP", "0001"), 0.0, 0.0));
        let b = graph.add_node(BerthNode::unfixed(name("MP", "0002")));
        let c = graph.add_node(BerthNode::fixed(name("MP", "0003"), 1.0, 0.0));
        let d = graph.add_node(BerthNode::unfixed(name("MP", "0004")));
        graph.update_edge(a, b, 1.0);
        graph.update_edge(b, c, 1.0);
        graph.update_edge(c, d, 1.0);

        prune_floating(&mut graph);
        assert_eq!(graph.node_count(), 3);
    }
}
