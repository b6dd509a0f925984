use rand::Rng;

use trainwatch_topology::BerthGraph;

use crate::error::LayoutError;

/// Tunables for [`layout`] (`GENERATOR_K`/`_ITER`/`_SCALE`).
#[derive(Debug, Clone, Copy)]
pub struct LayoutConfig {
    /// Optimal edge length in the Fruchterman-Reingold force model.
    pub k: f64,
    /// Number of relaxation iterations.
    pub iterations: u32,
    /// Coordinate pre-multiplier applied on entry and undone on exit, to
    /// keep the solver away from denormal ranges.
    pub scale: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            k: 1e-6,
            iterations: 5000,
            scale: 1e5,
        }
    }
}

/// Run one Fruchterman-Reingold relaxation over `graph`'s current
/// positions.
///
/// Fixed nodes are pinned at `(lat, lon)`; their positions are identical on
/// exit, not merely close, since they are never displaced by the solver.
/// Non-fixed nodes keep whatever position they already carry (a previous
/// pass's result) as their starting point, or are placed uniformly at
/// random within the fixed nodes' bounding box when they have none yet.
///
/// # Errors
///
/// Returns [`LayoutError::NonFinitePosition`] if a position becomes NaN or
/// infinite during relaxation.
pub fn layout(
    graph: &mut BerthGraph,
    config: &LayoutConfig,
    rng: &mut impl Rng,
) -> Result<(), LayoutError> {
    let node_count = graph.node_count();
    if node_count == 0 {
        return Ok(());
    }

    let indices: Vec<_> = graph.node_indices().collect();
    let fixed: Vec<bool> = indices.iter().map(|&n| graph[n].fixed).collect();

    let (min_lat, max_lat, min_lon, max_lon) = bounding_box(graph, &indices);

    let mut pos: Vec<(f64, f64)> = indices
        .iter()
        .map(|&n| {
            let node = &graph[n];
            match (node.lat, node.lon) {
                (Some(lat), Some(lon)) => (lat * config.scale, lon * config.scale),
                _ => (
                    rng.gen_range(min_lat..=max_lat) * config.scale,
                    rng.gen_range(min_lon..=max_lon) * config.scale,
                ),
            }
        })
        .collect();

    let adjacency: Vec<Vec<bool>> = indices
        .iter()
        .map(|&a| {
            indices
                .iter()
                .map(|&b| a != b && graph.find_edge(a, b).is_some())
                .collect()
        })
        .collect();

    let spread = ((max_lat - min_lat).max(max_lon - min_lon) * config.scale).max(1.0);
    let mut temperature = 0.1 * spread;
    let cooling = temperature / f64::from(config.iterations + 1);

    for _ in 0..config.iterations {
        let mut displacement = vec![(0.0_f64, 0.0_f64); node_count];

        for i in 0..node_count {
            if fixed[i] {
                continue;
            }
            let mut dx = 0.0;
            let mut dy = 0.0;
            for j in 0..node_count {
                if i == j {
                    continue;
                }
                let delta_x = pos[i].0 - pos[j].0;
                let delta_y = pos[i].1 - pos[j].1;
                let distance = delta_x.hypot(delta_y).max(0.01);
                let is_edge = if adjacency[i][j] { 1.0 } else { 0.0 };
                let force = config.k * config.k / (distance * distance)
                    - is_edge * distance / config.k;
                dx += delta_x * force;
                dy += delta_y * force;
            }
            displacement[i] = (dx, dy);
        }

        for i in 0..node_count {
            if fixed[i] {
                continue;
            }
            let (dx, dy) = displacement[i];
            let length = dx.hypot(dy).max(0.01);
            pos[i].0 += dx / length * temperature;
            pos[i].1 += dy / length * temperature;

            if !pos[i].0.is_finite() || !pos[i].1.is_finite() {
                return Err(LayoutError::NonFinitePosition);
            }
        }

        temperature -= cooling;
    }

    for (slot, &n) in indices.iter().enumerate() {
        let (lat, lon) = pos[slot];
        let node = &mut graph[n];
        if !node.fixed {
            node.lat = Some(lat / config.scale);
            node.lon = Some(lon / config.scale);
        }
    }

    Ok(())
}

fn bounding_box(graph: &BerthGraph, indices: &[petgraph::graph::NodeIndex]) -> (f64, f64, f64, f64) {
    let mut min_lat = f64::MAX;
    let mut max_lat = f64::MIN;
    let mut min_lon = f64::MAX;
    let mut max_lon = f64::MIN;

    for &n in indices {
        let node = &graph[n];
        if let (Some(lat), Some(lon)) = (node.lat, node.lon) {
            min_lat = min_lat.min(lat);
            max_lat = max_lat.max(lat);
            min_lon = min_lon.min(lon);
            max_lon = max_lon.max(lon);
        }
    }

    if min_lat > max_lat {
        // No positioned nodes at all yet: fall back to a unit box around
        // the origin so random placement still has a sane range.
        return (-1.0, 1.0, -1.0, 1.0);
    }

    (min_lat, max_lat, min_lon, max_lon)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use trainwatch_model::BerthName;

    use super::*;
    use trainwatch_topology::BerthNode;

    fn name(area: &str, code: &str) -> BerthName {
        BerthName::from_parts(area, code).unwrap()
    }

    #[test]
    fn fixed_nodes_never_move() {
        let mut graph = BerthGraph::new_undirected();
        let a = graph.add_node(BerthNode::fixed(name("MP", "0001"), 0.0, 0.0));
        let b = graph.add_node(BerthNode::unfixed(name("MP", "0002")));
        let c = graph.add_node(BerthNode::fixed(name("MP", "0003"), 1.0, 0.0));
        graph.update_edge(a, b, 1.0);
        graph.update_edge(b, c, 1.0);

        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        layout(
            &mut graph,
            &LayoutConfig {
                k: 1e-6,
                iterations: 200,
                scale: 1e5,
            },
            &mut rng,
        )
        .unwrap();

        assert_eq!(graph[a].lat, Some(0.0));
        assert_eq!(graph[a].lon, Some(0.0));
        assert_eq!(graph[c].lat, Some(1.0));
        assert_eq!(graph[c].lon, Some(0.0));
    }

    #[test]
    fn unfixed_node_settles_between_its_anchors() {
        let mut graph = BerthGraph::new_undirected();
        let a = graph.add_node(BerthNode::fixed(name("MP", "0001"), 0.0, 0.0));
        let b = graph.add_node(BerthNode::unfixed(name("MP", "0002")));
        let c = graph.add_node(BerthNode::fixed(name("MP", "0003"), 1.0, 0.0));
        graph.update_edge(a, b, 1.0);
        graph.update_edge(b, c, 1.0);

        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        layout(
            &mut graph,
            &LayoutConfig {
                k: 1e-6,
                iterations: 500,
                scale: 1e5,
            },
            &mut rng,
        )
        .unwrap();

        let lat = graph[b].lat.unwrap();
        assert!(lat > 0.0 && lat < 1.0, "unexpected lat {lat}");
    }

    #[test]
    fn empty_graph_is_a_no_op() {
        let mut graph = BerthGraph::new_undirected();
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        layout(&mut graph, &LayoutConfig::default(), &mut rng).unwrap();
    }
}
