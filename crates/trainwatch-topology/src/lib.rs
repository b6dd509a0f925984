//! The berth graph: building it from train history and
//! tidying it between layout passes.
//!
//! The graph itself is a plain [`petgraph`] undirected graph; everything
//! in this crate is pure and store-free — callers pull `BERTH`/`TRAIN`
//! documents out of `trainwatch-store` themselves and hand them in.

mod builder;
mod cleaner;
mod node;

pub use builder::{build_graph, BuilderConfig};
pub use cleaner::{
    clean_graph, collapse_duplicate_locations, prune_floating, prune_isolated,
    prune_largest_component, prune_long_edges, CleanerConfig,
};
pub use node::BerthNode;

/// Undirected berth adjacency graph; edge weight is a nominal hop count
/// (the builder always adds weight 1.0, never read back downstream).
pub type BerthGraph = petgraph::graph::UnGraph<BerthNode, f64>;
