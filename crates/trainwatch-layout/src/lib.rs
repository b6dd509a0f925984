//! Fruchterman-Reingold spring layout and the Generator's multi-pass
//! pipeline that drives it.
//!
//! [`solver::layout`] is pure graph-in, graph-out; [`pipeline::run`] is
//! where the store reads/writes, staleness sweep, and cleaner calls
//! between passes live.

mod error;
mod solver;

pub mod pipeline;

pub use error::LayoutError;
pub use solver::{layout, LayoutConfig};
