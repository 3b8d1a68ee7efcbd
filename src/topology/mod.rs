//! Graph layer shared by reconstruction and diagnosis.
//!
//! Raw endpoints are merged into vertices by [`VertexMerger`], edges keep the
//! geometry index they came from, and loops are found either by a greedy
//! walk or by capped exhaustive enumeration.

pub mod graph;
pub mod groups;
pub mod loops;
pub mod vertex;

pub use graph::{
    ConnectivityGraph, EdgeIdx, EdgeRole, GraphBuild, GraphBuilder, GraphEdge, VertexIdx,
};
pub use groups::{components, loop_groups};
pub use loops::{count_loops_bounded, enumerate_loops, greedy_loops, Loop, LoopSet};
pub use vertex::{MergedVertices, RawPoint, VertexMerger};
