use std::collections::HashMap;

use tracing::{debug, warn};

use super::vertex::{MergedVertices, RawPoint, VertexMerger};
use crate::error::TopologyError;
use crate::math::Point2;
use crate::sketch::GeoId;

/// Index of a merged vertex in a [`ConnectivityGraph`].
pub type VertexIdx = usize;

/// Index of an edge in a [`ConnectivityGraph`].
pub type EdgeIdx = usize;

/// What a graph edge stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeRole {
    /// The curve of a geometry, joining its start and end points.
    Curve,
    /// An indirect connection through an internal alignment, such as a
    /// B-spline endpoint driven by a circle center.
    Alignment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphEdge {
    pub geo: GeoId,
    pub a: VertexIdx,
    pub b: VertexIdx,
    pub role: EdgeRole,
}

impl GraphEdge {
    /// Returns the endpoint opposite `v`.
    #[must_use]
    pub fn other(&self, v: VertexIdx) -> VertexIdx {
        if self.a == v {
            self.b
        } else {
            self.a
        }
    }
}

/// Undirected multigraph over merged vertices.
///
/// Parallel edges are kept, so two curves joining the same pair of
/// vertices form a two-edge cycle.
#[derive(Debug, Clone, Default)]
pub struct ConnectivityGraph {
    positions: Vec<Point2>,
    edges: Vec<GraphEdge>,
    adjacency: Vec<Vec<(EdgeIdx, VertexIdx)>>,
    curve_edges: HashMap<GeoId, EdgeIdx>,
}

impl ConnectivityGraph {
    fn from_parts(positions: Vec<Point2>, edges: Vec<GraphEdge>) -> Self {
        let mut graph = Self {
            adjacency: vec![Vec::new(); positions.len()],
            positions,
            edges: Vec::with_capacity(edges.len()),
            curve_edges: HashMap::new(),
        };
        for edge in edges {
            graph.insert(edge);
        }
        graph
    }

    fn insert(&mut self, edge: GraphEdge) {
        let idx = self.edges.len();
        self.adjacency[edge.a].push((idx, edge.b));
        self.adjacency[edge.b].push((idx, edge.a));
        if edge.role == EdgeRole::Curve {
            self.curve_edges.entry(edge.geo).or_insert(idx);
        }
        self.edges.push(edge);
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn position(&self, v: VertexIdx) -> Point2 {
        self.positions[v]
    }

    #[must_use]
    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// # Errors
    ///
    /// Returns `TopologyError::EdgeNotFound` for an out-of-range index.
    pub fn edge(&self, e: EdgeIdx) -> Result<&GraphEdge, TopologyError> {
        self.edges.get(e).ok_or(TopologyError::EdgeNotFound(e))
    }

    /// Incident `(edge, neighbor)` pairs in insertion order.
    #[must_use]
    pub fn neighbors(&self, v: VertexIdx) -> &[(EdgeIdx, VertexIdx)] {
        self.adjacency.get(v).map_or(&[], Vec::as_slice)
    }

    /// Number of incident edges.
    #[must_use]
    pub fn degree(&self, v: VertexIdx) -> usize {
        self.neighbors(v).len()
    }

    /// Number of incident edges other than `excluding`.
    #[must_use]
    pub fn connections(&self, v: VertexIdx, excluding: Option<EdgeIdx>) -> usize {
        self.neighbors(v)
            .iter()
            .filter(|(e, _)| Some(*e) != excluding)
            .count()
    }

    /// The curve edge contributed by `geo`, if it has one.
    #[must_use]
    pub fn curve_edge_of(&self, geo: GeoId) -> Option<EdgeIdx> {
        self.curve_edges.get(&geo).copied()
    }

    /// Returns a copy of the graph with one edge removed. Vertex indices are
    /// preserved; edge indices above `e` shift down by one.
    #[must_use]
    pub fn without_edge(&self, e: EdgeIdx) -> Self {
        let edges = self
            .edges
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != e)
            .map(|(_, edge)| *edge)
            .collect();
        Self::from_parts(self.positions.clone(), edges)
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingEdge {
    geo: GeoId,
    a: RawPoint,
    b: RawPoint,
    role: EdgeRole,
}

/// Collects points and edges, then merges vertices and builds the graph.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    merger: VertexMerger,
    pending: Vec<PendingEdge>,
    skipped: Vec<GeoId>,
}

/// Output of [`GraphBuilder::build`].
#[derive(Debug, Clone)]
pub struct GraphBuild {
    pub graph: ConnectivityGraph,
    /// Geometry whose endpoints merged into a single vertex.
    pub zero_length: Vec<GeoId>,
    /// Geometry reported unreadable while building.
    pub skipped: Vec<GeoId>,
    merged: MergedVertices,
}

impl GraphBuild {
    /// Merged vertex of a raw point.
    #[must_use]
    pub fn vertex(&self, raw: RawPoint) -> VertexIdx {
        self.merged.vertex(raw)
    }
}

impl GraphBuilder {
    #[must_use]
    pub fn new(tolerance: f64) -> Self {
        Self {
            merger: VertexMerger::new(tolerance),
            pending: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Registers a point that may or may not end up on an edge.
    pub fn point(&mut self, p: Point2) -> RawPoint {
        self.merger.insert(p)
    }

    /// Adds the curve edge of `geo` from `start` to `end`.
    pub fn segment(&mut self, geo: GeoId, start: Point2, end: Point2) -> (RawPoint, RawPoint) {
        let a = self.merger.insert(start);
        let b = self.merger.insert(end);
        self.pending.push(PendingEdge {
            geo,
            a,
            b,
            role: EdgeRole::Curve,
        });
        (a, b)
    }

    /// Adds an alignment edge owned by `geo` between two registered points.
    pub fn link(&mut self, geo: GeoId, a: RawPoint, b: RawPoint) {
        self.pending.push(PendingEdge {
            geo,
            a,
            b,
            role: EdgeRole::Alignment,
        });
    }

    /// Records geometry that could not be read.
    pub fn skip(&mut self, geo: GeoId) {
        self.skipped.push(geo);
    }

    /// Merges vertices and builds the graph.
    ///
    /// Curve edges whose endpoints collapse into one vertex are dropped and
    /// reported as zero-length. Collapsed alignment links are dropped
    /// silently.
    #[must_use]
    pub fn build(self) -> GraphBuild {
        let merged = self.merger.finish();
        let mut zero_length = Vec::new();
        let mut edges = Vec::with_capacity(self.pending.len());

        for p in &self.pending {
            let a = merged.vertex(p.a);
            let b = merged.vertex(p.b);
            if a == b {
                if p.role == EdgeRole::Curve {
                    warn!(geo = p.geo, "zero-length edge excluded from graph");
                    zero_length.push(p.geo);
                }
                continue;
            }
            edges.push(GraphEdge {
                geo: p.geo,
                a,
                b,
                role: p.role,
            });
        }

        if !self.skipped.is_empty() {
            warn!(count = self.skipped.len(), "unreadable geometry skipped");
        }

        let graph = ConnectivityGraph::from_parts(merged.positions.clone(), edges);
        debug!(
            vertices = graph.vertex_count(),
            edges = graph.edge_count(),
            zero_length = zero_length.len(),
            "connectivity graph built"
        );
        GraphBuild {
            graph,
            zero_length,
            skipped: self.skipped,
            merged,
        }
    }
}
