//! Shape recognition over a tessellated profile.
//!
//! Detectors run in a fixed order (equilateral polygons, partial arc runs,
//! colinear runs, smooth spline runs) and claim edges in a shared
//! [`UsedEdges`] set, so later detectors only see what earlier ones left.

pub mod arc_run;
pub mod colinear;
pub mod polygon;
pub mod spline_run;
pub mod used;

pub use arc_run::{find_arc_runs, ArcRun};
pub use colinear::find_colinear_runs;
pub use polygon::{classify_polygons, LengthStats, PolygonClass};
pub use spline_run::find_spline_runs;
pub use used::UsedEdges;

use std::collections::HashMap;

use tracing::debug;

use crate::geometry::Curve;
use crate::math::{Point2, Vector2};
use crate::sketch::{ConstraintKind, GeoId, SketchSnapshot};
use crate::topology::{ConnectivityGraph, EdgeIdx, GraphBuilder, VertexIdx};

/// Tolerances and thresholds for profile reconstruction.
#[derive(Debug, Clone)]
pub struct ReProfileConfig {
    /// Endpoints closer than this are merged into one vertex.
    pub merge_tolerance: f64,
    /// Maximum steps of the greedy polygon walk.
    pub walk_step_cap: usize,
    /// Maximum spread of edge lengths in an equilateral polygon.
    pub equilateral_tolerance: f64,
    /// Maximum deviation from the base edge length in an arc run.
    pub arc_length_tolerance: f64,
    /// Maximum change between consecutive turning angles in an arc run (degrees).
    pub arc_angle_tolerance_deg: f64,
    /// Maximum direction deviation in a colinear run (degrees).
    pub colinear_angle_tolerance_deg: f64,
    pub colinear_min_run: usize,
    /// Turning angle above which a smooth chain is split (degrees).
    pub spline_angle_threshold_deg: f64,
    pub spline_min_run: usize,
    pub spline_degree: usize,
    /// Distance within which normal-geometry endpoints get a coincident constraint.
    pub coincident_tolerance: f64,
}

impl Default for ReProfileConfig {
    fn default() -> Self {
        Self {
            merge_tolerance: 1e-6,
            walk_step_cap: 100,
            equilateral_tolerance: 1e-3,
            arc_length_tolerance: 1e-3,
            arc_angle_tolerance_deg: 1.5,
            colinear_angle_tolerance_deg: 1e-2,
            colinear_min_run: 2,
            spline_angle_threshold_deg: 15.0,
            spline_min_run: 4,
            spline_degree: 3,
            coincident_tolerance: 5e-6,
        }
    }
}

/// Kind-specific data of a profile edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeShape {
    Line,
    Arc { center: Point2, radius: f64, sweep: f64 },
}

/// Lines and arcs of a sketch as a connectivity graph.
///
/// Every graph edge is the curve edge of one geometry, so graph edge
/// indices double as handles for the detectors.
#[derive(Debug, Clone)]
pub struct ProfileGraph {
    pub graph: ConnectivityGraph,
    shapes: Vec<EdgeShape>,
    construction: Vec<bool>,
    /// Lines and arcs whose endpoints merged into one vertex.
    pub zero_length: Vec<GeoId>,
}

impl ProfileGraph {
    /// Builds the profile graph from every line and arc in `snapshot`.
    ///
    /// Block-constrained lines are left out: they are the anchor lines that
    /// reconstruction emits for circle and arc centers.
    #[must_use]
    pub fn from_snapshot(snapshot: &SketchSnapshot, merge_tolerance: f64) -> Self {
        let blocked: Vec<GeoId> = snapshot
            .constraints()
            .iter()
            .filter(|c| c.kind == ConstraintKind::Block)
            .map(|c| c.first.geo)
            .collect();

        let mut builder = GraphBuilder::new(merge_tolerance);
        let mut by_geo: HashMap<GeoId, (EdgeShape, bool)> = HashMap::new();
        for entry in snapshot.entries() {
            let (start, end, shape) = match &entry.curve {
                Curve::Line(l) if !blocked.contains(&entry.id) => {
                    (*l.start(), *l.end(), EdgeShape::Line)
                }
                Curve::Arc(a) => (
                    a.start_point(),
                    a.end_point(),
                    EdgeShape::Arc {
                        center: *a.center(),
                        radius: a.radius(),
                        sweep: a.sweep(),
                    },
                ),
                _ => continue,
            };
            builder.segment(entry.id, start, end);
            by_geo.insert(entry.id, (shape, entry.construction));
        }

        let build = builder.build();
        let (shapes, construction) = build
            .graph
            .edges()
            .iter()
            .map(|edge| by_geo.get(&edge.geo).copied().unwrap_or((EdgeShape::Line, false)))
            .unzip();
        debug!(
            edges = build.graph.edge_count(),
            vertices = build.graph.vertex_count(),
            "profile graph built"
        );
        Self {
            graph: build.graph,
            shapes,
            construction,
            zero_length: build.zero_length,
        }
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn geo(&self, e: EdgeIdx) -> GeoId {
        self.graph.edges()[e].geo
    }

    #[must_use]
    pub fn shape(&self, e: EdgeIdx) -> EdgeShape {
        self.shapes[e]
    }

    #[must_use]
    pub fn is_line(&self, e: EdgeIdx) -> bool {
        self.shapes[e] == EdgeShape::Line
    }

    #[must_use]
    pub fn is_construction(&self, e: EdgeIdx) -> bool {
        self.construction[e]
    }

    /// Chord length for lines, swept length for arcs.
    #[must_use]
    pub fn length(&self, e: EdgeIdx) -> f64 {
        match self.shapes[e] {
            EdgeShape::Line => {
                let edge = &self.graph.edges()[e];
                (self.graph.position(edge.b) - self.graph.position(edge.a)).norm()
            }
            EdgeShape::Arc { radius, sweep, .. } => radius * sweep,
        }
    }

    /// Chord vector of `e` when traversed starting at `from`.
    #[must_use]
    pub fn travel(&self, e: EdgeIdx, from: VertexIdx) -> Vector2 {
        let edge = &self.graph.edges()[e];
        self.graph.position(edge.other(from)) - self.graph.position(from)
    }
}

/// An ordered run of edges with the vertices between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub edges: Vec<EdgeIdx>,
    /// One more vertex than edges; `edges[i]` joins `vertices[i]` and `vertices[i + 1]`.
    pub vertices: Vec<VertexIdx>,
}

impl Chain {
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    #[must_use]
    pub fn points(&self, graph: &ConnectivityGraph) -> Vec<Point2> {
        self.vertices.iter().map(|&v| graph.position(v)).collect()
    }
}

/// Grows a chain from `seed` in both directions.
///
/// At each end the first incident edge accepted by `accept(edge, from,
/// outward)` is appended, where `outward` tells whether the walk runs
/// along the seed's direction. `accept` must reject edges that are already
/// taken and record the ones it accepts.
pub(crate) fn grow_chain<F>(pg: &ProfileGraph, seed: EdgeIdx, mut accept: F) -> Chain
where
    F: FnMut(EdgeIdx, VertexIdx, bool) -> bool,
{
    let seed_edge = pg.graph.edges()[seed];
    let mut front: Vec<(EdgeIdx, VertexIdx)> = Vec::new();
    let mut back: Vec<(EdgeIdx, VertexIdx)> = Vec::new();

    for (origin, forward) in [(seed_edge.b, true), (seed_edge.a, false)] {
        let out = if forward { &mut back } else { &mut front };
        let mut current = origin;
        let mut last = seed;
        loop {
            let next = pg
                .graph
                .neighbors(current)
                .iter()
                .copied()
                .find(|&(e, _)| e != last && e != seed && accept(e, current, forward));
            let Some((e, n)) = next else {
                break;
            };
            out.push((e, n));
            last = e;
            current = n;
        }
    }

    let mut edges = Vec::with_capacity(front.len() + back.len() + 1);
    let mut vertices = Vec::with_capacity(edges.capacity() + 1);
    vertices.push(front.last().map_or(seed_edge.a, |&(_, v)| v));
    for i in (0..front.len()).rev() {
        edges.push(front[i].0);
        vertices.push(if i == 0 { seed_edge.a } else { front[i - 1].1 });
    }
    edges.push(seed);
    vertices.push(seed_edge.b);
    for &(e, v) in &back {
        edges.push(e);
        vertices.push(v);
    }
    Chain { edges, vertices }
}
