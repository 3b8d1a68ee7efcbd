//! Constraint and connectivity resolution.
//!
//! Builds the coordinate-keyed constraint maps, the connectivity graph of
//! normal geometry with B-spline endpoints linked through their driving
//! circle centers, and the snapped graph used for loop enumeration.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, info};

use super::config::DiagnoseConfig;
use crate::error::{OperationError, Result};
use crate::geometry::{Curve, CurveKind, PointPos};
use crate::math::Point2;
use crate::sketch::{ConstraintKind, GeoId, SketchSnapshot};
use crate::topology::{ConnectivityGraph, EdgeIdx, GraphBuilder, VertexIdx};

/// A coordinate rounded to a fixed number of decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoordKey {
    x: i64,
    y: i64,
}

impl CoordKey {
    #[allow(clippy::cast_possible_truncation)]
    fn of(p: &Point2, scale: f64) -> Self {
        Self {
            x: (p.x * scale).round() as i64,
            y: (p.y * scale).round() as i64,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn point(self, scale: f64) -> Point2 {
        Point2::new(self.x as f64 / scale, self.y as f64 / scale)
    }
}

/// Coincident and internal-alignment relations keyed by rounded coordinate.
#[derive(Debug, Clone)]
pub struct ConstraintMaps {
    scale: f64,
    coincident: HashMap<CoordKey, BTreeSet<CoordKey>>,
    /// B-spline endpoint to the circle centers that drive it.
    alignment: HashMap<CoordKey, BTreeSet<CoordKey>>,
    /// Distinct points referenced by connectivity constraints, in order of
    /// first appearance.
    anchors: Vec<Point2>,
}

impl ConstraintMaps {
    /// Reads every Coincident and InternalAlignment constraint.
    ///
    /// Constraint points that cannot be evaluated are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::ResolutionFailed` if a constraint references
    /// geometry beyond the end of the sketch.
    pub fn build(snapshot: &SketchSnapshot, precision: u32) -> Result<Self> {
        let scale = 10f64.powi(i32::try_from(precision).unwrap_or(i32::MAX));
        let mut maps = Self {
            scale,
            coincident: HashMap::new(),
            alignment: HashMap::new(),
            anchors: Vec::new(),
        };
        let mut anchor_keys = BTreeSet::new();

        for (i, c) in snapshot.constraints().iter().enumerate() {
            if !c.is_connectivity() {
                continue;
            }
            if let Some(bad) = c.refs().find(|r| r.geo >= snapshot.len()) {
                return Err(OperationError::ResolutionFailed(format!(
                    "constraint {i} references missing geometry {}",
                    bad.geo
                ))
                .into());
            }
            let Some(second) = c.second else {
                continue;
            };
            let (Some(p1), Some(p2)) = (snapshot.point(c.first), snapshot.point(second)) else {
                debug!(constraint = i, "constraint point unavailable, skipping");
                continue;
            };
            for p in [p1, p2] {
                if anchor_keys.insert(maps.key(&p)) {
                    maps.anchors.push(p);
                }
            }
            let (k1, k2) = (maps.key(&p1), maps.key(&p2));
            match c.kind {
                ConstraintKind::Coincident => {
                    maps.coincident.entry(k1).or_default().insert(k2);
                    maps.coincident.entry(k2).or_default().insert(k1);
                }
                ConstraintKind::InternalAlignment
                    if matches!(second.pos, PointPos::Start | PointPos::End) =>
                {
                    maps.alignment.entry(k2).or_default().insert(k1);
                }
                _ => {}
            }
        }

        debug!(
            coincident = maps.coincident.len(),
            alignment = maps.alignment.len(),
            anchors = maps.anchors.len(),
            "constraint maps built"
        );
        Ok(maps)
    }

    fn key(&self, p: &Point2) -> CoordKey {
        CoordKey::of(p, self.scale)
    }

    /// Number of distinct coordinates coincident with `p`.
    #[must_use]
    pub fn coincident_count(&self, p: &Point2) -> usize {
        self.coincident.get(&self.key(p)).map_or(0, BTreeSet::len)
    }

    /// Coordinates effectively connected to a B-spline endpoint: its direct
    /// coincidences plus the coincidences of every circle center driving it.
    #[must_use]
    pub fn spline_links(&self, p: &Point2) -> Vec<Point2> {
        let key = self.key(p);
        let mut linked: BTreeSet<CoordKey> =
            self.coincident.get(&key).cloned().unwrap_or_default();
        for center in self.alignment.get(&key).into_iter().flatten() {
            if let Some(set) = self.coincident.get(center) {
                linked.extend(set.iter().copied());
            }
        }
        linked.into_iter().map(|k| k.point(self.scale)).collect()
    }

    /// The first constrained point, in constraint order, within `tolerance`
    /// of `p`.
    #[must_use]
    pub fn snap(&self, p: &Point2, tolerance: f64) -> Option<Point2> {
        self.anchors.iter().find(|a| (*a - p).norm() <= tolerance).copied()
    }
}

/// A normal geometry with two endpoints, placed in the connectivity graph.
#[derive(Debug, Clone, Copy)]
pub struct Wire {
    pub geo: GeoId,
    pub curve: CurveKind,
    pub start: Point2,
    pub end: Point2,
    pub start_vertex: VertexIdx,
    pub end_vertex: VertexIdx,
    /// Curve edge in the connectivity graph, absent for zero-length geometry.
    pub edge: Option<EdgeIdx>,
}

/// Everything later phases need from constraint resolution.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub maps: ConstraintMaps,
    /// Normal geometry joined at shared endpoints and through alignments.
    pub graph: ConnectivityGraph,
    /// Normal geometry with endpoints, in index order.
    pub wires: Vec<Wire>,
    /// Every readable normal geometry, in index order.
    pub normal: Vec<(GeoId, CurveKind)>,
    /// Normal B-splines whose endpoints could not be resolved.
    pub unresolved: Vec<GeoId>,
    pub zero_length: Vec<GeoId>,
    /// Curve-only graph with endpoints snapped onto constrained points.
    pub loop_graph: ConnectivityGraph,
}

impl Resolution {
    #[must_use]
    pub fn wire(&self, geo: GeoId) -> Option<&Wire> {
        self.wires.iter().find(|w| w.geo == geo)
    }

    /// Incident edges at `v` other than the wire's own curve edge.
    #[must_use]
    pub fn connections(&self, wire: &Wire, v: VertexIdx) -> usize {
        self.graph.connections(v, wire.edge)
    }
}

/// Runs constraint and connectivity resolution.
///
/// # Errors
///
/// Returns an error if the constraint list is inconsistent with the
/// geometry list.
pub fn resolve(snapshot: &SketchSnapshot, config: &DiagnoseConfig) -> Result<Resolution> {
    let maps = ConstraintMaps::build(snapshot, config.coordinate_precision)?;
    let tolerance = config.vertex_tolerance();

    let mut builder = GraphBuilder::new(tolerance);
    let mut snapped = GraphBuilder::new(tolerance);
    let mut pending = Vec::new();
    let mut normal = Vec::new();
    let mut unresolved = Vec::new();

    for id in 0..snapshot.len() {
        let Some(entry) = snapshot.entry(id) else {
            builder.skip(id);
            continue;
        };
        if entry.construction {
            continue;
        }
        let kind = entry.curve.kind();
        normal.push((id, kind));
        let ends = match entry.curve.endpoints() {
            Ok(ends) => ends,
            Err(err) => {
                debug!(geo = id, error = %err, "endpoints unavailable");
                None
            }
        };
        let Some((start, end)) = ends else {
            if kind == CurveKind::BSpline {
                unresolved.push(id);
            }
            continue;
        };

        let (a, b) = builder.segment(id, start, end);
        if matches!(entry.curve, Curve::BSpline(_)) {
            for (raw, p) in [(a, start), (b, end)] {
                for target in maps.spline_links(&p) {
                    let t = builder.point(target);
                    builder.link(id, raw, t);
                }
            }
        }
        pending.push((id, kind, start, end, a, b));

        let snap = |p: Point2| maps.snap(&p, config.snap_tolerance).unwrap_or(p);
        snapped.segment(id, snap(start), snap(end));
    }

    let build = builder.build();
    let wires = pending
        .into_iter()
        .map(|(geo, curve, start, end, a, b)| Wire {
            geo,
            curve,
            start,
            end,
            start_vertex: build.vertex(a),
            end_vertex: build.vertex(b),
            edge: build.graph.curve_edge_of(geo),
        })
        .collect::<Vec<_>>();
    let loop_graph = snapped.build().graph;

    info!(
        normal = normal.len(),
        wires = wires.len(),
        vertices = build.graph.vertex_count(),
        edges = build.graph.edge_count(),
        unresolved = unresolved.len(),
        "connectivity resolved"
    );
    Ok(Resolution {
        maps,
        graph: build.graph,
        wires,
        normal,
        unresolved,
        zero_length: build.zero_length,
        loop_graph,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::{BSpline, Circle};
    use crate::sketch::{Constraint, GeoRef, GeometrySink, Sketch};

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn resolved(s: &Sketch) -> Resolution {
        let snap = SketchSnapshot::capture(s).unwrap();
        resolve(&snap, &DiagnoseConfig::default()).unwrap()
    }

    #[test]
    fn coincident_map_is_symmetric() {
        let mut s = Sketch::new();
        s.push_line(p(0.0, 0.0), p(1.0, 0.0), false);
        s.push_line(p(1.0, 0.0), p(1.0, 1.0), false);
        s.add_constraint(Constraint::coincident(GeoRef::end(0), GeoRef::start(1)))
            .unwrap();
        let res = resolved(&s);
        // Both references sit at (1, 0), so the key maps to itself.
        assert_eq!(res.maps.coincident_count(&p(1.0, 0.0)), 1);
        assert_eq!(res.maps.coincident_count(&p(0.0, 0.0)), 0);
        assert_eq!(res.graph.vertex_count(), 3);
        assert_eq!(res.wires.len(), 2);
    }

    #[test]
    fn spline_end_links_through_circle_center() {
        let mut s = Sketch::new();
        // A line ends near, but not at, the spline's start.
        let line = s.push_line(p(-5.0, 0.0), p(0.0, 0.5), false);
        let spline = BSpline::new(
            vec![p(0.0, 0.0), p(1.0, 1.0), p(2.0, 1.0), p(3.0, 0.0)],
            vec![0.0, 1.0],
            vec![4, 4],
            3,
            false,
        )
        .unwrap();
        let sp = s.push(Curve::BSpline(spline), false);
        let circle = s.push(Curve::Circle(Circle::new(p(0.0, 0.0), 0.1).unwrap()), true);
        s.add_constraint(Constraint::internal_alignment(
            GeoRef::center(circle),
            GeoRef::start(sp),
        ))
        .unwrap();
        let c2 = s.push(Curve::Circle(Circle::new(p(0.0, 0.5), 0.1).unwrap()), true);
        s.add_constraint(Constraint::coincident(GeoRef::center(c2), GeoRef::end(line)))
            .unwrap();
        s.add_constraint(Constraint::coincident(GeoRef::center(circle), GeoRef::center(c2)))
            .unwrap();

        let res = resolved(&s);
        let wire = *res.wire(sp).unwrap();
        let line_wire = *res.wire(line).unwrap();
        assert!(res.connections(&wire, wire.start_vertex) >= 1);
        assert!(res.connections(&line_wire, line_wire.end_vertex) >= 1);
    }

    #[test]
    fn periodic_spline_is_unresolved() {
        let mut s = Sketch::new();
        let spline = BSpline::new(
            vec![p(0.0, 0.0), p(1.0, 1.0), p(2.0, 0.0), p(1.0, -1.0)],
            vec![0.0, 1.0, 2.0, 3.0, 4.0],
            vec![1, 1, 1, 1, 1],
            3,
            true,
        )
        .unwrap();
        s.push(Curve::BSpline(spline), false);
        let res = resolved(&s);
        assert_eq!(res.unresolved, vec![0]);
        assert!(res.wires.is_empty());
    }

    #[test]
    fn snapping_closes_small_gaps_for_loops() {
        let mut s = Sketch::new();
        s.push_line(p(0.0, 0.0), p(1.0, 0.0), false);
        s.push_line(p(1.0 + 5e-4, 0.0), p(0.0, 1.0), false);
        s.push_line(p(0.0, 1.0), p(0.0, 0.0), false);
        s.add_constraint(Constraint::coincident(GeoRef::end(0), GeoRef::start(1)))
            .unwrap();
        let res = resolved(&s);
        // The raw graph keeps the gap, the snapped graph does not.
        assert_eq!(res.graph.vertex_count(), 4);
        assert_eq!(res.loop_graph.vertex_count(), 3);
    }

    #[test]
    fn dangling_reference_is_fatal() {
        let snap = SketchSnapshot::capture(&BrokenConstraints).unwrap();
        assert!(resolve(&snap, &DiagnoseConfig::default()).is_err());
    }

    struct BrokenConstraints;

    impl crate::sketch::GeometrySource for BrokenConstraints {
        fn geometry_count(&self) -> usize {
            1
        }
        fn geometry(&self, _id: GeoId) -> Result<Curve> {
            Ok(Curve::Line(crate::geometry::Line::new(p(0.0, 0.0), p(1.0, 0.0))))
        }
        fn is_construction(&self, _id: GeoId) -> Result<bool> {
            Ok(false)
        }
        fn constraints(&self) -> Result<Vec<Constraint>> {
            Ok(vec![Constraint::coincident(GeoRef::end(0), GeoRef::start(7))])
        }
    }
}
