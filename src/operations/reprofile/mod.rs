//! Rebuilds a tessellated profile as circles, arcs, lines and splines.
//!
//! [`ReProfile`] reads the sketch once, runs the shape detectors from
//! [`crate::operations::recognize`] over the snapshot, and writes the
//! replacement geometry in a single host transaction.

pub mod coincidence;
pub mod emit;
pub mod stats;

pub use coincidence::{constrain_endpoints, CoincidenceOutcome};
pub use stats::EdgeStats;

pub use crate::operations::recognize::ReProfileConfig;

use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use crate::error::Result;
use crate::math::bspline::interpolate;
use crate::operations::recognize::{
    classify_polygons, find_arc_runs, find_colinear_runs, find_spline_runs, ProfileGraph,
    UsedEdges,
};
use crate::sketch::{with_transaction, GeometrySink, SketchHost, SketchSnapshot};
use crate::topology::greedy_loops;

/// Name of the host transaction opened by [`ReProfile::execute`].
pub const TRANSACTION_NAME: &str = "SketchPolygonsToCircles";

/// Counts from one reconstruction run.
#[derive(Debug, Clone, Default)]
pub struct ReProfileSummary {
    pub total_edges: usize,
    pub closed_polygons: usize,
    /// Equilateral polygons replaced by circles.
    pub equilateral: usize,
    pub arc_runs: usize,
    pub colinear_runs: usize,
    pub spline_runs: usize,
    /// Unclaimed construction edges switched to normal geometry.
    pub toggled: usize,
    pub constraints_added: usize,
    pub constraints_failed: usize,
    pub edges_used: usize,
    pub edges_unused: usize,
    pub zero_length: usize,
    /// Geometry that could not be read from the host.
    pub skipped: usize,
    pub initial_stats: Option<EdgeStats>,
    pub residual_stats: Option<EdgeStats>,
    pub elapsed: Duration,
}

/// Replaces recognisable runs of tessellated edges with analytic geometry.
///
/// The source edges are never deleted. Claimed edges stay as they are,
/// unclaimed construction edges are switched to normal geometry, and the
/// new geometry is tied together with endpoint Coincident constraints.
pub struct ReProfile {
    config: ReProfileConfig,
}

impl ReProfile {
    #[must_use]
    pub fn new(config: ReProfileConfig) -> Self {
        Self { config }
    }

    /// Runs reconstruction on `host` inside one transaction.
    ///
    /// A shape whose fit fails (no circle through the points, or a spline
    /// that cannot be interpolated) is logged and skipped. Any host error
    /// aborts the transaction, leaving the sketch unchanged.
    ///
    /// # Errors
    ///
    /// Returns the first host error, after the transaction is rolled back.
    #[instrument(skip(self, host))]
    pub fn execute<H: SketchHost + ?Sized>(&self, host: &mut H) -> Result<ReProfileSummary> {
        let started = Instant::now();
        let snapshot = SketchSnapshot::capture(&*host)?;
        let mut summary =
            with_transaction(host, TRANSACTION_NAME, |h| self.rebuild(h, &snapshot))?;
        summary.elapsed = started.elapsed();

        info!(
            edges = summary.total_edges,
            polygons = summary.closed_polygons,
            circles = summary.equilateral,
            arcs = summary.arc_runs,
            lines = summary.colinear_runs,
            splines = summary.spline_runs,
            toggled = summary.toggled,
            constraints = summary.constraints_added,
            failed = summary.constraints_failed,
            elapsed_ms = summary.elapsed.as_millis(),
            "reprofile complete"
        );
        Ok(summary)
    }

    fn rebuild<H: SketchHost + ?Sized>(
        &self,
        host: &mut H,
        snapshot: &SketchSnapshot,
    ) -> Result<ReProfileSummary> {
        let cfg = &self.config;
        let mut summary = ReProfileSummary {
            skipped: snapshot.skipped(),
            ..ReProfileSummary::default()
        };

        // Step 1: profile graph and input statistics.
        let pg = ProfileGraph::from_snapshot(snapshot, cfg.merge_tolerance);
        summary.total_edges = pg.edge_count();
        summary.zero_length = pg.zero_length.len();
        let lengths: Vec<f64> = (0..pg.edge_count()).map(|e| pg.length(e)).collect();
        summary.initial_stats = EdgeStats::from_lengths(&lengths);
        if let Some(stats) = &summary.initial_stats {
            stats.log("input");
        }
        let mut used = UsedEdges::new(pg.edge_count());

        // Step 2: closed polygons, equilateral ones become circles.
        let polygons = greedy_loops(&pg.graph, cfg.walk_step_cap);
        summary.closed_polygons = polygons.len();
        let classes = classify_polygons(&pg, &polygons, cfg.equilateral_tolerance);
        let mut remaining = Vec::new();
        for class in classes {
            let free = class.polygon.edges.iter().all(|&e| !used.is_used(e));
            match class.circle {
                Some((center, radius)) if class.equilateral && free => {
                    emit::circle(host, center, radius)?;
                    used.claim_all(&class.polygon.edges);
                    summary.equilateral += 1;
                }
                _ => remaining.push(class.polygon),
            }
        }

        // Step 3: partial arc runs inside the other polygons.
        for polygon in &remaining {
            let runs = find_arc_runs(
                &pg,
                polygon,
                cfg.arc_length_tolerance,
                cfg.arc_angle_tolerance_deg,
            );
            for run in runs {
                if run.chain.edges.iter().any(|&e| used.is_used(e)) {
                    continue;
                }
                let Some((center, radius)) = run.circle() else {
                    warn!(edges = run.chain.len(), "arc run has no circle fit, skipping");
                    continue;
                };
                emit::arc(host, [run.start, run.mid, run.end], center, radius)?;
                used.claim_all(&run.chain.edges);
                summary.arc_runs += 1;
            }
        }

        // Step 4: colinear runs.
        for run in find_colinear_runs(
            &pg,
            &mut used,
            cfg.colinear_angle_tolerance_deg,
            cfg.colinear_min_run,
        ) {
            let points = run.points(&pg.graph);
            if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
                emit::line(host, first, last)?;
                summary.colinear_runs += 1;
            }
        }

        // Step 5: smooth chains become splines.
        for run in find_spline_runs(&pg, &mut used, cfg.spline_angle_threshold_deg, cfg.spline_min_run)
        {
            match interpolate(&run.points(&pg.graph), cfg.spline_degree) {
                Ok(curve) => {
                    emit::spline(host, curve)?;
                    summary.spline_runs += 1;
                }
                Err(err) => {
                    warn!(edges = run.len(), error = %err, "spline interpolation failed, skipping");
                    for &e in &run.edges {
                        used.release(e);
                    }
                }
            }
        }

        // Step 6: leftover construction edges are real profile content.
        let unused: Vec<_> = used.unused().collect();
        for &e in &unused {
            if pg.is_construction(e) {
                host.toggle_construction(pg.geo(e))?;
                summary.toggled += 1;
            }
        }
        summary.edges_used = used.count();
        summary.edges_unused = unused.len();
        let residual: Vec<f64> = unused.iter().map(|&e| pg.length(e)).collect();
        summary.residual_stats = EdgeStats::from_lengths(&residual);
        if let Some(stats) = &summary.residual_stats {
            stats.log("residual");
        }
        debug!(used = summary.edges_used, unused = summary.edges_unused, "edges claimed");

        // Step 7: tie endpoints of normal geometry together.
        let outcome = constrain_endpoints(host, cfg.coincident_tolerance)?;
        summary.constraints_added = outcome.added;
        summary.constraints_failed = outcome.failed;
        Ok(summary)
    }
}

impl Default for ReProfile {
    fn default() -> Self {
        Self::new(ReProfileConfig::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::TAU;

    use super::*;
    use crate::geometry::Curve;
    use crate::math::Point2;
    use crate::error::HostError;
    use crate::sketch::{
        Constraint, ConstraintKind, GeoId, GeometrySource, Sketch, TransactionControl,
    };

    fn regular(n: usize, radius: f64, center: Point2) -> Vec<Point2> {
        #[allow(clippy::cast_precision_loss)]
        (0..n)
            .map(|i| {
                let a = TAU * i as f64 / n as f64;
                Point2::new(center.x + radius * a.cos(), center.y + radius * a.sin())
            })
            .collect()
    }

    fn circles(s: &Sketch) -> Vec<(Point2, f64)> {
        (0..s.len())
            .filter_map(|i| match s.curve(i) {
                Some(Curve::Circle(c)) => Some((*c.center(), c.radius())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn hexagon_becomes_circle() {
        let mut s = Sketch::new();
        s.push_polygon(&regular(6, 10.0, Point2::new(5.0, -2.0)));
        let summary = ReProfile::default().execute(&mut s).unwrap();

        assert_eq!(summary.total_edges, 6);
        assert_eq!(summary.closed_polygons, 1);
        assert_eq!(summary.equilateral, 1);
        assert_eq!(summary.edges_used, 6);
        assert_eq!(summary.toggled, 0);
        let found = circles(&s);
        assert_eq!(found.len(), 1);
        let (c, r) = found[0];
        assert!((c - Point2::new(5.0, -2.0)).norm() < 1e-3, "c={c}");
        assert!((r - 10.0).abs() < 1e-3, "r={r}");
        assert_eq!(s.transaction_name(), None);
        assert_eq!(s.recompute_count(), 1);
    }

    #[test]
    fn recognized_output_is_stable() {
        let mut s = Sketch::new();
        let anchor = s.push_line(Point2::origin(), Point2::new(3.0, 4.0), true);
        s.add_constraint(Constraint::block(anchor)).unwrap();
        let circle = s
            .add_circle(Point2::new(3.0, 4.0), 2.0)
            .unwrap();
        s.add_constraint(Constraint::radius(circle, 2.0)).unwrap();
        let before = s.len();

        let summary = ReProfile::default().execute(&mut s).unwrap();
        assert_eq!(summary.total_edges, 0);
        assert_eq!(summary.equilateral + summary.arc_runs + summary.spline_runs, 0);
        assert_eq!(s.len(), before);
        assert!(s.is_construction(anchor).unwrap());
    }

    #[test]
    fn unclaimed_construction_edges_are_toggled() {
        let mut s = Sketch::new();
        let lone = s.push_line(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), true);
        s.push_line(Point2::new(1.0, 0.0), Point2::new(1.0, 3.0), true);
        let summary = ReProfile::default().execute(&mut s).unwrap();
        assert_eq!(summary.toggled, 2);
        assert_eq!(summary.edges_unused, 2);
        assert!(!s.is_construction(lone).unwrap());
        // The two now-normal lines share a corner.
        let joined = s
            .constraint_list()
            .iter()
            .filter(|c| c.kind == ConstraintKind::Coincident)
            .count();
        assert_eq!(joined, 1);
        assert_eq!(summary.constraints_added, 1);
    }

    #[test]
    fn colinear_pieces_merge_into_one_line() {
        let mut s = Sketch::new();
        for i in 0..3 {
            let x = f64::from(i);
            s.push_line(Point2::new(x, 0.0), Point2::new(x + 1.0, 0.0), true);
        }
        let summary = ReProfile::default().execute(&mut s).unwrap();
        assert_eq!(summary.colinear_runs, 1);
        let Some(Curve::Line(l)) = s.curve(3) else {
            panic!("expected a merged line");
        };
        assert!(((l.end() - l.start()).norm() - 3.0).abs() < 1e-12);
    }

    /// Sketch whose `add_circle` always fails.
    struct NoCircles(Sketch);

    impl GeometrySource for NoCircles {
        fn geometry_count(&self) -> usize {
            self.0.geometry_count()
        }
        fn geometry(&self, id: GeoId) -> Result<Curve> {
            self.0.geometry(id)
        }
        fn is_construction(&self, id: GeoId) -> Result<bool> {
            self.0.is_construction(id)
        }
        fn constraints(&self) -> Result<Vec<Constraint>> {
            self.0.constraints()
        }
    }

    impl GeometrySink for NoCircles {
        fn add_line_segment(&mut self, start: Point2, end: Point2) -> Result<GeoId> {
            self.0.add_line_segment(start, end)
        }
        fn add_circle(&mut self, _center: Point2, _radius: f64) -> Result<GeoId> {
            Err(HostError::Failed("circles unsupported".into()).into())
        }
        fn add_arc(&mut self, start: Point2, mid: Point2, end: Point2) -> Result<GeoId> {
            self.0.add_arc(start, mid, end)
        }
        fn add_bspline(
            &mut self,
            poles: Vec<Point2>,
            knots: Vec<f64>,
            mults: Vec<u32>,
            degree: usize,
            periodic: bool,
        ) -> Result<GeoId> {
            self.0.add_bspline(poles, knots, mults, degree, periodic)
        }
        fn add_constraint(&mut self, constraint: Constraint) -> Result<usize> {
            self.0.add_constraint(constraint)
        }
        fn set_construction(&mut self, id: GeoId, construction: bool) -> Result<()> {
            self.0.set_construction(id, construction)
        }
        fn toggle_construction(&mut self, id: GeoId) -> Result<()> {
            self.0.toggle_construction(id)
        }
        fn delete_geometry(&mut self, ids: &[GeoId]) -> Result<()> {
            self.0.delete_geometry(ids)
        }
    }

    impl TransactionControl for NoCircles {
        fn open_transaction(&mut self, name: &str) -> Result<()> {
            self.0.open_transaction(name)
        }
        fn commit_transaction(&mut self) -> Result<()> {
            self.0.commit_transaction()
        }
        fn abort_transaction(&mut self) -> Result<()> {
            self.0.abort_transaction()
        }
        fn recompute(&mut self) -> Result<()> {
            self.0.recompute()
        }
    }

    #[test]
    fn host_failure_rolls_back() {
        let mut s = Sketch::new();
        s.push_polygon(&regular(6, 10.0, Point2::origin()));
        let mut host = NoCircles(s);
        assert!(ReProfile::default().execute(&mut host).is_err());
        // The anchor line added before the failing circle is gone too.
        assert_eq!(host.0.len(), 6);
        assert!(host.0.constraint_list().is_empty());
        assert_eq!(host.0.transaction_name(), None);
        assert_eq!(host.0.recompute_count(), 0);
    }

    #[test]
    fn open_transaction_elsewhere_is_an_error() {
        let mut s = Sketch::new();
        s.push_polygon(&regular(6, 10.0, Point2::origin()));
        s.open_transaction("held").unwrap();
        assert!(ReProfile::default().execute(&mut s).is_err());
        assert_eq!(s.len(), 6);
    }
}
