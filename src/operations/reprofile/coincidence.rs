use tracing::{debug, info, warn};

use crate::error::Result;
use crate::geometry::Curve;
use crate::math::Point2;
use crate::sketch::{Constraint, GeoRef, GeometrySink, GeometrySource, SketchSnapshot};

/// Counts from [`constrain_endpoints`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoincidenceOutcome {
    pub added: usize,
    pub failed: usize,
}

/// Start and end points of normal lines, arcs and open splines.
fn open_endpoints(snapshot: &SketchSnapshot) -> Vec<(GeoRef, Point2)> {
    let mut out = Vec::new();
    for entry in snapshot.normal() {
        if !matches!(entry.curve, Curve::Line(_) | Curve::Arc(_) | Curve::BSpline(_)) {
            continue;
        }
        match entry.curve.endpoints() {
            Ok(Some((start, end))) => {
                out.push((GeoRef::start(entry.id), start));
                out.push((GeoRef::end(entry.id), end));
            }
            Ok(None) => {}
            Err(err) => debug!(geo = entry.id, error = %err, "endpoints unavailable"),
        }
    }
    out
}

/// Groups points greedily: each group is seeded by the first unassigned
/// point and collects every later point within `tolerance` of that seed.
/// Singleton groups are dropped.
fn group_by_anchor(points: &[(GeoRef, Point2)], tolerance: f64) -> Vec<Vec<usize>> {
    let mut assigned = vec![false; points.len()];
    let mut groups = Vec::new();
    for i in 0..points.len() {
        if assigned[i] {
            continue;
        }
        assigned[i] = true;
        let mut group = vec![i];
        for j in (i + 1)..points.len() {
            if !assigned[j] && (points[j].1 - points[i].1).norm() <= tolerance {
                assigned[j] = true;
                group.push(j);
            }
        }
        if group.len() > 1 {
            groups.push(group);
        }
    }
    groups
}

/// Adds Coincident constraints between normal-geometry endpoints that share
/// a location.
///
/// The first endpoint of each location group is the anchor. Endpoints of
/// the anchor's own geometry and pairs already joined by a Coincident
/// constraint are skipped. A rejected constraint is logged and counted, and
/// the pass continues.
///
/// # Errors
///
/// Returns an error only if the sketch cannot be read.
pub fn constrain_endpoints<H>(host: &mut H, tolerance: f64) -> Result<CoincidenceOutcome>
where
    H: GeometrySource + GeometrySink + ?Sized,
{
    let snapshot = SketchSnapshot::capture(&*host)?;
    let endpoints = open_endpoints(&snapshot);
    let mut existing: Vec<Constraint> = snapshot.constraints().to_vec();
    let mut outcome = CoincidenceOutcome::default();

    for group in group_by_anchor(&endpoints, tolerance) {
        let anchor = endpoints[group[0]].0;
        for &member in &group[1..] {
            let vertex = endpoints[member].0;
            if vertex.geo == anchor.geo || existing.iter().any(|c| c.joins(vertex, anchor)) {
                continue;
            }
            let constraint = Constraint::coincident(vertex, anchor);
            match host.add_constraint(constraint.clone()) {
                Ok(_) => {
                    existing.push(constraint);
                    outcome.added += 1;
                }
                Err(err) => {
                    warn!(geo = vertex.geo, anchor = anchor.geo, error = %err, "coincident constraint rejected");
                    outcome.failed += 1;
                }
            }
        }
    }

    info!(
        added = outcome.added,
        failed = outcome.failed,
        "endpoint coincidence pass complete"
    );
    Ok(outcome)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::sketch::Sketch;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn joins_touching_lines_once() {
        let mut s = Sketch::new();
        s.push_line(p(0.0, 0.0), p(1.0, 0.0), false);
        s.push_line(p(1.0 + 1e-6, 0.0), p(1.0, 1.0), false);
        s.push_line(p(1.0, 1.0), p(0.0, 0.0), false);
        let first = constrain_endpoints(&mut s, 5e-6).unwrap();
        assert_eq!(first, CoincidenceOutcome { added: 3, failed: 0 });
        let again = constrain_endpoints(&mut s, 5e-6).unwrap();
        assert_eq!(again.added, 0);
    }

    #[test]
    fn construction_and_distant_points_ignored() {
        let mut s = Sketch::new();
        s.push_line(p(0.0, 0.0), p(1.0, 0.0), false);
        s.push_line(p(1.0, 0.0), p(2.0, 0.0), true);
        s.push_line(p(1.0 + 1e-4, 0.0), p(3.0, 0.0), false);
        let out = constrain_endpoints(&mut s, 5e-6).unwrap();
        assert_eq!(out.added, 0);
    }

    #[test]
    fn closed_line_does_not_join_itself() {
        let mut s = Sketch::new();
        s.push_line(p(0.0, 0.0), p(1e-7, 0.0), false);
        let out = constrain_endpoints(&mut s, 5e-6).unwrap();
        assert_eq!(out.added, 0);
    }
}
