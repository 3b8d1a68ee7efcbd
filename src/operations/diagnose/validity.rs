use std::collections::HashSet;

use tracing::{debug, info};

use super::resolve::Resolution;
use super::types::{IssueKind, Severity, TopologyIssue};
use crate::geometry::{geometry_name, Curve};
use crate::math::distance_2d::within_per_axis;
use crate::math::Point2;
use crate::sketch::{CurveIntersector, GeoId, SketchSnapshot};

/// Returns `true` if every point lies within `tol` (per axis) of one of the
/// endpoints of `a` or `b`. A curve without endpoints fails the test.
fn all_at_endpoints(points: &[Point2], a: &Curve, b: &Curve, tol: f64) -> bool {
    let (Ok(Some((a0, a1))), Ok(Some((b0, b1)))) = (a.endpoints(), b.endpoints()) else {
        return false;
    };
    let ends = [a0, a1, b0, b1];
    points
        .iter()
        .all(|p| ends.iter().any(|e| within_per_axis(p, e, tol)))
}

/// Pairs of normal geometry that cross or overlap away from their shared
/// endpoints.
///
/// A pair is flagged when the bounded intersection has two or more points,
/// or a single point that is not at an endpoint of either curve. Pairs the
/// intersector cannot handle are logged and skipped.
pub fn find_crossings<I: CurveIntersector + ?Sized>(
    snapshot: &SketchSnapshot,
    res: &Resolution,
    intersector: &I,
    endpoint_tolerance: f64,
) -> Vec<(GeoId, GeoId)> {
    let mut pairs = Vec::new();
    for (i, &(ga, _)) in res.normal.iter().enumerate() {
        let Some(a) = snapshot.curve(ga) else { continue };
        for &(gb, _) in &res.normal[i + 1..] {
            let Some(b) = snapshot.curve(gb) else { continue };
            let points = match intersector.intersect(a, b) {
                Ok(points) => points,
                Err(err) => {
                    debug!(a = ga, b = gb, error = %err, "intersection failed, skipping pair");
                    continue;
                }
            };
            if points.is_empty() {
                continue;
            }
            let problematic =
                points.len() >= 2 || !all_at_endpoints(&points, a, b, endpoint_tolerance);
            debug!(a = ga, b = gb, points = points.len(), problematic, "intersection");
            if problematic {
                pairs.push((ga, gb));
            }
        }
    }
    info!(pairs = pairs.len(), "real intersections found");
    pairs
}

/// One issue per geometry taking part in a flagged pair, naming the first
/// partner it was found with.
#[must_use]
pub fn crossing_issues(res: &Resolution, pairs: &[(GeoId, GeoId)]) -> Vec<TopologyIssue> {
    let kind_of = |geo: GeoId| {
        res.normal
            .iter()
            .find(|(g, _)| *g == geo)
            .map(|&(_, k)| k)
    };
    let mut flagged = HashSet::new();
    let mut issues = Vec::new();
    for &(a, b) in pairs {
        let (Some(ka), Some(kb)) = (kind_of(a), kind_of(b)) else {
            continue;
        };
        for (geo, kind, other, other_kind) in [(a, ka, b, kb), (b, kb, a, ka)] {
            if flagged.insert(geo) {
                issues.push(TopologyIssue::new(
                    geo,
                    kind,
                    IssueKind::GeometricValidity,
                    format!("Real intersection with {}", geometry_name(other, other_kind)),
                    Severity::High,
                ));
            }
        }
    }
    issues
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::Circle;
    use crate::operations::diagnose::{resolve, DiagnoseConfig};
    use crate::sketch::{KernelIntersector, Sketch};

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn issues(s: &Sketch) -> Vec<TopologyIssue> {
        let snap = SketchSnapshot::capture(s).unwrap();
        let res = resolve(&snap, &DiagnoseConfig::default()).unwrap();
        let pairs = find_crossings(&snap, &res, &KernelIntersector, 1e-3);
        crossing_issues(&res, &pairs)
    }

    #[test]
    fn x_crossing_flags_both() {
        let mut s = Sketch::new();
        s.push_line(p(0.0, 0.0), p(2.0, 2.0), false);
        s.push_line(p(0.0, 2.0), p(2.0, 0.0), false);
        let found = issues(&s);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].description, "Real intersection with 2-Line");
        assert_eq!(found[1].description, "Real intersection with 1-Line");
    }

    #[test]
    fn shared_corner_is_fine() {
        let mut s = Sketch::new();
        s.push_line(p(0.0, 0.0), p(1.0, 0.0), false);
        s.push_line(p(1.0, 0.0), p(1.0, 1.0), false);
        assert!(issues(&s).is_empty());
    }

    #[test]
    fn line_through_circle_is_flagged_once_per_geometry() {
        let mut s = Sketch::new();
        s.push_line(p(-2.0, 0.0), p(2.0, 0.0), false);
        s.push(Curve::Circle(Circle::new(p(0.0, 0.0), 1.0).unwrap()), false);
        s.push_line(p(0.0, -2.0), p(0.0, 2.0), false);
        let found = issues(&s);
        assert_eq!(found.len(), 3);
        assert_eq!(found[0].geo, 0);
        assert_eq!(found[0].description, "Real intersection with 2-Circle");
    }

    #[test]
    fn construction_is_ignored() {
        let mut s = Sketch::new();
        s.push_line(p(0.0, 0.0), p(2.0, 2.0), false);
        s.push_line(p(0.0, 2.0), p(2.0, 0.0), true);
        assert!(issues(&s).is_empty());
    }
}
