use tracing::debug;

use super::resolve::Resolution;
use super::types::{IssueKind, Severity, TopologyIssue};
use crate::geometry::CurveKind;

/// Normal B-splines whose endpoints could not be resolved.
#[must_use]
pub fn unresolved_splines(res: &Resolution) -> Vec<TopologyIssue> {
    res.unresolved
        .iter()
        .map(|&geo| {
            TopologyIssue::new(
                geo,
                CurveKind::BSpline,
                IssueKind::Isolation,
                "B-spline connectivity not resolved",
                Severity::High,
            )
        })
        .collect()
}

/// Geometry with nothing attached at either endpoint.
#[must_use]
pub fn find_orphans(res: &Resolution) -> Vec<TopologyIssue> {
    res.wires
        .iter()
        .filter(|w| {
            res.connections(w, w.start_vertex) == 0 && res.connections(w, w.end_vertex) == 0
        })
        .map(|w| {
            debug!(geo = w.geo, "orphaned geometry");
            TopologyIssue::new(
                w.geo,
                w.curve,
                IssueKind::Isolation,
                "Orphaned geometry (not connected to anything)",
                Severity::Medium,
            )
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point2;
    use crate::operations::diagnose::{resolve, DiagnoseConfig};
    use crate::sketch::{Sketch, SketchSnapshot};

    #[test]
    fn lone_line_is_orphaned_and_chain_is_not() {
        let mut s = Sketch::new();
        s.push_line(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), false);
        s.push_line(Point2::new(1.0, 0.0), Point2::new(2.0, 0.0), false);
        s.push_line(Point2::new(5.0, 5.0), Point2::new(6.0, 5.0), false);
        s.push_line(Point2::new(9.0, 9.0), Point2::new(9.0, 10.0), true);
        let snap = SketchSnapshot::capture(&s).unwrap();
        let res = resolve(&snap, &DiagnoseConfig::default()).unwrap();
        let orphans = find_orphans(&res);
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].geo, 2);
        assert_eq!(orphans[0].severity, Severity::Medium);
    }
}
