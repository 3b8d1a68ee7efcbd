use std::collections::HashSet;

use tracing::debug;

use super::resolve::Resolution;
use super::types::{IssueKind, Severity, TopologyIssue};
use crate::sketch::GeoId;
use crate::topology::Loop;

/// Geometry ids taking part in at least one loop of the snapped graph.
#[must_use]
pub fn loop_members(res: &Resolution, loops: &[Loop]) -> HashSet<GeoId> {
    loops
        .iter()
        .flat_map(|l| l.geos(&res.loop_graph))
        .collect()
}

/// Geometry in no loop that still has other connections at both ends.
#[must_use]
pub fn find_bridges(res: &Resolution, loops: &[Loop]) -> Vec<TopologyIssue> {
    let members = loop_members(res, loops);
    debug!(
        in_loops = members.len(),
        normal = res.normal.len(),
        "loop membership"
    );
    res.wires
        .iter()
        .filter(|w| w.edge.is_some() && !members.contains(&w.geo))
        .filter(|w| {
            res.connections(w, w.start_vertex) > 0 && res.connections(w, w.end_vertex) > 0
        })
        .map(|w| {
            debug!(geo = w.geo, "bridge: in no loop, both ends connected");
            TopologyIssue::new(
                w.geo,
                w.curve,
                IssueKind::Bridge,
                "Cross-wire bridge (connects separate loop systems)",
                Severity::High,
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
    use crate::topology::enumerate_loops;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn connector_between_triangles_is_a_bridge() {
        let mut s = Sketch::new();
        for pts in [
            [p(0.0, 0.0), p(1.0, 0.0), p(0.0, 1.0)],
            [p(3.0, 0.0), p(4.0, 0.0), p(4.0, 1.0)],
        ] {
            for i in 0..3 {
                s.push_line(pts[i], pts[(i + 1) % 3], false);
            }
        }
        let connector = s.push_line(p(1.0, 0.0), p(3.0, 0.0), false);
        let snap = SketchSnapshot::capture(&s).unwrap();
        let res = resolve(&snap, &DiagnoseConfig::default()).unwrap();
        let loops = enumerate_loops(&res.loop_graph, 1000, res.normal.len()).loops;
        assert_eq!(loops.len(), 2);

        let bridges = find_bridges(&res, &loops);
        assert_eq!(bridges.len(), 1);
        assert_eq!(bridges[0].geo, connector);
        assert!(loop_members(&res, &loops).contains(&0));
    }

    #[test]
    fn dangling_tail_is_not_a_bridge() {
        let mut s = Sketch::new();
        s.push_line(p(0.0, 0.0), p(1.0, 0.0), false);
        s.push_line(p(1.0, 0.0), p(0.0, 1.0), false);
        s.push_line(p(0.0, 1.0), p(0.0, 0.0), false);
        s.push_line(p(1.0, 0.0), p(2.0, 0.0), false);
        let snap = SketchSnapshot::capture(&s).unwrap();
        let res = resolve(&snap, &DiagnoseConfig::default()).unwrap();
        let loops = enumerate_loops(&res.loop_graph, 1000, res.normal.len()).loops;
        assert!(find_bridges(&res, &loops).is_empty());
    }
}
