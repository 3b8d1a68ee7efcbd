use tracing::debug;

use super::resolve::{Resolution, Wire};
use super::types::{IssueKind, Severity, TopologyIssue};
use crate::geometry::PointPos;
use crate::math::Point2;
use crate::sketch::{ConstraintKind, GeoRef, SketchSnapshot};

/// Connection counts at one endpoint.
#[derive(Debug, Clone, Copy)]
struct EndState {
    /// Graph connections plus coincident coordinates.
    vertex_total: usize,
    /// Non-coincident constraints on the endpoint, such as point-on-object.
    other: usize,
}

fn end_state(
    snapshot: &SketchSnapshot,
    res: &Resolution,
    wire: &Wire,
    pos: PointPos,
    at: Point2,
) -> EndState {
    let v = if pos == PointPos::Start {
        wire.start_vertex
    } else {
        wire.end_vertex
    };
    let target = GeoRef::new(wire.geo, pos);
    let other = snapshot
        .constraints()
        .iter()
        .filter(|c| c.kind != ConstraintKind::Coincident && c.refs().any(|r| r == target))
        .count();
    EndState {
        vertex_total: res.connections(wire, v) + res.maps.coincident_count(&at),
        other,
    }
}

/// Endpoints with no vertex-level connection.
///
/// Both ends free gives "No connections", or "Anchored but not connected"
/// if either end carries another constraint. One end free gives "Dangling
/// edge", or "Anchored but not connected" if that end is constrained.
#[must_use]
pub fn find_dangling(snapshot: &SketchSnapshot, res: &Resolution) -> Vec<TopologyIssue> {
    let mut issues = Vec::new();
    for wire in &res.wires {
        let start = end_state(snapshot, res, wire, PointPos::Start, wire.start);
        let end = end_state(snapshot, res, wire, PointPos::End, wire.end);
        let description = match (start.vertex_total == 0, end.vertex_total == 0) {
            (false, false) => continue,
            (true, true) if start.other > 0 || end.other > 0 => "Anchored but not connected",
            (true, true) => "No connections",
            (true, false) if start.other > 0 => "Anchored but not connected",
            (false, true) if end.other > 0 => "Anchored but not connected",
            _ => "Dangling edge",
        };
        debug!(
            geo = wire.geo,
            start = start.vertex_total,
            end = end.vertex_total,
            description,
            "incomplete connection"
        );
        issues.push(TopologyIssue::new(
            wire.geo,
            wire.curve,
            IssueKind::TJunction,
            description,
            Severity::Low,
        ));
    }
    issues
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::diagnose::{resolve, DiagnoseConfig};
    use crate::sketch::{Constraint, GeometrySink, Sketch};

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn run(s: &Sketch) -> Vec<(usize, String)> {
        let snap = SketchSnapshot::capture(s).unwrap();
        let res = resolve(&snap, &DiagnoseConfig::default()).unwrap();
        find_dangling(&snap, &res)
            .into_iter()
            .map(|i| (i.geo, i.description))
            .collect()
    }

    #[test]
    fn descriptions_follow_end_states() {
        let mut s = Sketch::new();
        // 0, 1: an L shape with free outer ends.
        s.push_line(p(0.0, 0.0), p(1.0, 0.0), false);
        s.push_line(p(1.0, 0.0), p(1.0, 1.0), false);
        // 2: alone.
        s.push_line(p(5.0, 5.0), p(6.0, 5.0), false);
        // 3: alone but its start rests on line 2.
        s.push_line(p(5.5, 5.0), p(5.5, 7.0), false);
        s.add_constraint(Constraint::point_on_object(GeoRef::start(3), 2))
            .unwrap();

        let found = run(&s);
        assert_eq!(
            found,
            vec![
                (0, "Dangling edge".to_string()),
                (1, "Dangling edge".to_string()),
                (2, "No connections".to_string()),
                (3, "Anchored but not connected".to_string()),
            ]
        );
    }

    #[test]
    fn coincident_constraint_counts_as_connection() {
        let mut s = Sketch::new();
        s.push_line(p(0.0, 0.0), p(1.0, 0.0), false);
        s.push_line(p(1.0, 0.0), p(2.0, 0.0), false);
        s.push_line(p(0.0, 0.0), p(0.0, -1.0), true);
        s.push_line(p(2.0, 0.0), p(2.0, -1.0), true);
        s.add_constraint(Constraint::coincident(GeoRef::start(0), GeoRef::start(2)))
            .unwrap();
        s.add_constraint(Constraint::coincident(GeoRef::end(1), GeoRef::start(3)))
            .unwrap();
        assert!(run(&s).is_empty());
    }
}
