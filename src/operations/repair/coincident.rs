//! Coincident constraints for vertices that share a location.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{debug, info, instrument, warn};

use crate::error::Result;
use crate::geometry::{CurveKind, PointPos};
use crate::math::Point2;
use crate::operations::diagnose::DiagnoseConfig;
use crate::operations::reprofile::CoincidenceOutcome;
use crate::sketch::{
    with_transaction, Constraint, ConstraintKind, GeoRef, SketchHost, SketchSnapshot,
};

pub const TRANSACTION_NAME: &str = "Coincident All Constraints";

/// How far a grouped vertex sits from its group's first vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Proximity {
    Near,
    Loose,
}

/// One addressable point of a geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SketchVertex {
    pub at: GeoRef,
    pub point: Point2,
    pub kind: CurveKind,
    pub construction: bool,
}

impl SketchVertex {
    /// B-spline endpoints follow their circle centers, and construction
    /// geometry other than circle centers is left alone.
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        if self.kind == CurveKind::BSpline {
            return false;
        }
        !self.construction || (self.kind == CurveKind::Circle && self.at.pos == PointPos::Center)
    }
}

/// Vertices within the loose distance of the group's first vertex.
#[derive(Debug, Clone)]
pub struct VertexGroup {
    pub location: Point2,
    pub members: Vec<(SketchVertex, Proximity)>,
    /// Members that may receive constraints, in member order.
    pub eligible: Vec<SketchVertex>,
}

/// Start and end of open curves, then the center of circles and arcs.
#[must_use]
pub fn collect_vertices(snapshot: &SketchSnapshot) -> Vec<SketchVertex> {
    let mut out = Vec::new();
    for entry in snapshot.entries() {
        let kind = entry.curve.kind();
        let mut positions = Vec::with_capacity(3);
        match entry.curve.endpoints() {
            Ok(Some((start, end))) => {
                positions.push((PointPos::Start, start));
                positions.push((PointPos::End, end));
            }
            Ok(None) => {}
            Err(err) => debug!(geo = entry.id, error = %err, "endpoints unavailable"),
        }
        if matches!(kind, CurveKind::Circle | CurveKind::Arc) {
            if let Some(center) = entry.curve.center() {
                positions.push((PointPos::Center, center));
            }
        }
        out.extend(positions.into_iter().map(|(pos, point)| SketchVertex {
            at: GeoRef::new(entry.id, pos),
            point,
            kind,
            construction: entry.construction,
        }));
    }
    out
}

/// Coincident constraints as an undirected graph over points.
#[derive(Debug, Default)]
pub struct CoincidenceNetwork {
    links: HashMap<GeoRef, Vec<GeoRef>>,
}

impl CoincidenceNetwork {
    #[must_use]
    pub fn from_constraints(constraints: &[Constraint]) -> Self {
        let mut network = Self::default();
        for c in constraints {
            if let (ConstraintKind::Coincident, Some(second)) = (c.kind, c.second) {
                network.link(c.first, second);
            }
        }
        network
    }

    pub fn link(&mut self, a: GeoRef, b: GeoRef) {
        self.links.entry(a).or_default().push(b);
        self.links.entry(b).or_default().push(a);
    }

    /// Whether `a` reaches `b` through coincident constraints.
    #[must_use]
    pub fn joined(&self, a: GeoRef, b: GeoRef) -> bool {
        if a == b {
            return true;
        }
        let mut seen = HashSet::from([a]);
        let mut queue = VecDeque::from([a]);
        while let Some(current) = queue.pop_front() {
            for &next in self.links.get(&current).into_iter().flatten() {
                if next == b {
                    return true;
                }
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        false
    }
}

/// Groups vertices greedily around the first unassigned one.
fn group_vertices(vertices: &[SketchVertex], near: f64, loose: f64) -> Vec<VertexGroup> {
    let mut assigned = vec![false; vertices.len()];
    let mut groups = Vec::new();
    for i in 0..vertices.len() {
        if assigned[i] {
            continue;
        }
        assigned[i] = true;
        let seed = vertices[i];
        let mut members = vec![(seed, Proximity::Near)];
        for (j, other) in vertices.iter().enumerate().skip(i + 1) {
            if assigned[j] {
                continue;
            }
            let d = (other.point - seed.point).norm();
            let proximity = if d <= near {
                Proximity::Near
            } else if d <= loose {
                Proximity::Loose
            } else {
                continue;
            };
            assigned[j] = true;
            members.push((*other, proximity));
        }
        let eligible = members
            .iter()
            .map(|(v, _)| *v)
            .filter(SketchVertex::is_eligible)
            .collect();
        groups.push(VertexGroup {
            location: seed.point,
            members,
            eligible,
        });
    }
    groups
}

/// Groups with at least two eligible vertices not yet joined, directly or
/// transitively, by coincident constraints.
#[must_use]
pub fn find_non_coincident(snapshot: &SketchSnapshot, near: f64, loose: f64) -> Vec<VertexGroup> {
    let network = CoincidenceNetwork::from_constraints(snapshot.constraints());
    let groups: Vec<VertexGroup> = group_vertices(&collect_vertices(snapshot), near, loose)
        .into_iter()
        .filter(|g| {
            g.eligible.iter().enumerate().any(|(i, a)| {
                g.eligible[i + 1..]
                    .iter()
                    .any(|b| !network.joined(a.at, b.at))
            })
        })
        .collect();
    debug!(groups = groups.len(), "non-coincident vertex groups");
    groups
}

/// Preference for a vertex as the anchor of its group.
///
/// 100 per coincident or internal-alignment constraint on the point, 50 per
/// distinct geometry those constraints reach, 20 for a construction circle
/// center and 10 for a line.
#[must_use]
pub fn anchor_score(snapshot: &SketchSnapshot, vertex: &SketchVertex) -> u32 {
    let mut count = 0_u32;
    let mut reached = HashSet::new();
    for c in snapshot.constraints() {
        if !matches!(
            c.kind,
            ConstraintKind::Coincident | ConstraintKind::InternalAlignment
        ) {
            continue;
        }
        let Some(second) = c.second else {
            continue;
        };
        let other = if c.first == vertex.at {
            second
        } else if second == vertex.at {
            c.first
        } else {
            continue;
        };
        count += 1;
        reached.insert(other.geo);
    }
    let mut score = 100 * count;
    score += 50 * u32::try_from(reached.len()).unwrap_or(u32::MAX / 100);
    if vertex.kind == CurveKind::Circle && vertex.construction && vertex.at.pos == PointPos::Center
    {
        score += 20;
    }
    if vertex.kind == CurveKind::Line {
        score += 10;
    }
    score
}

/// First eligible vertex with the highest [`anchor_score`].
#[must_use]
pub fn best_anchor(snapshot: &SketchSnapshot, group: &VertexGroup) -> Option<SketchVertex> {
    group
        .eligible
        .iter()
        .map(|v| (*v, anchor_score(snapshot, v)))
        .fold(None, |best: Option<(SketchVertex, u32)>, (v, score)| match best {
            Some((_, top)) if top >= score => best,
            _ => Some((v, score)),
        })
        .map(|(v, _)| v)
}

/// Constrains every eligible vertex of each non-coincident group to the
/// group's anchor.
#[derive(Debug, Clone, Copy)]
pub struct CoincideVertices {
    near: f64,
    loose: f64,
}

impl Default for CoincideVertices {
    fn default() -> Self {
        Self::from_config(&DiagnoseConfig::default())
    }
}

impl CoincideVertices {
    #[must_use]
    pub fn new(near: f64, loose: f64) -> Self {
        Self { near, loose }
    }

    #[must_use]
    pub fn from_config(config: &DiagnoseConfig) -> Self {
        Self::new(config.near_coincident, config.loose_coincident)
    }

    /// Rejected constraints are logged and counted; the rest are committed.
    ///
    /// # Errors
    ///
    /// Returns an error if the sketch cannot be read or the transaction
    /// cannot be opened or committed.
    #[instrument(skip(self, host))]
    pub fn execute<H: SketchHost + ?Sized>(&self, host: &mut H) -> Result<CoincidenceOutcome> {
        let snapshot = SketchSnapshot::capture(host)?;
        let groups = find_non_coincident(&snapshot, self.near, self.loose);
        if groups.is_empty() {
            return Ok(CoincidenceOutcome::default());
        }
        let mut network = CoincidenceNetwork::from_constraints(snapshot.constraints());
        let outcome = with_transaction(host, TRANSACTION_NAME, |h| {
            let mut outcome = CoincidenceOutcome::default();
            for group in &groups {
                let Some(anchor) = best_anchor(&snapshot, group) else {
                    continue;
                };
                for v in &group.eligible {
                    if v.at.geo == anchor.at.geo || network.joined(v.at, anchor.at) {
                        continue;
                    }
                    match h.add_constraint(Constraint::coincident(v.at, anchor.at)) {
                        Ok(_) => {
                            network.link(v.at, anchor.at);
                            outcome.added += 1;
                        }
                        Err(err) => {
                            warn!(
                                geo = v.at.geo,
                                anchor = anchor.at.geo,
                                error = %err,
                                "coincident constraint rejected"
                            );
                            outcome.failed += 1;
                        }
                    }
                }
            }
            Ok(outcome)
        })?;
        info!(
            groups = groups.len(),
            added = outcome.added,
            failed = outcome.failed,
            "vertices made coincident"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::{Circle, Curve};
    use crate::sketch::{GeometrySink, Sketch};

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn snap(s: &Sketch) -> SketchSnapshot {
        SketchSnapshot::capture(s).unwrap()
    }

    #[test]
    fn near_and_loose_tiers() {
        let mut s = Sketch::new();
        s.push_line(p(0.0, 0.0), p(1.0, 0.0), false);
        s.push_line(p(1.0 + 2e-6, 0.0), p(1.0, 1.0), false);
        s.push_line(p(1.0, 1.0 + 50e-6), p(0.0, 1.0), false);
        let groups = find_non_coincident(&snap(&s), 5e-6, 100e-6);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].members[1].1, Proximity::Near);
        assert_eq!(groups[1].members[1].1, Proximity::Loose);
    }

    #[test]
    fn transitive_coincidence_needs_nothing() {
        let mut s = Sketch::new();
        let a = s.push_line(p(0.0, 0.0), p(1.0, 0.0), false);
        let b = s.push_line(p(1.0, 0.0), p(2.0, 0.0), false);
        let c = s.push_line(p(1.0, 0.0), p(1.0, 1.0), false);
        s.add_constraint(Constraint::coincident(GeoRef::end(a), GeoRef::start(b)))
            .unwrap();
        s.add_constraint(Constraint::coincident(GeoRef::start(b), GeoRef::start(c)))
            .unwrap();
        assert!(find_non_coincident(&snap(&s), 5e-6, 100e-6).is_empty());
    }

    #[test]
    fn spline_ends_and_construction_are_not_eligible() {
        let mut s = Sketch::new();
        s.push_line(p(0.0, 0.0), p(1.0, 0.0), false);
        s.push_line(p(1.0, 0.0), p(1.0, 1.0), true);
        s.add_bspline(
            vec![p(1.0, 0.0), p(2.0, 1.0), p(3.0, 1.0), p(4.0, 0.0)],
            vec![0.0, 1.0],
            vec![4, 4],
            3,
            false,
        )
        .unwrap();
        assert!(find_non_coincident(&snap(&s), 5e-6, 100e-6).is_empty());
    }

    #[test]
    fn construction_circle_center_wins_anchor() {
        let mut s = Sketch::new();
        s.push(Curve::Circle(Circle::new(p(0.0, 0.0), 2.0).unwrap()), true);
        s.push_line(p(0.0, 0.0), p(3.0, 0.0), false);
        s.push_line(p(0.0, 0.0), p(0.0, 3.0), false);
        let snapshot = snap(&s);
        let groups = find_non_coincident(&snapshot, 5e-6, 100e-6);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].eligible.len(), 3);
        assert_eq!(best_anchor(&snapshot, &groups[0]).unwrap().at, GeoRef::center(0));
    }

    #[test]
    fn existing_constraints_outweigh_kind() {
        let mut s = Sketch::new();
        s.push(Curve::Circle(Circle::new(p(0.0, 0.0), 2.0).unwrap()), true);
        let a = s.push_line(p(0.0, 0.0), p(3.0, 0.0), false);
        s.push_line(p(-3.0, 0.0), p(0.0, 0.0), false);
        let far = s.push_line(p(0.0, 9.0), p(0.0, 3.0), false);
        s.add_constraint(Constraint::coincident(GeoRef::start(a), GeoRef::end(far)))
            .unwrap();
        let snapshot = snap(&s);
        let start_a = SketchVertex {
            at: GeoRef::start(a),
            point: p(0.0, 0.0),
            kind: CurveKind::Line,
            construction: false,
        };
        assert_eq!(anchor_score(&snapshot, &start_a), 160);
        let group = &find_non_coincident(&snapshot, 5e-6, 100e-6)[0];
        assert_eq!(best_anchor(&snapshot, group).unwrap().at, GeoRef::start(a));
    }

    #[test]
    fn execute_links_group_to_anchor_once() {
        let mut s = Sketch::new();
        let a = s.push_line(p(0.0, 0.0), p(1.0, 0.0), false);
        let b = s.push_line(p(1.0, 0.0), p(1.0, 1.0), false);
        let c = s.push_line(p(1.0 + 1e-6, 0.0), p(2.0, 0.0), false);
        let outcome = CoincideVertices::default().execute(&mut s).unwrap();
        assert_eq!(outcome, CoincidenceOutcome { added: 2, failed: 0 });
        assert_eq!(s.transaction_name(), None);
        let list = s.constraint_list();
        assert!(list.contains(&Constraint::coincident(GeoRef::start(b), GeoRef::end(a))));
        assert!(list.contains(&Constraint::coincident(GeoRef::start(c), GeoRef::end(a))));
        assert_eq!(
            CoincideVertices::default().execute(&mut s).unwrap(),
            CoincidenceOutcome::default()
        );
    }
}
