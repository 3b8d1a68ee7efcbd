use tracing::debug;

use super::{Chain, ProfileGraph};
use crate::math::circle_fit::fit_circle;
use crate::math::{angle_between_deg, Point2};
use crate::topology::Loop;

/// A run of equal-length edges turning at a steady rate.
#[derive(Debug, Clone)]
pub struct ArcRun {
    pub chain: Chain,
    pub average_length: f64,
    /// Mean turning angle between consecutive edges, in degrees.
    pub average_turn_deg: f64,
    pub start: Point2,
    /// Vertex halfway along the run.
    pub mid: Point2,
    pub end: Point2,
}

impl ArcRun {
    /// Circle through the start, middle and end vertices.
    #[must_use]
    pub fn circle(&self) -> Option<(Point2, f64)> {
        fit_circle(&[self.start, self.mid, self.end])
    }
}

/// Finds partial arc runs along one closed polygon.
///
/// The edges are scanned in traversal order, starting just after the first
/// change in edge length so a run is not cut at the polygon's arbitrary
/// starting vertex. A run grows while each edge stays within `length_tol`
/// of the run's first edge and each turning angle stays within
/// `angle_tol_deg` of the previous turning angle. Runs of three or more
/// edges are kept.
#[must_use]
pub fn find_arc_runs(
    pg: &ProfileGraph,
    polygon: &Loop,
    length_tol: f64,
    angle_tol_deg: f64,
) -> Vec<ArcRun> {
    let n = polygon.edges.len();
    if n < 3 {
        return Vec::new();
    }
    let lengths: Vec<f64> = polygon.edges.iter().map(|&e| pg.length(e)).collect();
    let offset = (0..n)
        .find(|&i| (lengths[i] - lengths[(i + n - 1) % n]).abs() > length_tol)
        .unwrap_or(0);
    let order: Vec<usize> = (0..n).map(|k| (k + offset) % n).collect();
    let travel = |slot: usize| pg.travel(polygon.edges[slot], polygon.vertices[slot]);

    let mut runs = Vec::new();
    let mut i = 0;
    while i + 2 < n {
        let base = lengths[order[i]];
        let mut previous = travel(order[i]);
        let mut turns: Vec<f64> = Vec::new();
        let mut j = i + 1;
        while j < n {
            let slot = order[j];
            if (lengths[slot] - base).abs() > length_tol {
                break;
            }
            let direction = travel(slot);
            let Some(turn) = angle_between_deg(&previous, &direction) else {
                break;
            };
            if turns.last().is_some_and(|last| (turn - last).abs() > angle_tol_deg) {
                break;
            }
            turns.push(turn);
            previous = direction;
            j += 1;
        }

        if j - i >= 3 {
            let slots = &order[i..j];
            let edges: Vec<_> = slots.iter().map(|&s| polygon.edges[s]).collect();
            let mut vertices = vec![polygon.vertices[slots[0]]];
            vertices.extend(slots.iter().map(|&s| polygon.vertices[(s + 1) % n]));
            let chain = Chain { edges, vertices };
            let points = chain.points(&pg.graph);
            #[allow(clippy::cast_precision_loss)]
            let run = ArcRun {
                average_length: slots.iter().map(|&s| lengths[s]).sum::<f64>() / slots.len() as f64,
                average_turn_deg: turns.iter().sum::<f64>() / turns.len() as f64,
                start: points[0],
                mid: points[points.len() / 2],
                end: points[points.len() - 1],
                chain,
            };
            debug!(
                edges = run.chain.len(),
                length = run.average_length,
                turn = run.average_turn_deg,
                "arc run found"
            );
            runs.push(run);
            i = j;
        } else {
            i += 1;
        }
    }
    runs
}
