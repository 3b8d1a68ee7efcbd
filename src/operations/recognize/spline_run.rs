use tracing::debug;

use super::{grow_chain, Chain, ProfileGraph, UsedEdges};
use crate::math::{angle_between_deg, Vector2};

/// Finds smooth chains of unclaimed lines to replace with splines.
///
/// Each unclaimed line seeds a maximal chain of unclaimed lines. The chain
/// is split wherever the turning angle between consecutive edges exceeds
/// `angle_threshold_deg`, and pieces of at least `min_run` edges are
/// claimed in `used` and returned. Chains shorter than `min_run` are
/// released so later seeds can regrow them.
pub fn find_spline_runs(
    pg: &ProfileGraph,
    used: &mut UsedEdges,
    angle_threshold_deg: f64,
    min_run: usize,
) -> Vec<Chain> {
    let mut grouped = used.clone();
    let mut runs = Vec::new();

    for seed in 0..pg.edge_count() {
        if grouped.is_used(seed) || !pg.is_line(seed) {
            continue;
        }
        grouped.claim(seed);
        let chain = grow_chain(pg, seed, |e, _, _| pg.is_line(e) && grouped.claim(e));
        if chain.len() < min_run {
            for &e in &chain.edges {
                grouped.release(e);
            }
            continue;
        }

        let headings: Vec<Vector2> = chain
            .edges
            .iter()
            .zip(&chain.vertices)
            .map(|(&e, &from)| pg.travel(e, from))
            .collect();
        let breaks: Vec<usize> = (1..headings.len())
            .filter(|&i| {
                angle_between_deg(&headings[i - 1], &headings[i])
                    .is_none_or(|turn| turn > angle_threshold_deg)
            })
            .collect();

        let mut start = 0;
        for end in breaks.into_iter().chain(std::iter::once(chain.len())) {
            if end - start >= min_run {
                let piece = Chain {
                    edges: chain.edges[start..end].to_vec(),
                    vertices: chain.vertices[start..=end].to_vec(),
                };
                used.claim_all(&piece.edges);
                debug!(edges = piece.len(), "spline run found");
                runs.push(piece);
            }
            start = end;
        }
    }
    runs
}
