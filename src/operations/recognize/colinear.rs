use tracing::debug;

use super::{grow_chain, Chain, ProfileGraph, UsedEdges};
use crate::math::{direction_deg, direction_delta_deg};

/// Finds runs of unclaimed lines that continue in the seed line's direction.
///
/// Seeds are taken in edge order. The chain grows from both ends of the seed
/// while the next line, walked outward, points within `angle_tol_deg` of
/// the seed's direction (or its reverse, on the start side). Runs shorter
/// than `min_run` release their edges; kept runs stay claimed in `used`.
pub fn find_colinear_runs(
    pg: &ProfileGraph,
    used: &mut UsedEdges,
    angle_tol_deg: f64,
    min_run: usize,
) -> Vec<Chain> {
    let mut runs = Vec::new();
    for seed in 0..pg.edge_count() {
        if used.is_used(seed) || !pg.is_line(seed) {
            continue;
        }
        used.claim(seed);
        let seed_edge = pg.graph.edges()[seed];
        let base = direction_deg(&pg.travel(seed, seed_edge.a));

        let chain = grow_chain(pg, seed, |e, from, forward| {
            if used.is_used(e) || !pg.is_line(e) {
                return false;
            }
            let expected = if forward { base } else { base + 180.0 };
            let heading = direction_deg(&pg.travel(e, from));
            direction_delta_deg(heading, expected) <= angle_tol_deg && used.claim(e)
        });

        if chain.len() >= min_run {
            debug!(edges = chain.len(), angle = base, "colinear run found");
            runs.push(chain);
        } else {
            for &e in &chain.edges {
                used.release(e);
            }
        }
    }
    runs
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point2;
    use crate::operations::recognize::tests::profile;
    use crate::sketch::Sketch;

    fn polar(from: Point2, length: f64, deg: f64) -> Point2 {
        let a = deg.to_radians();
        Point2::new(from.x + length * a.cos(), from.y + length * a.sin())
    }

    #[test]
    fn near_exact_direction_merges_and_small_kink_does_not() {
        let p0 = Point2::origin();
        let p1 = polar(p0, 1.0, 0.0);
        let p2 = polar(p1, 1.0, 1e-4);
        let p3 = polar(p2, 1.0, 0.1);
        let mut s = Sketch::new();
        s.push_line(p0, p1, true);
        s.push_line(p1, p2, true);
        s.push_line(p2, p3, true);
        let pg = profile(&s);
        let mut used = UsedEdges::new(pg.edge_count());
        let runs = find_colinear_runs(&pg, &mut used, 1e-2, 2);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].edges, vec![0, 1]);
        assert!(!used.is_used(2));
    }

    #[test]
    fn reversed_storage_still_merges() {
        let mut s = Sketch::new();
        s.push_line(Point2::new(2.0, 0.0), Point2::new(1.0, 0.0), true);
        s.push_line(Point2::new(1.0, 0.0), Point2::new(0.0, 0.0), true);
        s.push_line(Point2::new(2.0, 0.0), Point2::new(3.0, 0.0), true);
        let pg = profile(&s);
        let mut used = UsedEdges::new(pg.edge_count());
        let runs = find_colinear_runs(&pg, &mut used, 1e-2, 2);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].len(), 3);
        let pts = runs[0].points(&pg.graph);
        assert_eq!(pts.first().unwrap().x.min(pts.last().unwrap().x), 0.0);
        assert_eq!(pts.first().unwrap().x.max(pts.last().unwrap().x), 3.0);
    }

    #[test]
    fn lone_line_is_released() {
        let mut s = Sketch::new();
        s.push_line(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), true);
        s.push_line(Point2::new(1.0, 0.0), Point2::new(1.0, 1.0), true);
        let pg = profile(&s);
        let mut used = UsedEdges::new(pg.edge_count());
        assert!(find_colinear_runs(&pg, &mut used, 1e-2, 2).is_empty());
        assert_eq!(used.count(), 0);
    }
}
