use std::collections::{HashMap, VecDeque};

use super::graph::{ConnectivityGraph, VertexIdx};
use super::loops::Loop;

/// Partitions loops into groups connected through shared vertices.
///
/// Each group lists loop indices in ascending order; groups are ordered by
/// their lowest member.
#[must_use]
pub fn loop_groups(loops: &[Loop]) -> Vec<Vec<usize>> {
    let mut parent: Vec<usize> = (0..loops.len()).collect();

    fn find(parent: &mut [usize], mut x: usize) -> usize {
        while parent[x] != x {
            parent[x] = parent[parent[x]];
            x = parent[x];
        }
        x
    }

    let mut owner: HashMap<VertexIdx, usize> = HashMap::new();
    for (i, l) in loops.iter().enumerate() {
        for &v in &l.vertices {
            if let Some(&j) = owner.get(&v) {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                if ri != rj {
                    parent[ri.max(rj)] = ri.min(rj);
                }
            } else {
                owner.insert(v, i);
            }
        }
    }

    let mut index: HashMap<usize, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for i in 0..loops.len() {
        let root = find(&mut parent, i);
        let slot = *index.entry(root).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(i);
    }
    groups
}

/// Connected components with more than one vertex, found by BFS in vertex
/// order.
#[must_use]
pub fn components(graph: &ConnectivityGraph) -> Vec<Vec<VertexIdx>> {
    let mut seen = vec![false; graph.vertex_count()];
    let mut out = Vec::new();
    for root in 0..graph.vertex_count() {
        if seen[root] {
            continue;
        }
        seen[root] = true;
        let mut members = vec![root];
        let mut queue = VecDeque::from([root]);
        while let Some(v) = queue.pop_front() {
            for &(_, n) in graph.neighbors(v) {
                if !seen[n] {
                    seen[n] = true;
                    members.push(n);
                    queue.push_back(n);
                }
            }
        }
        if members.len() > 1 {
            out.push(members);
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point2;
    use crate::topology::graph::GraphBuilder;

    fn lp(vertices: &[usize]) -> Loop {
        Loop {
            edges: vertices.to_vec(),
            vertices: vertices.to_vec(),
        }
    }

    #[test]
    fn shared_vertex_joins_groups() {
        let loops = vec![lp(&[0, 1, 2]), lp(&[10, 11, 12]), lp(&[2, 3, 4]), lp(&[4, 5, 6])];
        assert_eq!(loop_groups(&loops), vec![vec![0, 2, 3], vec![1]]);
    }

    #[test]
    fn empty_input() {
        assert!(loop_groups(&[]).is_empty());
    }

    #[test]
    fn components_skip_isolated_vertices() {
        let mut b = GraphBuilder::new(1e-6);
        b.segment(0, Point2::new(0.0, 0.0), Point2::new(1.0, 0.0));
        b.segment(1, Point2::new(1.0, 0.0), Point2::new(2.0, 0.0));
        b.segment(2, Point2::new(5.0, 0.0), Point2::new(6.0, 0.0));
        b.point(Point2::new(9.0, 9.0));
        let comps = components(&b.build().graph);
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0].len(), 3);
        assert_eq!(comps[1].len(), 2);
    }
}
