use std::collections::HashSet;

use tracing::{debug, warn};

use super::graph::{ConnectivityGraph, EdgeIdx, VertexIdx};
use crate::sketch::GeoId;

/// A closed chain of distinct edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loop {
    /// Edges in traversal order.
    pub edges: Vec<EdgeIdx>,
    /// Vertices in traversal order, starting vertex first and not repeated.
    pub vertices: Vec<VertexIdx>,
}

impl Loop {
    /// Sorted edge indices, identical for every traversal of the same cycle.
    #[must_use]
    pub fn signature(&self) -> Vec<EdgeIdx> {
        let mut sig = self.edges.clone();
        sig.sort_unstable();
        sig
    }

    /// Geometry ids of the loop's edges in traversal order.
    #[must_use]
    pub fn geos(&self, graph: &ConnectivityGraph) -> Vec<GeoId> {
        self.edges.iter().map(|&e| graph.edges()[e].geo).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Loops found by [`enumerate_loops`].
#[derive(Debug, Clone, Default)]
pub struct LoopSet {
    pub loops: Vec<Loop>,
    /// Set when a cap cut the search short, so loops may be missing.
    pub truncated: bool,
}

/// Walks each component of a graph of (mostly) degree-2 vertices.
///
/// From every unvisited vertex the walk keeps taking the first incident edge
/// other than the one it arrived on. A loop is accepted only if the walk
/// returns to its start with at least three vertices within `step_cap`
/// steps. Open chains and walks that run into an earlier vertex are dropped.
#[must_use]
pub fn greedy_loops(graph: &ConnectivityGraph, step_cap: usize) -> Vec<Loop> {
    let mut visited = vec![false; graph.vertex_count()];
    let mut loops = Vec::new();

    for start in 0..graph.vertex_count() {
        if visited[start] || graph.degree(start) == 0 {
            continue;
        }
        let mut vertices = Vec::new();
        let mut edges = Vec::new();
        let mut current = start;
        let mut arrived_by: Option<EdgeIdx> = None;
        let mut closed = false;

        for _ in 0..step_cap {
            vertices.push(current);
            visited[current] = true;
            let Some(&(e, next)) = graph
                .neighbors(current)
                .iter()
                .find(|(e, _)| Some(*e) != arrived_by)
            else {
                break;
            };
            edges.push(e);
            if next == start {
                closed = vertices.len() >= 3;
                break;
            }
            if visited[next] {
                break;
            }
            arrived_by = Some(e);
            current = next;
        }

        if closed {
            loops.push(Loop { edges, vertices });
        }
    }

    debug!(loops = loops.len(), "greedy walk complete");
    loops
}

struct Enumerator<'a> {
    graph: &'a ConnectivityGraph,
    max_loops: usize,
    max_path_length: usize,
    limiting_path: bool,
    seen: HashSet<Vec<EdgeIdx>>,
    loops: Vec<Loop>,
    truncated: bool,
    path_vertices: Vec<VertexIdx>,
    path_edges: Vec<EdgeIdx>,
}

impl Enumerator<'_> {
    fn full(&self) -> bool {
        self.loops.len() >= self.max_loops
    }

    fn record(&mut self, closing: EdgeIdx) {
        let mut edges = self.path_edges.clone();
        edges.push(closing);
        let candidate = Loop {
            edges,
            vertices: self.path_vertices.clone(),
        };
        if self.seen.insert(candidate.signature()) {
            self.loops.push(candidate);
        }
    }

    fn dfs(&mut self, start: VertexIdx, current: VertexIdx) {
        if self.full() {
            self.truncated = true;
            return;
        }
        let graph = self.graph;
        for &(e, next) in graph.neighbors(current) {
            if self.path_edges.contains(&e) {
                continue;
            }
            if next == start && self.path_vertices.len() >= 3 {
                self.record(e);
                if self.full() {
                    self.truncated = true;
                    return;
                }
                continue;
            }
            if self.path_vertices.contains(&next) {
                continue;
            }
            // Extending only helps if the closing edge still fits under the cap.
            if self.path_edges.len() + 2 > self.max_path_length {
                self.truncated |= self.limiting_path;
                continue;
            }
            self.path_vertices.push(next);
            self.path_edges.push(e);
            self.dfs(start, next);
            self.path_vertices.pop();
            self.path_edges.pop();
            if self.full() {
                return;
            }
        }
    }
}

/// Enumerates simple cycles by DFS from every vertex.
///
/// A cycle is recorded when the path returns to its start with at least
/// three vertices, and duplicates are removed by their sorted edge
/// signature. The search stops once `max_loops` distinct loops are found,
/// and never follows a path that could only close with more than
/// `max_path_length` edges. Either cap sets [`LoopSet::truncated`].
#[must_use]
pub fn enumerate_loops(
    graph: &ConnectivityGraph,
    max_loops: usize,
    max_path_length: usize,
) -> LoopSet {
    let mut state = Enumerator {
        graph,
        max_loops,
        max_path_length,
        limiting_path: max_path_length < graph.edge_count(),
        seen: HashSet::new(),
        loops: Vec::new(),
        truncated: false,
        path_vertices: Vec::new(),
        path_edges: Vec::new(),
    };

    for start in 0..graph.vertex_count() {
        if state.full() {
            state.truncated = true;
            break;
        }
        if start > 0 && start % 10 == 0 {
            debug!(
                checked = start,
                total = graph.vertex_count(),
                found = state.loops.len(),
                "loop enumeration progress"
            );
        }
        state.path_vertices.push(start);
        state.dfs(start, start);
        state.path_vertices.clear();
        state.path_edges.clear();
    }

    if state.truncated {
        warn!(
            loops = state.loops.len(),
            max_loops, max_path_length, "loop enumeration hit its cap; loops may be missing"
        );
    }
    LoopSet {
        loops: state.loops,
        truncated: state.truncated,
    }
}

/// Counts distinct cycles through paths of at most `path_cap` vertices.
///
/// Used to compare a graph against itself with one edge removed, so the
/// cap only has to be applied consistently. Immediate back-steps are
/// skipped and counting stops at `max_loops`.
#[must_use]
pub fn count_loops_bounded(graph: &ConnectivityGraph, path_cap: usize, max_loops: usize) -> usize {
    fn walk(
        graph: &ConnectivityGraph,
        start: VertexIdx,
        path: &mut Vec<VertexIdx>,
        path_edges: &mut Vec<EdgeIdx>,
        path_cap: usize,
        max_loops: usize,
        seen: &mut HashSet<Vec<EdgeIdx>>,
    ) {
        let Some(&current) = path.last() else {
            return;
        };
        for &(e, next) in graph.neighbors(current) {
            if seen.len() >= max_loops {
                return;
            }
            if path.len() >= 2 && next == path[path.len() - 2] {
                continue;
            }
            if path_edges.contains(&e) {
                continue;
            }
            if next == start && path_edges.len() >= 2 {
                let mut sig = path_edges.clone();
                sig.push(e);
                sig.sort_unstable();
                seen.insert(sig);
                continue;
            }
            if !path.contains(&next) && path.len() < path_cap {
                path.push(next);
                path_edges.push(e);
                walk(graph, start, path, path_edges, path_cap, max_loops, seen);
                path.pop();
                path_edges.pop();
            }
        }
    }

    let mut seen = HashSet::new();
    let mut path = Vec::new();
    let mut path_edges = Vec::new();
    for start in 0..graph.vertex_count() {
        path.clear();
        path_edges.clear();
        path.push(start);
        walk(
            graph,
            start,
            &mut path,
            &mut path_edges,
            path_cap,
            max_loops,
            &mut seen,
        );
    }
    seen.len()
}
