use std::collections::HashMap;

use crate::math::{Point2, TOLERANCE};

/// Handle to a point inserted into a [`VertexMerger`], before merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawPoint(usize);

impl RawPoint {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Tolerance-based vertex merging.
///
/// Every inserted point is united with all earlier points within the
/// tolerance, so merging is transitive: a chain `A ~ B ~ C` ends up in one
/// vertex even when `A` and `C` are farther apart than the tolerance.
/// Neighbor search uses a uniform grid with a cell size equal to the
/// tolerance, so only the 3x3 block of cells around a point is scanned.
#[derive(Debug, Clone)]
pub struct VertexMerger {
    tolerance: f64,
    points: Vec<Point2>,
    parent: Vec<usize>,
    rank: Vec<u8>,
    grid: HashMap<(i64, i64), Vec<usize>>,
}

/// Result of [`VertexMerger::finish`].
#[derive(Debug, Clone)]
pub struct MergedVertices {
    /// Position of each merged vertex: the first inserted point of its class.
    pub positions: Vec<Point2>,
    /// Merged vertex index of each raw point.
    pub vertex_of: Vec<usize>,
}

impl MergedVertices {
    #[must_use]
    pub fn vertex(&self, raw: RawPoint) -> usize {
        self.vertex_of[raw.0]
    }
}

impl VertexMerger {
    /// Creates a merger. Non-positive tolerances fall back to [`TOLERANCE`].
    #[must_use]
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance: if tolerance > 0.0 { tolerance } else { TOLERANCE },
            points: Vec::new(),
            parent: Vec::new(),
            rank: Vec::new(),
            grid: HashMap::new(),
        }
    }

    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell(&self, p: &Point2) -> (i64, i64) {
        (
            (p.x / self.tolerance).floor() as i64,
            (p.y / self.tolerance).floor() as i64,
        )
    }

    /// Inserts a point and merges it with every earlier point in range.
    pub fn insert(&mut self, p: Point2) -> RawPoint {
        let id = self.points.len();
        self.points.push(p);
        self.parent.push(id);
        self.rank.push(0);

        let (cx, cy) = self.cell(&p);
        let mut near = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                let key = (cx.saturating_add(dx), cy.saturating_add(dy));
                if let Some(bucket) = self.grid.get(&key) {
                    near.extend(
                        bucket
                            .iter()
                            .copied()
                            .filter(|&j| (self.points[j] - p).norm() <= self.tolerance),
                    );
                }
            }
        }
        for j in near {
            self.union(id, j);
        }
        self.grid.entry((cx, cy)).or_default().push(id);
        RawPoint(id)
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] = self.rank[ra].saturating_add(1);
            }
        }
    }

    /// Assigns dense vertex indices in order of first appearance.
    #[must_use]
    pub fn finish(mut self) -> MergedVertices {
        let mut dense: HashMap<usize, usize> = HashMap::new();
        let mut positions = Vec::new();
        let mut vertex_of = Vec::with_capacity(self.points.len());
        for i in 0..self.points.len() {
            let root = self.find(i);
            let next = positions.len();
            let v = *dense.entry(root).or_insert(next);
            if v == next {
                positions.push(self.points[i]);
            }
            vertex_of.push(v);
        }
        MergedVertices {
            positions,
            vertex_of,
        }
    }
}
