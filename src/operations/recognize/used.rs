use crate::topology::EdgeIdx;

/// Fixed-size bitset of claimed edges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsedEdges {
    words: Vec<u64>,
    len: usize,
}

impl UsedEdges {
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
            len,
        }
    }

    /// Number of edges tracked, claimed or not.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_used(&self, e: EdgeIdx) -> bool {
        e < self.len && self.words[e / 64] & (1 << (e % 64)) != 0
    }

    /// Claims `e`. Returns `false` if it was already claimed or out of range.
    pub fn claim(&mut self, e: EdgeIdx) -> bool {
        if e >= self.len || self.is_used(e) {
            return false;
        }
        self.words[e / 64] |= 1 << (e % 64);
        true
    }

    pub fn claim_all(&mut self, edges: &[EdgeIdx]) {
        for &e in edges {
            self.claim(e);
        }
    }

    pub fn release(&mut self, e: EdgeIdx) {
        if e < self.len {
            self.words[e / 64] &= !(1 << (e % 64));
        }
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Unclaimed edges in ascending order.
    pub fn unused(&self) -> impl Iterator<Item = EdgeIdx> + '_ {
        (0..self.len).filter(|&e| !self.is_used(e))
    }
}
