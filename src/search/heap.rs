use crate::limits::{INTERVAL_NUM_MAX, INTERVAL_SLOTS};

/// A complete binary search tree over the interval boundaries, stored
/// implicitly in heap order (children of node `i` at `2i` and `2i + 1`).
///
/// Descending from the root always ends on an external node `p > len`; the
/// interval it stands for is recorded in `leaves[p - len]`.
#[derive(Debug, Clone)]
pub(crate) struct BoundsHeap {
    /// number of internal nodes, one less than the number of intervals
    len: usize,
    /// 1-based; `bounds[0]` is unused
    bounds: [i64; INTERVAL_NUM_MAX],
    /// 1-based arena indices of the external nodes
    leaves: [u8; INTERVAL_SLOTS],
}

impl BoundsHeap {
    pub(super) fn new(minima: &[i64]) -> Self {
        let mut heap = Self {
            len: minima.len() - 1,
            bounds: [0; INTERVAL_NUM_MAX],
            leaves: [0; INTERVAL_SLOTS],
        };
        let mut interval = 0;
        heap.fill(minima, 1, &mut interval);
        debug_assert_eq!(interval, heap.len);
        heap
    }

    /// In-order walk: external nodes receive the intervals and internal nodes
    /// the boundaries between them, left to right.
    fn fill(&mut self, minima: &[i64], pos: usize, interval: &mut usize) {
        if pos <= self.len {
            self.fill(minima, 2 * pos, interval);
            *interval += 1;
            self.bounds[pos] = minima[*interval];
            self.fill(minima, 2 * pos + 1, interval);
        } else {
            self.leaves[pos - self.len] = (*interval + 1) as u8;
        }
    }

    #[inline]
    pub(super) fn locate(&self, value: i64) -> usize {
        let mut pos = 1;
        while pos <= self.len {
            pos = 2 * pos + usize::from(value >= self.bounds[pos]);
        }
        self.leaves[pos - self.len].into()
    }
}

#[cfg(test)]
mod tests {
    use super::BoundsHeap;

    #[test]
    fn test_heap_layout() {
        // four intervals: three internal nodes, four external ones
        let heap = BoundsHeap::new(&[0, 10, 20, 30]);
        assert_eq!(heap.len, 3);
        // in-order over nodes 1..=3 of a complete tree is 2, 1, 3
        assert_eq!(&heap.bounds[1..=3], &[20, 10, 30]);
        // external nodes 4..=7 in-order are 4, 5, 6, 7
        assert_eq!(&heap.leaves[1..=4], &[1, 2, 3, 4]);

        assert_eq!(heap.locate(0), 1);
        assert_eq!(heap.locate(9), 1);
        assert_eq!(heap.locate(10), 2);
        assert_eq!(heap.locate(29), 3);
        assert_eq!(heap.locate(30), 4);
    }

    #[test]
    fn test_heap_incomplete_level() {
        // five internal nodes leave the bottom level partially filled
        let heap = BoundsHeap::new(&[0, 1, 2, 3, 4, 5]);
        for v in 0..6 {
            assert_eq!(heap.locate(v), v as usize + 1);
        }
    }
}
