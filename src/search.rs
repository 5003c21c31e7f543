//! Encode-side lookup of the interval containing a value.
//!
//! Both structures are built once from the interval minima and answer with
//! the arena index of the interval (`1..=n`, slot 0 being the sentinel).

use crate::search::{heap::BoundsHeap, wide::WideTree};

mod heap;
mod wide;

/// Which static search structure a codec uses to map values to intervals.
/// Both produce identical encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum SearchKind {
    /// An implicit binary search tree addressed by heap index.
    #[default]
    BinaryHeap,

    /// A two-level tree of branch-free five-way comparisons.
    WideTree,
}

#[derive(Debug, Clone)]
pub(crate) enum SearchTree {
    Heap(BoundsHeap),
    Wide(WideTree),
}

impl SearchTree {
    /// `minima` holds the lower bound of every interval in ascending order.
    pub(crate) fn build(kind: SearchKind, minima: &[i64]) -> Self {
        debug_assert!(!minima.is_empty(), "a setup has at least one interval");
        debug_assert!(minima.is_sorted(), "interval minima must ascend");
        match kind {
            SearchKind::BinaryHeap => Self::Heap(BoundsHeap::new(minima)),
            SearchKind::WideTree => Self::Wide(WideTree::new(minima)),
        }
    }

    pub(crate) fn kind(&self) -> SearchKind {
        match self {
            Self::Heap(_) => SearchKind::BinaryHeap,
            Self::Wide(_) => SearchKind::WideTree,
        }
    }

    /// Returns the arena index of the interval containing `value`, which must
    /// lie inside the codec domain.
    #[inline]
    pub(crate) fn locate(&self, value: i64) -> usize {
        match self {
            Self::Heap(heap) => heap.locate(value),
            Self::Wide(tree) => tree.locate(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;
    use proptest::{collection::vec, prop_assert_eq, proptest};

    use super::{SearchKind, SearchTree};
    use crate::{
        limits::{INTERVAL_NUM_MAX, INTERVAL_WIDTH_MAX, VALID_RANGE_MIN},
        testutil::KINDS,
    };

    /// number of minima <= value, which is the arena index
    fn linear_scan(minima: &[i64], value: i64) -> usize {
        minima.partition_point(|&m| m <= value)
    }

    fn minima_from_widths(origin: i64, widths: &[u32]) -> Vec<i64> {
        widths
            .iter()
            .scan(origin, |min, w| {
                let out = *min;
                *min += 1 << w;
                Some(out)
            })
            .collect_vec()
    }

    #[test]
    fn test_single_interval() {
        for kind in KINDS {
            let tree = SearchTree::build(kind, &[-4]);
            assert_eq!(tree.kind(), kind);
            for v in -4..4 {
                assert_eq!(tree.locate(v), 1, "{kind:?}");
            }
        }
    }

    #[test]
    fn test_every_interval_count() {
        for n in 1..=INTERVAL_NUM_MAX {
            let widths = (0..n as u32).map(|w| w % 5).collect_vec();
            let minima = minima_from_widths(-7, &widths);
            let end = minima[n - 1] + (1 << widths[n - 1]);
            for kind in KINDS {
                let tree = SearchTree::build(kind, &minima);
                for v in minima[0]..end {
                    assert_eq!(
                        tree.locate(v),
                        linear_scan(&minima, v),
                        "{kind:?} n={n} v={v}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_extreme_domain() {
        let widths = [INTERVAL_WIDTH_MAX; INTERVAL_NUM_MAX];
        let minima = minima_from_widths(VALID_RANGE_MIN, &widths);
        for kind in KINDS {
            let tree = SearchTree::build(kind, &minima);
            assert_eq!(tree.locate(VALID_RANGE_MIN), 1);
            for (i, &min) in minima.iter().enumerate() {
                assert_eq!(tree.locate(min), i + 1, "{kind:?}");
                let last = min + (1 << INTERVAL_WIDTH_MAX) - 1;
                assert_eq!(tree.locate(last), i + 1, "{kind:?}");
            }
        }
    }

    proptest! {
        #[test]
        fn test_search_kinds_agree(
            origin in -1_000_000i64..1_000_000,
            widths in vec(0u32..12, 1..=INTERVAL_NUM_MAX),
        ) {
            let minima = minima_from_widths(origin, &widths);
            let heap = SearchTree::build(SearchKind::BinaryHeap, &minima);
            let wide = SearchTree::build(SearchKind::WideTree, &minima);
            for (i, &min) in minima.iter().enumerate() {
                let last = min + (1 << widths[i]) - 1;
                for v in [min, min + (last - min) / 2, last] {
                    prop_assert_eq!(heap.locate(v), i + 1);
                    prop_assert_eq!(wide.locate(v), i + 1);
                }
            }
        }
    }
}
