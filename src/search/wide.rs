use crate::limits::{INTERVAL_NUM_MAX, VALID_RANGE_MIN};

const FANOUT: usize = 5;
const BOUNDS: usize = FANOUT * FANOUT - 1;

static_assertions::const_assert!(INTERVAL_NUM_MAX - 1 <= BOUNDS);

/// A two-level search tree with a fan-out of five.
///
/// The interval boundaries are right-aligned in a sorted array of 24 slots,
/// the unused leading slots padded with [`VALID_RANGE_MIN`] so that every
/// value in a domain compares above them. The array is split into five groups
/// of five; the last element of each of the first four groups forms the top
/// level (`fences`) and the remaining four of each group the bottom level.
///
/// Each level is resolved by counting how many of four bounds are `<= value`,
/// which compiles to branch-free compares.
#[derive(Debug, Clone)]
pub(crate) struct WideTree {
    fences: [i64; FANOUT - 1],
    groups: [[i64; FANOUT - 1]; FANOUT],
    padding: usize,
}

impl WideTree {
    pub(super) fn new(minima: &[i64]) -> Self {
        let padding = BOUNDS - (minima.len() - 1);
        let mut bounds = [VALID_RANGE_MIN; BOUNDS];
        bounds[padding..].copy_from_slice(&minima[1..]);

        let mut tree = Self {
            fences: [0; FANOUT - 1],
            groups: [[0; FANOUT - 1]; FANOUT],
            padding,
        };
        for (g, chunk) in bounds.chunks(FANOUT).enumerate() {
            tree.groups[g].copy_from_slice(&chunk[..FANOUT - 1]);
            if let Some(&fence) = chunk.get(FANOUT - 1) {
                tree.fences[g] = fence;
            }
        }
        tree
    }

    #[inline(always)]
    fn rank(bounds: &[i64; FANOUT - 1], value: i64) -> usize {
        bounds.iter().map(|&b| usize::from(value >= b)).sum()
    }

    #[inline]
    pub(super) fn locate(&self, value: i64) -> usize {
        debug_assert!(value >= VALID_RANGE_MIN);
        let hi = Self::rank(&self.fences, value);
        let lo = Self::rank(&self.groups[hi], value);
        // number of bounds <= value, minus the padding, is the interval index
        hi * FANOUT + lo + 1 - self.padding
    }
}

#[cfg(test)]
mod tests {
    use super::{BOUNDS, WideTree};
    use crate::limits::VALID_RANGE_MIN;

    #[test]
    fn test_wide_layout() {
        let minima = [0, 10, 20, 30];
        let tree = WideTree::new(&minima);
        assert_eq!(tree.padding, BOUNDS - 3);
        assert_eq!(tree.fences, [VALID_RANGE_MIN; 4]);
        assert_eq!(tree.groups[4], [VALID_RANGE_MIN, 10, 20, 30]);

        assert_eq!(tree.locate(0), 1);
        assert_eq!(tree.locate(9), 1);
        assert_eq!(tree.locate(10), 2);
        assert_eq!(tree.locate(29), 3);
        assert_eq!(tree.locate(30), 4);
    }

    #[test]
    fn test_wide_full() {
        let minima: Vec<i64> = (0..20).map(|i| i * 100).collect();
        let tree = WideTree::new(&minima);
        assert_eq!(tree.padding, 5);
        for (i, &min) in minima.iter().enumerate() {
            assert_eq!(tree.locate(min), i + 1);
            assert_eq!(tree.locate(min + 99), i + 1);
        }
    }
}
