use bitvec::{order::Msb0, vec::BitVec};
use itertools::Itertools;
use proptest::{
    prelude::{Just, Strategy, any},
    prop_oneof,
};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::{
    Codec, CodecOptions, SearchKind, Setup,
    limits::{
        INTERVAL_NUM_MAX, INTERVAL_WIDTH_MAX, PREFIX_LEN_MAX, VALID_RANGE_MAX, VALID_RANGE_MIN,
    },
};

pub const KINDS: [SearchKind; 2] = [SearchKind::BinaryHeap, SearchKind::WideTree];

#[track_caller]
pub fn mkcodec(setup: &str, kind: SearchKind) -> Codec {
    Codec::with_options(setup, CodecOptions::new().with_search(kind)).unwrap()
}

/// Copy `bytes` into a word buffer so that its byte view is 8-byte aligned.
pub fn aligned(bytes: &[u8]) -> Vec<u64> {
    let mut words = vec![0u64; bytes.len().div_ceil(8)];
    zerocopy::IntoBytes::as_mut_bytes(&mut words[..])[..bytes.len()].copy_from_slice(bytes);
    words
}

/// Encode `label` one bit at a time, straight from the interval table.
#[track_caller]
pub fn reference_encode(codec: &Codec, label: &[i64]) -> BitVec<u8, Msb0> {
    let intervals = codec.intervals().collect_vec();
    let mut bits = BitVec::new();
    for &value in label {
        let interval = intervals
            .iter()
            .find(|i| i.range.contains(&value))
            .unwrap_or_else(|| panic!("{value} is outside the codec domain"));
        for i in (0..interval.prefix_len).rev() {
            bits.push((interval.prefix >> i) & 1 == 1);
        }
        let offset = (value - interval.range.start) as u64;
        for i in (0..interval.width).rev() {
            bits.push((offset >> i) & 1 == 1);
        }
    }
    bits.set_uninitialized(false);
    bits
}

/// One generated interval: `prefix_len` prefix bits followed by `width`
/// value bits.
#[derive(Debug, Clone, Copy)]
struct GenInterval {
    prefix: u8,
    prefix_len: u32,
    width: u32,
}

/// Seeded generator of setups and labels.
pub struct SetupGen {
    rng: StdRng,
}

impl SetupGen {
    pub fn new(seed: u64) -> Self {
        let rng = StdRng::seed_from_u64(seed);
        Self { rng }
    }

    fn width(&mut self) -> u32 {
        if self.rng.random_bool(0.1) {
            self.rng.random_range(0..=INTERVAL_WIDTH_MAX)
        } else {
            self.rng.random_range(0..=16)
        }
    }

    /// Split random leaves of a binary trie until `count` leaves exist, then
    /// drop leaves at random until exactly `count` remain.
    fn prefix_free_codes(&mut self, count: usize) -> Vec<(u8, u32)> {
        let mut leaves = vec![(0u8, 1u32), (1, 1)];
        while leaves.len() < count {
            let splittable = leaves
                .iter()
                .positions(|&(_, len)| len < PREFIX_LEN_MAX)
                .collect_vec();
            let idx = splittable[self.rng.random_range(0..splittable.len())];
            let (prefix, len) = leaves.swap_remove(idx);
            leaves.push((prefix << 1, len + 1));
            leaves.push(((prefix << 1) | 1, len + 1));
        }
        while leaves.len() > count {
            let idx = self.rng.random_range(0..leaves.len());
            leaves.swap_remove(idx);
        }
        leaves
    }

    /// The smallest value of a domain of `size` values.
    fn domain_start(&mut self, size: i64) -> i64 {
        if self.rng.random_bool(0.25) {
            let slack = (VALID_RANGE_MAX - VALID_RANGE_MIN) - size;
            VALID_RANGE_MIN + self.rng.random_range(0..=slack)
        } else {
            -self.rng.random_range(0..=size)
        }
    }

    fn render(&mut self, intervals: &[GenInterval]) -> String {
        let size: i64 = intervals.iter().map(|i| 1i64 << i.width).sum();
        let start = self.domain_start(size);
        let origin_entry = self.rng.random_range(0..intervals.len());
        let mut min = start;
        intervals
            .iter()
            .enumerate()
            .map(|(entry, i)| {
                let mut out = format!(
                    "{:0len$b}:{}",
                    i.prefix,
                    i.width,
                    len = i.prefix_len as usize
                );
                if entry == origin_entry {
                    out.push_str(&format!(":{min}"));
                }
                min += 1i64 << i.width;
                out
            })
            .join(" ")
    }

    /// A valid setup whose prefixes may collide.
    pub fn setup(&mut self) -> Setup {
        let count = self.rng.random_range(1..=INTERVAL_NUM_MAX);
        let intervals = (0..count)
            .map(|_| {
                let prefix_len = self.rng.random_range(1..=PREFIX_LEN_MAX);
                GenInterval {
                    prefix: self.rng.random_range(0..(1u32 << prefix_len)) as u8,
                    prefix_len,
                    width: self.width(),
                }
            })
            .collect_vec();
        let setup = self.render(&intervals);
        setup.parse().unwrap()
    }

    /// A prefix-free setup, order preserving about half the time.
    pub fn prefix_free_setup(&mut self) -> Setup {
        let count = self.rng.random_range(1..=INTERVAL_NUM_MAX);
        let mut codes = self.prefix_free_codes(count);
        if self.rng.random_bool(0.5) {
            codes.sort_by_key(|&(prefix, len)| usize::from(prefix) << (PREFIX_LEN_MAX - len));
        } else {
            codes.shuffle(&mut self.rng);
        }
        let intervals = codes
            .into_iter()
            .map(|(prefix, prefix_len)| GenInterval {
                prefix,
                prefix_len,
                width: self.width(),
            })
            .collect_vec();
        let setup = self.render(&intervals);
        setup.parse().unwrap()
    }

    /// A label of up to `max_len` components inside the codec domain,
    /// favouring interval boundaries.
    pub fn label(&mut self, codec: &Codec, max_len: usize) -> Vec<i64> {
        let intervals = codec.intervals().collect_vec();
        let len = self.rng.random_range(0..=max_len);
        (0..len)
            .map(|_| {
                let range = &intervals[self.rng.random_range(0..intervals.len())].range;
                match self.rng.random_range(0..4) {
                    0 => range.start,
                    1 => range.end - 1,
                    _ => self.rng.random_range(range.clone()),
                }
            })
            .collect()
    }
}

/// Valid setups, prefix-free or not.
pub fn setup_strategy() -> impl Strategy<Value = Setup> {
    any::<u64>().prop_map(|seed| SetupGen::new(seed).setup())
}

pub fn search_kind_strategy() -> impl Strategy<Value = SearchKind> {
    prop_oneof![Just(SearchKind::BinaryHeap), Just(SearchKind::WideTree)]
}

/// A codec compiled from a random prefix-free setup, with a label it can
/// encode.
pub fn codec_and_label_strategy() -> impl Strategy<Value = (Codec, Vec<i64>)> {
    (any::<u64>(), search_kind_strategy()).prop_map(|(seed, kind)| {
        let mut setup_gen = SetupGen::new(seed);
        let setup = setup_gen.prefix_free_setup();
        let codec = Codec::from_setup(setup, CodecOptions::new().with_search(kind)).unwrap();
        let label = setup_gen.label(&codec, 64);
        (codec, label)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_setups_are_valid() {
        for seed in 0..256 {
            let mut setup_gen = SetupGen::new(seed);
            let setup = setup_gen.setup();
            assert!(!setup.intervals().is_empty());

            let setup = setup_gen.prefix_free_setup();
            let codec = Codec::from_setup(setup, CodecOptions::default()).unwrap();
            let label = setup_gen.label(&codec, 16);
            assert!(label.iter().all(|v| codec.domain().contains(v)));
        }
    }

    #[test]
    fn test_reference_encode_worked_example() {
        let codec = Codec::new("0:3:-4 1:3").unwrap();
        let bits = reference_encode(&codec, &[-4, 3, 4, 11, 5]);
        assert_eq!(bits.len(), 20);
        assert_eq!(bits.as_raw_slice(), &[0b0000_0111, 0b1000_1111, 0b1001_0000]);
    }
}
