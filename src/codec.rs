use std::{fmt::Debug, ops::Range, str::FromStr};

use bytes::BufMut;
use itertools::Itertools;
use tracing::{debug, trace};
use zerocopy::IntoBytes;

use crate::{
    InvalidParam, OrdpathErr, SetupViolation,
    bitbuf::{BitBuf, DefaultBitBuf},
    codec::{decoder::Decoder, encoder::Encoder, label::EncodedLabel},
    limits::{INTERVAL_SLOTS, LOOKUP_TABLE_LEN, ORDPATH_BUF_ALIGNMENT},
    search::{SearchKind, SearchTree},
    setup::{IntervalSpec, Setup},
};

pub mod decoder;
pub mod encoder;
pub mod label;

/// When to reject caller supplied buffers that are not aligned to
/// [`ORDPATH_BUF_ALIGNMENT`] bytes.
///
/// Alignment never affects correctness: words are always assembled from
/// bytes. It is kept as a contract so that callers stay compatible with
/// word-oriented consumers of the encoded labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum AlignmentCheck {
    Never,
    /// Reject misaligned buffers in builds with debug assertions.
    #[default]
    DebugOnly,
    Always,
}

impl AlignmentCheck {
    #[inline]
    fn enabled(self) -> bool {
        match self {
            AlignmentCheck::Never => false,
            AlignmentCheck::DebugOnly => cfg!(debug_assertions),
            AlignmentCheck::Always => true,
        }
    }

    #[inline]
    fn check(self, buf: *const u8) -> Result<(), OrdpathErr> {
        if self.enabled() && (buf as usize) % ORDPATH_BUF_ALIGNMENT != 0 {
            debug!("unaligned buffer, expected alignment {ORDPATH_BUF_ALIGNMENT}");
            Err(InvalidParam::Misaligned.into())
        } else {
            Ok(())
        }
    }
}

/// Build time options of a [`Codec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct CodecOptions {
    search: SearchKind,
    alignment: AlignmentCheck,
}

impl CodecOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: SearchKind) -> Self {
        self.search = search;
        self
    }

    pub fn with_alignment(mut self, alignment: AlignmentCheck) -> Self {
        self.alignment = alignment;
        self
    }

    #[inline]
    pub fn search(&self) -> SearchKind {
        self.search
    }

    #[inline]
    pub fn alignment(&self) -> AlignmentCheck {
        self.alignment
    }
}

/// Encoding parameters of one interval, stored in the codec arena.
///
/// The layout is fixed so that `(bias, bitlen)` pairs can be loaded as one
/// 128-bit unit: `bias` at offset 0, `bitlen` at offset 8, 16 bytes total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C, align(16))]
pub(crate) struct IntervalCode {
    /// `(prefix << width) - interval_min`, so that `value + bias` is the code
    pub(crate) bias: i64,
    pub(crate) bitlen: u32,
    _reserved: u32,
}

static_assertions::assert_eq_size!(IntervalCode, [u64; 2]);
static_assertions::const_assert_eq!(std::mem::offset_of!(IntervalCode, bias), 0);
static_assertions::const_assert_eq!(std::mem::offset_of!(IntervalCode, bitlen), 8);

impl IntervalCode {
    /// Occupies arena slot 0, which the lookup table returns for bytes
    /// matching no prefix. Its bitlen exceeds any number of buffered bits, so
    /// landing on it always forces a refill.
    const SENTINEL: Self = Self {
        bias: 0,
        bitlen: u32::MAX,
        _reserved: 0,
    };

    fn new(spec: &IntervalSpec, min: i64) -> Self {
        Self {
            // may wrap for domains near VALID_RANGE_MIN, `value + bias` does not
            bias: (i64::from(spec.prefix()) << spec.width()).wrapping_sub(min),
            bitlen: spec.bitlen(),
            _reserved: 0,
        }
    }
}

/// Public description of one interval of a [`Codec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalInfo {
    pub prefix: u8,
    pub prefix_len: u32,
    pub width: u32,
    pub bitlen: u32,
    pub range: Range<i64>,
}

/// An immutable codec compiled from a setup string.
///
/// A codec is cheap to share: every encode and decode call only reads it, so
/// one instance may serve any number of threads.
///
/// # Examples
///
/// ```
/// use ordpath_rs::Codec;
///
/// let codec = Codec::new("0:3:-4 1:3").unwrap();
///
/// let mut buf = [0u64; 2];
/// let bits = codec
///     .encode_into(&[5, -1], zerocopy::IntoBytes::as_mut_bytes(&mut buf[..]))
///     .unwrap();
/// assert_eq!(bits, 8);
///
/// let mut label = [0i64; 4];
/// let len = codec
///     .decode_into(zerocopy::IntoBytes::as_bytes(&buf[..]), bits, &mut label)
///     .unwrap();
/// assert_eq!(&label[..len], &[5, -1]);
/// ```
#[derive(Clone)]
pub struct Codec {
    setup: Setup,
    options: CodecOptions,
    domain: Range<i64>,
    codes: [IntervalCode; INTERVAL_SLOTS],
    lookup: [u8; LOOKUP_TABLE_LEN],
    search: SearchTree,
    min_bitlen: u32,
    max_bitlen: u32,
}

static_assertions::assert_impl_all!(Codec: Send, Sync);

impl Codec {
    /// Compile a setup string with the default [`CodecOptions`].
    pub fn new(setup: &str) -> Result<Self, OrdpathErr> {
        Self::with_options(setup, CodecOptions::default())
    }

    pub fn with_options(setup: &str, options: CodecOptions) -> Result<Self, OrdpathErr> {
        Self::from_setup(Setup::parse(setup)?, options)
    }

    /// Compile an already parsed setup. Fails if the prefixes are not
    /// prefix-free.
    pub fn from_setup(setup: Setup, options: CodecOptions) -> Result<Self, OrdpathErr> {
        let specs = setup.intervals();
        let minima = setup.bounds().take(specs.len()).collect_vec();

        let mut codes = [IntervalCode::SENTINEL; INTERVAL_SLOTS];
        for (i, (spec, &min)) in specs.iter().zip(&minima).enumerate() {
            codes[i + 1] = IntervalCode::new(spec, min);
        }

        let mut lookup = [0u8; LOOKUP_TABLE_LEN];
        for (entry, spec) in specs.iter().enumerate() {
            for slot in spec.lookup_slots() {
                if lookup[slot] != 0 {
                    let conflicts_with = usize::from(lookup[slot]) - 1;
                    debug!(entry, conflicts_with, "encoding is not prefix-free");
                    return Err(SetupViolation::NotPrefixFree {
                        entry,
                        conflicts_with,
                    }
                    .into());
                }
                lookup[slot] = (entry + 1) as u8;
            }
        }

        let search = SearchTree::build(options.search(), &minima);
        let (min_bitlen, max_bitlen) = specs
            .iter()
            .map(IntervalSpec::bitlen)
            .minmax()
            .into_option()
            .unwrap_or_default();
        let domain = setup.domain();

        trace!(
            intervals = specs.len(),
            ?domain,
            min_bitlen,
            max_bitlen,
            search = ?options.search(),
            "codec created"
        );

        Ok(Self {
            setup,
            options,
            domain,
            codes,
            lookup,
            search,
            min_bitlen,
            max_bitlen,
        })
    }

    /// The half-open range of values this codec can encode.
    #[inline]
    pub fn domain(&self) -> Range<i64> {
        self.domain.clone()
    }

    #[inline]
    pub fn setup(&self) -> &Setup {
        &self.setup
    }

    #[inline]
    pub fn options(&self) -> CodecOptions {
        self.options
    }

    /// The intervals of this codec in ascending value order.
    pub fn intervals(&self) -> impl Iterator<Item = IntervalInfo> + '_ {
        self.setup
            .intervals()
            .iter()
            .zip(self.setup.bounds().tuple_windows())
            .map(|(spec, (start, end))| IntervalInfo {
                prefix: spec.prefix(),
                prefix_len: spec.prefix_len(),
                width: spec.width(),
                bitlen: spec.bitlen(),
                range: start..end,
            })
    }

    /// Length of the shortest code.
    #[inline]
    pub fn min_bitlen(&self) -> u32 {
        self.min_bitlen
    }

    /// Length of the longest code.
    #[inline]
    pub fn max_bitlen(&self) -> u32 {
        self.max_bitlen
    }

    /// Length of the code for `value`, or `None` outside the domain.
    pub fn encoded_bitlen(&self, value: i64) -> Option<u32> {
        self.domain
            .contains(&value)
            .then(|| self.codes[self.search.locate(value)].bitlen)
    }

    /// Upper bound on the bytes written when encoding a label of `len`
    /// components, including the trailing partial word.
    pub fn max_encoded_len(&self, len: usize) -> usize {
        let bits = len.saturating_mul(self.max_bitlen as usize);
        (bits / 64).saturating_add(1).saturating_mul(8)
    }

    /// Returns true if encoded labels sort in the same order as the labels.
    ///
    /// This holds when the prefixes, read as left-aligned bytes, ascend in
    /// interval order.
    pub fn is_order_preserving(&self) -> bool {
        self.setup
            .intervals()
            .iter()
            .map(IntervalSpec::lookup_start)
            .tuple_windows()
            .all(|(a, b)| a < b)
    }

    /// Encode `label` into `out`, returning the exact number of bits written.
    ///
    /// `out` should be aligned to [`ORDPATH_BUF_ALIGNMENT`] bytes (see
    /// [`AlignmentCheck`]) and hold at least [`Codec::max_encoded_len`] bytes.
    /// Up to seven bytes past the last significant byte are written.
    pub fn encode_into(&self, label: &[i64], out: &mut [u8]) -> Result<usize, OrdpathErr> {
        self.options.alignment().check(out.as_ptr())?;
        let mut out = out;
        self.encode_to_buf(label, &mut out)
    }

    /// Encode `label` as big-endian words appended to `buf`, returning the
    /// exact number of bits written.
    pub fn encode_to_buf<B: BufMut>(
        &self,
        label: &[i64],
        buf: &mut B,
    ) -> Result<usize, OrdpathErr> {
        self.encode_to_buf_with::<DefaultBitBuf, B>(label, buf)
    }

    /// Like [`Codec::encode_to_buf`], using the bit buffer backend `A`.
    pub fn encode_to_buf_with<A: BitBuf, B: BufMut>(
        &self,
        label: &[i64],
        buf: &mut B,
    ) -> Result<usize, OrdpathErr> {
        let mut encoder = Encoder::<&mut B, A>::new(buf);
        for (index, &value) in label.iter().enumerate() {
            if !self.domain.contains(&value) {
                debug!(
                    index,
                    value,
                    domain = ?self.domain,
                    "label component outside the domain"
                );
                return Err(InvalidParam::ValueOutOfDomain { index, value }.into());
            }
            let code = &self.codes[self.search.locate(value)];
            let bits = A::from_i64(value)
                .add(A::from_i64(code.bias))
                .shl(64 - code.bitlen);
            encoder.put_code(bits, code.bitlen)?;
        }
        encoder.finish()
    }

    /// Encode `label` into a freshly allocated [`EncodedLabel`].
    ///
    /// The label is backed by whole 64-bit words, so it satisfies the
    /// alignment contract when handed back to [`Codec::decode`].
    pub fn encode_to_bytes(&self, label: &[i64]) -> Result<EncodedLabel, OrdpathErr> {
        let mut words = vec![0u64; self.max_encoded_len(label.len()) / 8];
        let bit_len = self.encode_to_buf(label, &mut words.as_mut_bytes())?;
        words.truncate(bit_len / 64 + 1);
        Ok(EncodedLabel::from_words(words, bit_len))
    }

    /// Iterate over the components encoded in the first `bit_len` bits of
    /// `input`.
    pub fn decoder<'a>(
        &'a self,
        input: &'a [u8],
        bit_len: usize,
    ) -> Result<Decoder<'a>, OrdpathErr> {
        self.decoder_with::<DefaultBitBuf>(input, bit_len)
    }

    /// Like [`Codec::decoder`], using the bit buffer backend `A`.
    pub fn decoder_with<'a, A: BitBuf>(
        &'a self,
        input: &'a [u8],
        bit_len: usize,
    ) -> Result<Decoder<'a, A>, OrdpathErr> {
        self.options.alignment().check(input.as_ptr())?;
        Decoder::new(self, input, bit_len)
    }

    /// Decode into `out` without allocating, returning the number of
    /// components written.
    ///
    /// On [`OrdpathErr::CorruptData`] the components decoded before the
    /// damaged code are left in `out`.
    pub fn decode_into(
        &self,
        input: &[u8],
        bit_len: usize,
        out: &mut [i64],
    ) -> Result<usize, OrdpathErr> {
        let mut len = 0;
        for value in self.decoder(input, bit_len)? {
            // a damaged stream reports corruption even when `out` is full
            let value = value?;
            let slot = out.get_mut(len).ok_or(InvalidParam::OutputTooSmall)?;
            *slot = value;
            len += 1;
        }
        Ok(len)
    }

    /// Decode into a freshly allocated label.
    pub fn decode(&self, input: &[u8], bit_len: usize) -> Result<Vec<i64>, OrdpathErr> {
        self.decoder(input, bit_len)?.try_collect_label()
    }

    /// Arena entry for the prefix found in the top eight bits of `high_byte`.
    #[inline(always)]
    pub(crate) fn lookup(&self, high_byte: u8) -> &IntervalCode {
        &self.codes[usize::from(self.lookup[usize::from(high_byte)])]
    }
}

impl FromStr for Codec {
    type Err = OrdpathErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Debug for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec")
            .field("setup", &self.setup.to_string())
            .field("domain", &self.domain)
            .field("search", &self.search.kind())
            .field("alignment", &self.options.alignment())
            .finish()
    }
}
