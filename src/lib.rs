//! `ordpath-rs` packs sequences of bounded signed integers ("labels") into a
//! dense bitstring using a configurable prefix-free code, and unpacks them
//! again.
//!
//! ## Key Features:
//!
//! - **Configurable code**: a short setup string such as `"0:3:-4 1:3"` lists
//!   the intervals of the code. Each interval owns a bit prefix and a fixed
//!   number of value bits, so small values near the origin get short codes.
//!
//! - **Order preserving**: when interval prefixes ascend, the byte order of
//!   encoded labels matches the numeric order of the labels themselves, which
//!   makes encodings usable as sort keys.
//!
//! - **Allocation free hot path**: encoding streams 64-bit big-endian words
//!   through a [`bytes::BufMut`] and decoding is a plain iterator over the input
//!   slice.
//!
//! ```
//! use ordpath_rs::Codec;
//!
//! let codec = Codec::new("0:3:-4 1:3").unwrap();
//! assert_eq!(codec.domain(), -4..12);
//!
//! let encoded = codec.encode_to_bytes(&[-4, 3, 4, 11]).unwrap();
//! assert_eq!(encoded.bit_len(), 16);
//! assert_eq!(encoded.as_bytes(), &[0b0000_0111, 0b1000_1111]);
//!
//! assert_eq!(encoded.decode(&codec).unwrap(), vec![-4, 3, 4, 11]);
//! ```

use thiserror::Error;

pub mod bitbuf;
pub mod codec;
pub mod limits;
mod search;
pub mod setup;
mod status;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use codec::{
    AlignmentCheck, Codec, CodecOptions, IntervalInfo, decoder::Decoder, label::EncodedLabel,
};
pub use search::SearchKind;
pub use setup::{DEFAULT_SETUP, IntervalSpec, Setup};
pub use status::{Status, strerror};

/// Optional backends available in this build, selectable through
/// [`bitbuf::BitBuf`] and [`CodecOptions`].
#[cfg(target_arch = "x86_64")]
pub const COMPILE_OPTIONS: &[&str] = &["sse2-bitbuf", "wide-search-tree"];

/// Optional backends available in this build, selectable through
/// [`CodecOptions`].
#[cfg(not(target_arch = "x86_64"))]
pub const COMPILE_OPTIONS: &[&str] = &["wide-search-tree"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrdpathErr {
    #[error("internal error")]
    Internal,

    #[error("out of memory")]
    OutOfMemory,

    #[error("invalid parameter: {0}")]
    Invalid(#[from] InvalidParam),

    #[error("unable to parse setup at offset {offset}")]
    SetupParse { offset: usize },

    #[error("invalid setup: {0}")]
    SetupInvalid(#[from] SetupViolation),

    #[error("setup rejected due to internal limits: {0}")]
    SetupLimit(#[from] LimitViolation),

    #[error("data corruption detected after {decoded} decoded component(s)")]
    CorruptData { decoded: usize },
}

impl OrdpathErr {
    /// The coarse status code of this error.
    pub fn status(&self) -> Status {
        Status::from(self)
    }
}

/// A setup that parses but does not describe a usable code.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SetupViolation {
    #[error("origin not set")]
    MissingOrigin,

    #[error("origin already set, repeated on entry {entry}")]
    DuplicateOrigin { entry: usize },

    #[error("encoding is not prefix-free: entry {entry} overlaps entry {conflicts_with}")]
    NotPrefixFree { entry: usize, conflicts_with: usize },
}

/// A well-formed setup exceeding one of the [`limits`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LimitViolation {
    #[error("the number of intervals exceeds {}", limits::INTERVAL_NUM_MAX)]
    TooManyIntervals,

    #[error("prefix of entry {entry} is {len} bits, max is {}", limits::PREFIX_LEN_MAX)]
    PrefixTooLong { entry: usize, len: usize },

    #[error("width of entry {entry} is {width}, max is {}", limits::INTERVAL_WIDTH_MAX)]
    WidthTooLarge { entry: usize, width: u64 },

    #[error("origin of entry {entry} is too big or too small")]
    OriginOutOfRange { entry: usize },

    #[error("the resulting range exceeds internal limits")]
    DomainOutOfRange,
}

/// Caller misuse of the encode/decode API.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InvalidParam {
    #[error("unaligned buffer, expected alignment {}", limits::ORDPATH_BUF_ALIGNMENT)]
    Misaligned,

    #[error("output buffer has no room for another 64-bit word")]
    BufferTooSmall,

    #[error("output label has no room for another component")]
    OutputTooSmall,

    #[error("bit length {bit_len} exceeds the {available} bits of the input buffer")]
    BitLenOutOfBounds { bit_len: usize, available: usize },

    #[error("label component {index} ({value}) is outside the codec domain")]
    ValueOutOfDomain { index: usize, value: i64 },
}

#[cfg(test)]
mod tests {
    use crate::COMPILE_OPTIONS;

    #[test]
    fn test_compile_options() {
        assert!(COMPILE_OPTIONS.contains(&"wide-search-tree"));
        assert_eq!(
            COMPILE_OPTIONS.contains(&"sse2-bitbuf"),
            cfg!(target_arch = "x86_64")
        );
    }
}
