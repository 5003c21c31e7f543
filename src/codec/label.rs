use std::{cmp::Ordering, fmt::Debug, hash::Hash};

use bytes::Bytes;
use zerocopy::{BigEndian, FromBytes, IntoBytes, U64};

use crate::{
    OrdpathErr,
    bitbuf::DefaultBitBuf,
    codec::{Codec, decoder::Decoder},
};

/// Owns the word buffer backing an [`EncodedLabel`] so that the bytes keep
/// their 8-byte alignment.
struct Words(Vec<u64>);

impl AsRef<[u8]> for Words {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// An owned encoded label: a bitstring plus its exact length in bits.
///
/// Encoded labels compare by their significant bytes first and their bit
/// length second. For an order-preserving [`Codec`] this matches the
/// lexicographic order of the decoded labels.
#[derive(Clone)]
pub struct EncodedLabel {
    data: Bytes,
    bit_len: usize,
}

impl EncodedLabel {
    pub(crate) fn from_words(words: Vec<u64>, bit_len: usize) -> Self {
        debug_assert!(bit_len <= words.len() * 64);
        Self {
            data: Bytes::from_owner(Words(words)),
            bit_len,
        }
    }

    #[inline]
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// The bytes holding the encoded bits. Unused low bits of the last byte
    /// are zero.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.bit_len.div_ceil(8)]
    }

    /// The full buffer as big-endian words, including the zero-filled tail
    /// of the last word.
    pub fn words(&self) -> &[U64<BigEndian>] {
        <[U64<BigEndian>]>::ref_from_bytes(&self.data).unwrap_or_default()
    }

    /// Consume the label, returning the full word buffer as bytes.
    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    /// Decode this label with the codec that produced it.
    pub fn decode(&self, codec: &Codec) -> Result<Vec<i64>, OrdpathErr> {
        Decoder::<DefaultBitBuf>::new(codec, &self.data, self.bit_len)?
            .try_collect_label()
    }
}

impl Debug for EncodedLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedLabel")
            .field("bit_len", &self.bit_len)
            .field("bytes", &format_args!("{:02x?}", self.as_bytes()))
            .finish()
    }
}

impl PartialEq for EncodedLabel {
    fn eq(&self, other: &Self) -> bool {
        self.bit_len == other.bit_len && self.as_bytes() == other.as_bytes()
    }
}

impl Eq for EncodedLabel {}

impl PartialOrd for EncodedLabel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EncodedLabel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes()
            .cmp(other.as_bytes())
            .then(self.bit_len.cmp(&other.bit_len))
    }
}

impl Hash for EncodedLabel {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
        self.bit_len.hash(state);
    }
}
