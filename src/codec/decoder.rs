use std::iter::FusedIterator;

use tracing::debug;

use crate::{
    InvalidParam, OrdpathErr,
    bitbuf::{BitBuf, DefaultBitBuf},
    codec::{Codec, IntervalCode},
};

#[derive(Debug, Clone, Copy)]
enum State<'a> {
    /// Resolve the interval from the top byte of the accumulator.
    Lookup,
    /// The accumulator holds a complete code for this interval.
    CheapExtract(&'a IntervalCode),
    /// More bits are needed before the interval is certain.
    Refill,
    Done,
    Corrupt,
}

/// Iterates over the components of an encoded label.
///
/// Created by [`Codec::decoder`]. Yields `Err` at most once, after which the
/// iterator is exhausted.
#[derive(Debug, Clone)]
pub struct Decoder<'a, A: BitBuf = DefaultBitBuf> {
    codec: &'a Codec,
    /// unread input, trimmed to the bytes covering the declared bit length
    input: &'a [u8],
    /// bits not yet moved into the accumulator
    pending: usize,
    acc: A,
    /// number of valid bits at the top of `acc`
    used: u32,
    decoded: usize,
    state: State<'a>,
}

impl<'a, A: BitBuf> Decoder<'a, A> {
    pub(crate) fn new(
        codec: &'a Codec,
        input: &'a [u8],
        bit_len: usize,
    ) -> Result<Self, OrdpathErr> {
        let available = input.len().saturating_mul(8);
        if bit_len > available {
            debug!(bit_len, available, "bit length exceeds the input buffer");
            return Err(InvalidParam::BitLenOutOfBounds { bit_len, available }.into());
        }
        Ok(Self {
            codec,
            input: &input[..bit_len.div_ceil(8)],
            pending: bit_len,
            acc: A::zero(),
            used: 0,
            decoded: 0,
            state: State::Lookup,
        })
    }

    /// Number of components yielded so far.
    #[inline]
    pub fn decoded(&self) -> usize {
        self.decoded
    }

    /// Number of encoded bits not yet consumed.
    #[inline]
    pub fn remaining_bits(&self) -> usize {
        self.pending + self.used as usize
    }

    /// Collect the remaining components into a label, stopping at the first
    /// error.
    pub fn try_collect_label(self) -> Result<Vec<i64>, OrdpathErr> {
        let mut label = Vec::new();
        let capacity = self.remaining_bits() / self.codec.min_bitlen().max(1) as usize;
        label
            .try_reserve(capacity)
            .map_err(|_| OrdpathErr::OutOfMemory)?;
        for value in self {
            label.push(value?);
        }
        Ok(label)
    }

    #[inline(always)]
    fn extract(window: A, code: &IntervalCode) -> i64 {
        window
            .shr(64 - code.bitlen)
            .sub(A::from_i64(code.bias))
            .to_i64()
    }

    /// Load up to 64 bits from the input. Bits past the declared length read
    /// as zero.
    #[inline]
    fn next_word(&mut self, fresh_bits: u32) -> A {
        let word = match self.input.split_first_chunk::<8>() {
            Some((word, rest)) => {
                self.input = rest;
                A::load_be(word)
            }
            None => {
                let mut tail = [0u8; 8];
                tail[..self.input.len()].copy_from_slice(self.input);
                self.input = &[];
                A::load_be(&tail)
            }
        };
        word.shr(64 - fresh_bits).shl(64 - fresh_bits)
    }

    fn refill(&mut self) -> Option<Result<i64, OrdpathErr>> {
        let prev = self.used;
        let fresh_bits = self.pending.min(64) as u32;
        let fresh = self.next_word(fresh_bits);
        self.pending -= fresh_bits as usize;

        let window = self.acc.or(fresh.shr(prev));
        let code = self.codec.lookup(window.high_byte());
        let total = prev + fresh_bits;

        if code.bitlen > total {
            if total == 0 {
                self.state = State::Done;
                return None;
            }
            debug!(
                decoded = self.decoded,
                remaining = total,
                "trailing bits do not complete a code"
            );
            self.state = State::Corrupt;
            return Some(Err(OrdpathErr::CorruptData { decoded: self.decoded }));
        }

        // a code resolved on more bits can never be shorter than the bits
        // that failed to resolve it
        let Some(taken) = code.bitlen.checked_sub(prev) else {
            debug!(bitlen = code.bitlen, prev, "refill resolved a shorter code");
            self.state = State::Corrupt;
            return Some(Err(OrdpathErr::Internal));
        };

        let value = Self::extract(window, code);
        self.acc = fresh.shl(taken);
        self.used = fresh_bits - taken;
        self.decoded += 1;
        self.state = State::Lookup;
        Some(Ok(value))
    }
}

impl<A: BitBuf> Iterator for Decoder<'_, A> {
    type Item = Result<i64, OrdpathErr>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.state {
                State::Lookup => {
                    let code = self.codec.lookup(self.acc.high_byte());
                    self.state = if self.used > code.bitlen {
                        State::CheapExtract(code)
                    } else {
                        State::Refill
                    };
                }
                State::CheapExtract(code) => {
                    let value = Self::extract(self.acc, code);
                    self.acc = self.acc.shl(code.bitlen);
                    self.used -= code.bitlen;
                    self.decoded += 1;
                    self.state = State::Lookup;
                    return Some(Ok(value));
                }
                State::Refill => return self.refill(),
                State::Done | State::Corrupt => return None,
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.state {
            State::Done | State::Corrupt => (0, Some(0)),
            _ => {
                let max = self.remaining_bits() / self.codec.min_bitlen().max(1) as usize;
                (0, Some(max + 1))
            }
        }
    }
}

impl<A: BitBuf> FusedIterator for Decoder<'_, A> {}
