use bytes::BufMut;

use crate::{
    InvalidParam, OrdpathErr,
    bitbuf::{BitBuf, DefaultBitBuf},
};

/// Packs left-justified codes into big-endian 64-bit words.
///
/// Pending bits live in the accumulator until a full word is available. The
/// final, partial word is written by [`Encoder::finish`], zero-filled.
pub struct Encoder<B: BufMut, A: BitBuf = DefaultBitBuf> {
    buf: B,
    acc: A,
    /// number of pending bits in `acc`, always < 64 between calls
    used: u32,
    words_written: usize,
}

impl<B: BufMut, A: BitBuf> Encoder<B, A> {
    pub fn new(buf: B) -> Self {
        Self {
            buf,
            acc: A::zero(),
            used: 0,
            words_written: 0,
        }
    }

    /// Retrieve the wrapped buffer from the `Encoder`, dropping pending bits.
    pub fn into_inner(self) -> B {
        self.buf
    }

    /// Append the top `bitlen` bits of `code`. Bits below them must be zero.
    #[inline]
    pub fn put_code(&mut self, code: A, bitlen: u32) -> Result<(), OrdpathErr> {
        debug_assert!((1..64).contains(&bitlen));
        self.acc = self.acc.or(code.shr(self.used));
        self.used += bitlen;
        if self.used >= 64 {
            self.put_word(self.acc)?;
            self.used -= 64;
            // the low `used` bits of the code did not fit in the stored word
            self.acc = code.shl(bitlen - self.used);
        }
        Ok(())
    }

    /// Write the final partial word and return the exact number of bits
    /// written since this Encoder was created.
    pub fn finish(mut self) -> Result<usize, OrdpathErr> {
        self.put_word(self.acc)?;
        Ok((self.words_written - 1) * 64 + self.used as usize)
    }

    /// The number of complete words flushed so far.
    pub fn words_written(&self) -> usize {
        self.words_written
    }

    #[inline]
    fn put_word(&mut self, word: A) -> Result<(), OrdpathErr> {
        if self.buf.remaining_mut() < size_of::<u64>() {
            return Err(InvalidParam::BufferTooSmall.into());
        }
        self.buf.put_slice(&word.store_be());
        self.words_written += 1;
        Ok(())
    }
}
