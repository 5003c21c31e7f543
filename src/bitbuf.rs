//! The 64-bit shift register shared by the encoder and the decoder.
//!
//! Bits are kept left-justified: the most significant bit of the register is
//! the oldest pending bit. Encode and decode only ever use the operations of
//! [`BitBuf`], so a backend can be swapped without changing the wire format.

use std::fmt::Debug;

#[cfg(target_arch = "x86_64")]
mod sse2;

#[cfg(target_arch = "x86_64")]
pub use sse2::Sse2;

/// The backend used when none is requested explicitly.
pub type DefaultBitBuf = u64;

/// A 64-bit register. All backends must be bit-identical.
///
/// Shifts by 64 bits or more yield zero, and `add`/`sub` wrap.
pub trait BitBuf: Copy + Debug {
    fn zero() -> Self;

    /// Load a word stored in big-endian byte order.
    fn load_be(bytes: &[u8; 8]) -> Self;

    /// Store the register in big-endian byte order.
    fn store_be(self) -> [u8; 8];

    fn from_i64(value: i64) -> Self;

    fn to_i64(self) -> i64;

    fn add(self, rhs: Self) -> Self;

    fn sub(self, rhs: Self) -> Self;

    fn or(self, rhs: Self) -> Self;

    /// Logical shift left.
    fn shl(self, count: u32) -> Self;

    /// Logical shift right.
    fn shr(self, count: u32) -> Self;

    /// The top eight bits, used to index the prefix lookup table.
    #[inline]
    fn high_byte(self) -> u8 {
        self.shr(56).to_i64() as u8
    }
}

impl BitBuf for u64 {
    #[inline(always)]
    fn zero() -> Self {
        0
    }

    #[inline(always)]
    fn load_be(bytes: &[u8; 8]) -> Self {
        u64::from_be_bytes(*bytes)
    }

    #[inline(always)]
    fn store_be(self) -> [u8; 8] {
        self.to_be_bytes()
    }

    #[inline(always)]
    fn from_i64(value: i64) -> Self {
        value as u64
    }

    #[inline(always)]
    fn to_i64(self) -> i64 {
        self as i64
    }

    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        self.wrapping_add(rhs)
    }

    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        self.wrapping_sub(rhs)
    }

    #[inline(always)]
    fn or(self, rhs: Self) -> Self {
        self | rhs
    }

    #[inline(always)]
    fn shl(self, count: u32) -> Self {
        self.checked_shl(count).unwrap_or(0)
    }

    #[inline(always)]
    fn shr(self, count: u32) -> Self {
        self.checked_shr(count).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use proptest::{prop_assert_eq, proptest};

    use super::BitBuf;

    #[track_caller]
    fn check_backend<B: BitBuf>() {
        let word = [0x81, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0xF8];
        let x = B::load_be(&word);
        assert_eq!(x.to_i64() as u64, 0x8102_0304_0506_07F8);
        assert_eq!(x.store_be(), word);
        assert_eq!(x.high_byte(), 0x81);

        // shifts are logical and saturate to zero
        assert_eq!(x.shr(4).to_i64() as u64, 0x0810_2030_4050_607F);
        assert_eq!(x.shl(4).to_i64() as u64, 0x1020_3040_5060_7F80);
        assert_eq!(x.shl(64).to_i64(), 0);
        assert_eq!(x.shr(64).to_i64(), 0);
        assert_eq!(x.shr(u32::MAX).to_i64(), 0);
        assert_eq!(x.shl(0).store_be(), word);

        // arithmetic wraps
        let max = B::from_i64(i64::MAX);
        assert_eq!(max.add(B::from_i64(1)).to_i64(), i64::MIN);
        assert_eq!(B::zero().sub(B::from_i64(1)).to_i64(), -1);
        assert_eq!(B::from_i64(0b1010).or(B::from_i64(0b0101)).to_i64(), 0b1111);
        assert_eq!(B::zero().store_be(), [0; 8]);
    }

    #[test]
    fn test_scalar_backend() {
        check_backend::<u64>();
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_sse2_backend() {
        check_backend::<super::Sse2>();
    }

    #[cfg(target_arch = "x86_64")]
    proptest! {
        #[test]
        fn test_backends_agree(a: i64, b: i64, count in 0u32..80) {
            use super::Sse2;
            let (sa, sb) = (a as u64, b as u64);
            let (va, vb) = (Sse2::from_i64(a), Sse2::from_i64(b));

            prop_assert_eq!(sa.add(sb).to_i64(), va.add(vb).to_i64());
            prop_assert_eq!(sa.sub(sb).to_i64(), va.sub(vb).to_i64());
            prop_assert_eq!(sa.or(sb).to_i64(), va.or(vb).to_i64());
            prop_assert_eq!(sa.shl(count).to_i64(), va.shl(count).to_i64());
            prop_assert_eq!(sa.shr(count).to_i64(), va.shr(count).to_i64());
            prop_assert_eq!(sa.store_be(), va.store_be());
            let word = sa.store_be();
            prop_assert_eq!(u64::load_be(&word).to_i64(), Sse2::load_be(&word).to_i64());
            prop_assert_eq!(sa.high_byte(), va.high_byte());
        }
    }
}
