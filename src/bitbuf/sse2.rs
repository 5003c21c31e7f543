// SSE2 is part of the x86_64 baseline, so these intrinsics are always
// available. Older toolchains still declare them `unsafe`.
#![allow(unused_unsafe)]

use std::{
    arch::x86_64::{
        __m128i, _mm_add_epi64, _mm_cvtsi64_si128, _mm_cvtsi128_si64, _mm_or_si128,
        _mm_packus_epi16, _mm_setzero_si128, _mm_shuffle_epi32, _mm_shufflehi_epi16,
        _mm_shufflelo_epi16, _mm_sll_epi64, _mm_srl_epi64, _mm_sub_epi64, _mm_unpacklo_epi8,
    },
    fmt::Debug,
};

use super::BitBuf;

/// A [`BitBuf`] held in the low 64-bit lane of an SSE2 register.
#[derive(Clone, Copy)]
pub struct Sse2(__m128i);

/// Reverse the bytes of the low lane, leaving the high lane zero.
#[inline(always)]
fn byteswap(x: __m128i) -> __m128i {
    unsafe {
        let zero = _mm_setzero_si128();
        // widen bytes to 16-bit lanes, reverse each half, narrow again and
        // swap the two 32-bit halves
        let wide = _mm_unpacklo_epi8(x, zero);
        let rev = _mm_shufflelo_epi16::<0x1B>(_mm_shufflehi_epi16::<0x1B>(wide));
        _mm_shuffle_epi32::<0xB1>(_mm_packus_epi16(rev, zero))
    }
}

#[inline(always)]
fn count(count: u32) -> __m128i {
    unsafe { _mm_cvtsi64_si128(i64::from(count)) }
}

impl BitBuf for Sse2 {
    #[inline(always)]
    fn zero() -> Self {
        Self(unsafe { _mm_setzero_si128() })
    }

    #[inline(always)]
    fn load_be(bytes: &[u8; 8]) -> Self {
        let raw = unsafe { _mm_cvtsi64_si128(i64::from_le_bytes(*bytes)) };
        Self(byteswap(raw))
    }

    #[inline(always)]
    fn store_be(self) -> [u8; 8] {
        let raw = unsafe { _mm_cvtsi128_si64(byteswap(self.0)) };
        raw.to_le_bytes()
    }

    #[inline(always)]
    fn from_i64(value: i64) -> Self {
        Self(unsafe { _mm_cvtsi64_si128(value) })
    }

    #[inline(always)]
    fn to_i64(self) -> i64 {
        unsafe { _mm_cvtsi128_si64(self.0) }
    }

    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        Self(unsafe { _mm_add_epi64(self.0, rhs.0) })
    }

    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        Self(unsafe { _mm_sub_epi64(self.0, rhs.0) })
    }

    #[inline(always)]
    fn or(self, rhs: Self) -> Self {
        Self(unsafe { _mm_or_si128(self.0, rhs.0) })
    }

    #[inline(always)]
    fn shl(self, n: u32) -> Self {
        // counts above 63 clear the lane
        Self(unsafe { _mm_sll_epi64(self.0, count(n)) })
    }

    #[inline(always)]
    fn shr(self, n: u32) -> Self {
        Self(unsafe { _mm_srl_epi64(self.0, count(n)) })
    }
}

impl Debug for Sse2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sse2({:#018x})", self.to_i64() as u64)
    }
}
