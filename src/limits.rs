//! Internal limits shared by the setup parser and the codec.

/// Longest permitted interval prefix, in bits.
pub const PREFIX_LEN_MAX: u32 = 8;

/// Widest permitted interval, in bits. Keeps `prefix + width` within 63 bits.
pub const INTERVAL_WIDTH_MAX: u32 = 63 - PREFIX_LEN_MAX;

/// Maximum number of intervals in a setup.
pub const INTERVAL_NUM_MAX: usize = 20;

/// Smallest value a codec domain may contain.
pub const VALID_RANGE_MIN: i64 = i64::MIN / 2;

/// Largest value a codec domain may reach (exclusive upper bound included).
pub const VALID_RANGE_MAX: i64 = i64::MAX / 2;

/// Required alignment of caller supplied encode/decode buffers.
pub const ORDPATH_BUF_ALIGNMENT: usize = 8;

/// Number of entries in the prefix lookup table.
pub(crate) const LOOKUP_TABLE_LEN: usize = 1 << PREFIX_LEN_MAX;

/// Interval arena size: slot 0 is the refill sentinel.
pub(crate) const INTERVAL_SLOTS: usize = INTERVAL_NUM_MAX + 1;

static_assertions::const_assert!(PREFIX_LEN_MAX + INTERVAL_WIDTH_MAX <= 63);
static_assertions::const_assert_eq!(LOOKUP_TABLE_LEN, 256);
// arena indices are stored as u8 in the lookup table
static_assertions::const_assert!(INTERVAL_SLOTS <= u8::MAX as usize);
// sum of all interval sizes must not overflow i64
static_assertions::const_assert!(
    (INTERVAL_NUM_MAX as u128) << INTERVAL_WIDTH_MAX <= i64::MAX as u128
);
