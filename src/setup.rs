//! Parser for the setup mini-language describing a codec.
//!
//! A setup is a whitespace separated list of entries, one per interval, in
//! ascending value order:
//!
//! ```text
//! entry  := prefix ":" width [":" origin]
//! prefix := [01]+
//! width  := [0-9]+
//! origin := [+-]?[0-9]+
//! ```
//!
//! Exactly one entry carries an origin, which is the smallest value of that
//! entry's interval. The origin of the whole domain is derived from it.

use std::{fmt::Display, ops::Range, str::FromStr};

use tracing::debug;

use crate::{
    LimitViolation, OrdpathErr, SetupViolation,
    limits::{
        INTERVAL_NUM_MAX, INTERVAL_WIDTH_MAX, PREFIX_LEN_MAX, VALID_RANGE_MAX, VALID_RANGE_MIN,
    },
};

/// A general purpose setup: short codes around zero, growing wider on both
/// sides up to 48 value bits.
pub const DEFAULT_SETUP: &str = "
    0000001 : 48
    0000010 : 32
    0000011 : 16
    000010  : 12
    000011  : 8
    00010   : 6
    00011   : 4
    001     : 3
    01      : 3 : 0
    100     : 4
    101     : 6
    1100    : 8
    1101    : 12
    11100   : 16
    11101   : 32
    11110   : 48
";

/// One interval of a setup: a bit prefix followed by `width` value bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntervalSpec {
    prefix: u8,
    prefix_len: u8,
    width: u8,
}

impl IntervalSpec {
    pub(crate) fn new(prefix: u8, prefix_len: u32, width: u32) -> Self {
        debug_assert!((1..=PREFIX_LEN_MAX).contains(&prefix_len));
        debug_assert!(width <= INTERVAL_WIDTH_MAX);
        debug_assert!(u32::from(prefix) >> prefix_len == 0);
        Self {
            prefix,
            prefix_len: prefix_len as u8,
            width: width as u8,
        }
    }

    /// The prefix bits, right aligned.
    #[inline]
    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    #[inline]
    pub fn prefix_len(&self) -> u32 {
        self.prefix_len.into()
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width.into()
    }

    /// Length of every code in this interval.
    #[inline]
    pub fn bitlen(&self) -> u32 {
        self.prefix_len() + self.width()
    }

    /// Number of values covered by this interval.
    #[inline]
    pub fn size(&self) -> i64 {
        1 << self.width
    }

    /// The prefix left aligned in a byte, the index of its first lookup slot.
    #[inline]
    pub(crate) fn lookup_start(&self) -> usize {
        usize::from(self.prefix) << (PREFIX_LEN_MAX - self.prefix_len())
    }

    /// All prefix lookup slots whose top bits match this prefix.
    #[inline]
    pub(crate) fn lookup_slots(&self) -> Range<usize> {
        let start = self.lookup_start();
        start..start + (1 << (PREFIX_LEN_MAX - self.prefix_len()))
    }
}

/// A parsed and validated setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setup {
    origin: i64,
    intervals: Vec<IntervalSpec>,
}

impl Setup {
    /// Parse a setup string, enforcing the [`crate::limits`].
    pub fn parse(setup: &str) -> Result<Self, OrdpathErr> {
        let mut cursor = Cursor::new(setup);
        let mut intervals = Vec::new();
        let mut origin = None;
        let mut range_size: i64 = 0;

        cursor.skip_ws();
        while !cursor.is_eof() {
            let entry = intervals.len();
            if entry >= INTERVAL_NUM_MAX {
                debug!("the number of intervals exceeds {INTERVAL_NUM_MAX}");
                return Err(LimitViolation::TooManyIntervals.into());
            }

            let offset = cursor.pos;
            let parse_err = || parse_error(setup, offset);

            let prefix = cursor.take_while(|b| b == b'0' || b == b'1');
            if prefix.is_empty() || !cursor.eat(b':') {
                return Err(parse_err());
            }
            let width = cursor.take_while(|b| b.is_ascii_digit());
            if width.is_empty() {
                return Err(parse_err());
            }

            if prefix.len() > PREFIX_LEN_MAX as usize {
                debug!(
                    entry,
                    len = prefix.len(),
                    "prefix length exceeds {PREFIX_LEN_MAX} bit(s)"
                );
                return Err(LimitViolation::PrefixTooLong {
                    entry,
                    len: prefix.len(),
                }
                .into());
            }
            let prefix_len = prefix.len() as u32;
            let prefix = u8::from_str_radix(prefix, 2).map_err(|_| parse_err())?;

            // digits only, so the parse can only fail on overflow
            let width = width.parse::<u64>().unwrap_or(u64::MAX);
            if width > INTERVAL_WIDTH_MAX.into() {
                debug!(entry, width, "interval width exceeds {INTERVAL_WIDTH_MAX}");
                return Err(LimitViolation::WidthTooLarge { entry, width }.into());
            }
            let spec = IntervalSpec::new(prefix, prefix_len, width as u32);

            if cursor.eat(b':') {
                let value = cursor.take_signed();
                if value.is_empty() {
                    return Err(parse_err());
                }
                if origin.is_some() {
                    debug!(entry, "origin already set");
                    return Err(SetupViolation::DuplicateOrigin { entry }.into());
                }
                let value = value
                    .parse::<i64>()
                    .ok()
                    .filter(|v| (VALID_RANGE_MIN..=VALID_RANGE_MAX).contains(v))
                    .ok_or_else(|| {
                        debug!(entry, value, "interval origin too big or too small");
                        LimitViolation::OriginOutOfRange { entry }
                    })?;
                // cannot overflow thanks to the width, count and range limits
                origin = Some(value - range_size);
            }

            range_size += spec.size();
            intervals.push(spec);
            cursor.skip_ws();
        }

        let Some(origin) = origin else {
            debug!("origin not set");
            return Err(SetupViolation::MissingOrigin.into());
        };
        if !(VALID_RANGE_MIN..=VALID_RANGE_MAX).contains(&origin)
            || origin + range_size > VALID_RANGE_MAX
        {
            debug!(origin, range_size, "the resulting range exceeds internal limits");
            return Err(LimitViolation::DomainOutOfRange.into());
        }

        Ok(Self { origin, intervals })
    }

    /// The smallest value of the domain.
    #[inline]
    pub fn origin(&self) -> i64 {
        self.origin
    }

    #[inline]
    pub fn intervals(&self) -> &[IntervalSpec] {
        &self.intervals
    }

    /// The lower bound of every interval, in order, followed by the exclusive
    /// upper bound of the domain.
    pub fn bounds(&self) -> impl Iterator<Item = i64> + '_ {
        let ends = self.intervals.iter().scan(self.origin, |min, spec| {
            *min += spec.size();
            Some(*min)
        });
        std::iter::once(self.origin).chain(ends)
    }

    /// The half-open range of values this setup can encode.
    pub fn domain(&self) -> Range<i64> {
        let size: i64 = self.intervals.iter().map(IntervalSpec::size).sum();
        self.origin..self.origin + size
    }
}

impl FromStr for Setup {
    type Err = OrdpathErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for Setup {
    /// Renders a setup string which parses back into an equal `Setup`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, spec) in self.intervals.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(
                f,
                "{:0len$b}:{}",
                spec.prefix,
                spec.width,
                len = spec.prefix_len() as usize
            )?;
            if i == 0 {
                write!(f, ":{}", self.origin)?;
            }
        }
        Ok(())
    }
}

fn parse_error(setup: &str, offset: usize) -> OrdpathErr {
    let near = setup[offset..].lines().next().unwrap_or_default();
    let near: String = near.chars().take(24).collect();
    debug!(offset, near = near.as_str(), "parse error in setup string");
    OrdpathErr::SetupParse { offset }
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    #[inline]
    fn rest(&self) -> &'a [u8] {
        &self.input.as_bytes()[self.pos..]
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn skip_ws(&mut self) {
        self.take_while(|b| b.is_ascii_whitespace());
    }

    /// Skip whitespace, then consume `expected` if it is the next byte.
    fn eat(&mut self, expected: u8) -> bool {
        self.skip_ws();
        if self.rest().first() == Some(&expected) {
            self.pos += 1;
            self.skip_ws();
            true
        } else {
            false
        }
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let len = self.rest().iter().take_while(|&&b| pred(b)).count();
        let out = &self.input[self.pos..self.pos + len];
        self.pos += len;
        out
    }

    /// Take an optionally signed run of digits; empty unless a digit is present.
    fn take_signed(&mut self) -> &'a str {
        let start = self.pos;
        if matches!(self.rest().first(), Some(b'+' | b'-')) {
            self.pos += 1;
        }
        if self.take_while(|b| b.is_ascii_digit()).is_empty() {
            self.pos = start;
            return "";
        }
        &self.input[start..self.pos]
    }
}
