use crate::{layout::TIMESTAMP_SCALE, time::TimeUnit};

/// Final assembly of an identifier from its already-validated fields.
///
/// Every encoding shares the generator's sequence reservation and overflow
/// detection; only the time unit and the serialization differ. Outputs of
/// different encodings are not comparable with each other.
pub trait Encoding {
    /// The serialized identifier.
    type Output: Send + 'static;

    /// The unit elapsed time is measured in for this encoding.
    const UNIT: TimeUnit;

    /// Builds the identifier.
    ///
    /// `elapsed` is at most [`crate::MAX_TIMESTAMP`], `node_id` is already
    /// shifted into place and `sequence` is already masked.
    fn assemble(elapsed: u64, node_id: u64, sequence: u64) -> Self::Output;
}

/// Millisecond epoch packed into a `u64`.
///
/// The container keeps only the low [`crate::U64_TIMESTAMP_BITS`] bits of the
/// elapsed milliseconds: the scaled timestamp wraps instead of failing.
#[derive(Clone, Copy, Debug, Default)]
pub struct U64Encoding;

impl Encoding for U64Encoding {
    type Output = u64;

    const UNIT: TimeUnit = TimeUnit::Millis;

    fn assemble(elapsed: u64, node_id: u64, sequence: u64) -> u64 {
        elapsed.wrapping_mul(TIMESTAMP_SCALE) | node_id | sequence
    }
}

/// Nanosecond epoch packed into a `u128`.
///
/// Wide enough that the 63-bit timestamp field is never truncated, so values
/// sort by elapsed time first.
#[derive(Clone, Copy, Debug, Default)]
pub struct U128Encoding;

impl Encoding for U128Encoding {
    type Output = u128;

    const UNIT: TimeUnit = TimeUnit::Nanos;

    fn assemble(elapsed: u64, node_id: u64, sequence: u64) -> u128 {
        u128::from(elapsed) * u128::from(TIMESTAMP_SCALE) + u128::from(node_id | sequence)
    }
}

/// Nanosecond epoch rendered as the decimal elapsed time immediately
/// followed by the decimal `node_id | sequence`.
///
/// The timestamp is not scaled and there is no separator or padding, so the
/// string is not a decimal rendering of any [`U128Encoding`] value. Strings
/// are only ordered lexically, and only while both parts keep the same
/// number of digits.
#[derive(Clone, Copy, Debug, Default)]
pub struct DecimalEncoding;

impl Encoding for DecimalEncoding {
    type Output = String;

    const UNIT: TimeUnit = TimeUnit::Nanos;

    fn assemble(elapsed: u64, node_id: u64, sequence: u64) -> String {
        format!("{elapsed}{}", node_id | sequence)
    }
}
