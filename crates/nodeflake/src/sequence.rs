use portable_atomic::{AtomicU32, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::layout::MAX_SEQUENCE;

/// A lock-free reservation counter shared by every caller of one generator.
///
/// Each call to [`SequenceCounter::next`] atomically adds `n` and returns the
/// new value, so concurrent callers always receive disjoint ranges. The
/// counter wraps at `2^32`; callers only consume the low
/// [`crate::SEQUENCE_BITS`] bits, which stay monotonic modulo that window.
///
/// A counter is owned by exactly one [`crate::Generator`] and is never shared
/// between independently constructed generators.
///
/// # Example
///
/// ```
/// use nodeflake::SequenceCounter;
///
/// let counter = SequenceCounter::new();
/// assert_eq!(counter.next(1), 1);
/// assert_eq!(counter.next(3), 4);
/// assert_eq!(SequenceCounter::masked(4), 4);
/// ```
#[derive(Debug, Default)]
pub struct SequenceCounter {
    #[cfg(feature = "cache-padded")]
    value: crossbeam_utils::CachePadded<AtomicU32>,
    #[cfg(not(feature = "cache-padded"))]
    value: AtomicU32,
}

impl SequenceCounter {
    /// Creates a counter starting at zero.
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Creates a counter with an explicit starting value.
    ///
    /// Mostly useful to exercise wraparound in tests.
    pub fn starting_at(value: u32) -> Self {
        Self {
            #[cfg(feature = "cache-padded")]
            value: crossbeam_utils::CachePadded::new(AtomicU32::new(value)),
            #[cfg(not(feature = "cache-padded"))]
            value: AtomicU32::new(value),
        }
    }

    /// Reserves `n` consecutive values and returns the last one.
    ///
    /// The reserved range is `last - n + 1 ..= last` (wrapping).
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next(&self, n: u32) -> u32 {
        self.value.fetch_add(n, Ordering::Relaxed).wrapping_add(n)
    }

    /// The current raw value, without reserving anything.
    pub fn current(&self) -> u32 {
        self.value.load(Ordering::Relaxed)
    }

    /// Masks a raw counter value down to the sequence field.
    pub const fn masked(raw: u32) -> u64 {
        raw as u64 & MAX_SEQUENCE
    }

    /// The raw value at position `index` of a reservation of `n` values
    /// ending at `last`, oldest first.
    pub const fn nth_reserved(last: u32, n: u32, index: u32) -> u32 {
        last.wrapping_sub(n - index - 1)
    }
}
