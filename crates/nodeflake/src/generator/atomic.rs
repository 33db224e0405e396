use core::time::Duration;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    config::GeneratorConfig,
    encoding::{DecimalEncoding, Encoding, U128Encoding, U64Encoding},
    error::{Error, Result},
    identity::{NodeIdentity, Resolution},
    layout::MAX_TIMESTAMP,
    sequence::SequenceCounter,
    time::{SystemClock, TimeSource, TimeUnit},
};

/// A thread-safe, coordination-free identifier generator.
///
/// Each identifier is `elapsed * TIMESTAMP_SCALE + node_id + sequence`, where
/// `elapsed` is measured from the configured epoch in the unit of the chosen
/// [`Encoding`], `node_id` comes from the resolved [`NodeIdentity`], and
/// `sequence` is the masked value reserved from this generator's own
/// [`SequenceCounter`].
///
/// ## Features
/// - ✅ Thread-safe: the only shared state is the atomic counter
/// - ✅ Never blocks or retries
/// - ❌ Does not wait for the clock when more than
///   [`crate::MAX_SEQUENCE`]` + 1` identifiers are minted within one time
///   unit; sequence values wrap and collisions become possible
///
/// ## Recommended When
/// - Many processes mint identifiers without any coordination
/// - Throughput per node stays well below one sequence window per time unit
///
/// Share one instance by reference or [`std::sync::Arc`]; two independently
/// constructed generators never share a counter.
#[derive(Debug)]
pub struct Generator<T = SystemClock>
where
    T: TimeSource,
{
    identity: NodeIdentity,
    node_id: u64,
    sequence: SequenceCounter,
    epoch: Duration,
    epoch_millis: u64,
    epoch_nanos: u64,
    time: T,
}

impl Generator<SystemClock> {
    /// Creates a generator reading the system wall clock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolution`] if the config's node identity failed to
    /// resolve.
    ///
    /// # Example
    /// ```
    /// use nodeflake::{Generator, GeneratorConfig, IdParts, StaticHostname};
    ///
    /// let config = GeneratorConfig::builder()
    ///     .process_override(1)
    ///     .hostname_source(StaticHostname::new("app-1"))
    ///     .build();
    /// let generator = Generator::new(&config).unwrap();
    ///
    /// let ids = generator.batch_u64(3).unwrap();
    /// assert_eq!(ids.len(), 3);
    /// assert_eq!(IdParts::from_u64(ids[2]).sequence, 3);
    /// ```
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<T> Generator<T>
where
    T: TimeSource,
{
    /// Creates a generator with an explicit [`TimeSource`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolution`] if the config's node identity failed to
    /// resolve.
    pub fn with_clock(config: &GeneratorConfig, time: T) -> Result<Self> {
        let identity = config.try_identity()?;
        Ok(Self::from_identity(identity, config.epoch(), time))
    }

    /// Creates a generator from a resolution outcome.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolution`] with every collected error if
    /// `resolution` failed.
    pub fn from_resolution(resolution: Resolution, epoch: Duration, time: T) -> Result<Self> {
        let identity = resolution.into_identity()?;
        Ok(Self::from_identity(identity, epoch, time))
    }

    /// Creates a generator from an already resolved identity. Infallible.
    pub fn from_identity(identity: NodeIdentity, epoch: Duration, time: T) -> Self {
        Self {
            identity,
            node_id: identity.shifted(),
            sequence: SequenceCounter::new(),
            epoch,
            epoch_millis: TimeUnit::Millis.of(epoch),
            epoch_nanos: TimeUnit::Nanos.of(epoch),
            time,
        }
    }

    /// The resolved identity this generator stamps into every identifier.
    pub fn node_identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// The node id as shifted into the identifier layout.
    pub fn node_id(&self) -> u64 {
        self.node_id
    }

    /// The epoch elapsed time is measured from.
    pub fn epoch(&self) -> Duration {
        self.epoch
    }

    /// The raw counter value, without reserving anything.
    pub fn sequence_value(&self) -> u32 {
        self.sequence.current()
    }

    /// Elapsed time since the epoch in `unit`.
    ///
    /// A clock reading before the epoch wraps to a huge value and is reported
    /// as an overflow like any other out-of-range delta.
    fn elapsed(&self, unit: TimeUnit) -> Result<u64> {
        let epoch = match unit {
            TimeUnit::Millis => self.epoch_millis,
            TimeUnit::Nanos => self.epoch_nanos,
        };
        let elapsed = self.time.current(unit).wrapping_sub(epoch);
        if elapsed > MAX_TIMESTAMP {
            return Err(Self::cold_timestamp_overflow(elapsed));
        }
        Ok(elapsed)
    }

    #[cold]
    #[inline(never)]
    fn cold_timestamp_overflow(elapsed: u64) -> Error {
        #[cfg(feature = "tracing")]
        tracing::warn!("Timestamp overflow: elapsed {elapsed} exceeds {MAX_TIMESTAMP}");
        Error::TimestampOverflow {
            elapsed,
            max: MAX_TIMESTAMP,
        }
    }

    /// Generates one identifier in encoding `E`.
    ///
    /// The clock is checked before the counter is touched, so a failed call
    /// reserves nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TimestampOverflow`] if the elapsed time exceeds
    /// [`crate::MAX_TIMESTAMP`].
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_next<E: Encoding>(&self) -> Result<E::Output> {
        let elapsed = self.elapsed(E::UNIT)?;
        let sequence = SequenceCounter::masked(self.sequence.next(1));
        Ok(E::assemble(elapsed, self.node_id, sequence))
    }

    /// Generates `n` identifiers in encoding `E`.
    ///
    /// All `n` sequence values are reserved in one atomic step and handed out
    /// oldest first, each paired with a freshly sampled timestamp. The first
    /// sample is taken before reserving, so a clock that is already out of
    /// range fails the batch without touching the counter. If a later sample
    /// overflows, the whole batch fails and the reserved sequence values are
    /// not reused.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TimestampOverflow`] if the elapsed time for any
    /// element exceeds [`crate::MAX_TIMESTAMP`].
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_next_batch<E: Encoding>(&self, n: u32) -> Result<Vec<E::Output>> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let first = self.elapsed(E::UNIT)?;
        let last = self.sequence.next(n);
        (0..n)
            .map(|i| -> Result<E::Output> {
                let elapsed = if i == 0 {
                    first
                } else {
                    self.elapsed(E::UNIT)?
                };
                let raw = SequenceCounter::nth_reserved(last, n, i);
                Ok(E::assemble(
                    elapsed,
                    self.node_id,
                    SequenceCounter::masked(raw),
                ))
            })
            .collect()
    }

    /// Millisecond-epoch identifier packed into a `u64`.
    ///
    /// # Errors
    ///
    /// See [`Self::try_next`].
    pub fn next_u64(&self) -> Result<u64> {
        self.try_next::<U64Encoding>()
    }

    /// Nanosecond-epoch identifier packed into a `u128`.
    ///
    /// # Errors
    ///
    /// See [`Self::try_next`].
    pub fn next_u128(&self) -> Result<u128> {
        self.try_next::<U128Encoding>()
    }

    /// Nanosecond-epoch identifier as a decimal concatenation.
    ///
    /// # Errors
    ///
    /// See [`Self::try_next`].
    pub fn next_string(&self) -> Result<String> {
        self.try_next::<DecimalEncoding>()
    }

    /// # Errors
    ///
    /// See [`Self::try_next_batch`].
    pub fn batch_u64(&self, n: u32) -> Result<Vec<u64>> {
        self.try_next_batch::<U64Encoding>(n)
    }

    /// # Errors
    ///
    /// See [`Self::try_next_batch`].
    pub fn batch_u128(&self, n: u32) -> Result<Vec<u128>> {
        self.try_next_batch::<U128Encoding>(n)
    }

    /// # Errors
    ///
    /// See [`Self::try_next_batch`].
    pub fn batch_string(&self, n: u32) -> Result<Vec<String>> {
        self.try_next_batch::<DecimalEncoding>(n)
    }
}
