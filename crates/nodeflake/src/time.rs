use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

/// Default epoch: Saturday, February 20, 2016 11:23:57 UTC.
pub const DEFAULT_EPOCH: Duration = Duration::from_millis(1_455_967_437_000);

/// The resolution an encoding measures elapsed time in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TimeUnit {
    /// Milliseconds since the epoch.
    Millis,
    /// Nanoseconds since the epoch.
    Nanos,
}

impl TimeUnit {
    /// Expresses `duration` in this unit, saturating at `u64::MAX`.
    pub fn of(self, duration: Duration) -> u64 {
        let value = match self {
            Self::Millis => duration.as_millis(),
            Self::Nanos => duration.as_nanos(),
        };
        u64::try_from(value).unwrap_or(u64::MAX)
    }
}

/// A trait for time sources that return wall-clock time since the Unix epoch.
///
/// This abstraction allows you to plug in the system clock or a mocked time
/// source in tests. The generator subtracts its own epoch, so implementations
/// report absolute time.
///
/// # Example
///
/// ```
/// use nodeflake::{TimeSource, TimeUnit};
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
///
///     fn current_nanos(&self) -> u64 {
///         1_234_000_000
///     }
/// }
///
/// let time = FixedTime;
/// assert_eq!(time.current(TimeUnit::Millis), 1234);
/// ```
pub trait TimeSource {
    /// Returns the current time in milliseconds since the Unix epoch.
    fn current_millis(&self) -> u64;

    /// Returns the current time in nanoseconds since the Unix epoch.
    fn current_nanos(&self) -> u64;

    /// Returns the current time in `unit`.
    fn current(&self, unit: TimeUnit) -> u64 {
        match unit {
            TimeUnit::Millis => self.current_millis(),
            TimeUnit::Nanos => self.current_nanos(),
        }
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }

    fn current_nanos(&self) -> u64 {
        (**self).current_nanos()
    }
}

/// Wall-clock time from [`SystemTime`].
///
/// The clock is trusted as-is: adjustments that move it backwards are visible
/// in generated identifiers. A reading before the Unix epoch is reported as
/// `0`, which the generator then rejects as a timestamp overflow for any
/// epoch after 1970.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl SystemClock {
    fn since_unix_epoch() -> Duration {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
    }
}

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        TimeUnit::Millis.of(Self::since_unix_epoch())
    }

    fn current_nanos(&self) -> u64 {
        TimeUnit::Nanos.of(Self::since_unix_epoch())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_epoch_in_both_units() {
        assert_eq!(TimeUnit::Millis.of(DEFAULT_EPOCH), 1_455_967_437_000);
        assert_eq!(
            TimeUnit::Nanos.of(DEFAULT_EPOCH),
            1_455_967_437_000_000_000
        );
    }

    #[test]
    fn nanos_saturate() {
        assert_eq!(TimeUnit::Nanos.of(Duration::MAX), u64::MAX);
    }

    #[test]
    fn system_clock_is_past_default_epoch() {
        let clock = SystemClock;
        assert!(clock.current_millis() > TimeUnit::Millis.of(DEFAULT_EPOCH));
        assert!(clock.current_nanos() > TimeUnit::Nanos.of(DEFAULT_EPOCH));
        assert!(clock.current(TimeUnit::Millis) <= clock.current_nanos() / 1_000_000 + 1);
    }
}
