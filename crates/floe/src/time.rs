use core::time::Duration;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Default epoch: Thursday, January 1, 2015 00:00:00 UTC.
///
/// A 41-bit millisecond timestamp measured from this origin stays within its
/// field until the year 2084.
pub const DEFAULT_EPOCH: Duration = Duration::from_millis(1_420_070_400_000);

/// A source of millisecond timestamps measured from a fixed epoch.
///
/// This abstraction lets generators run against the real wall clock, a
/// monotonic timer, or a mocked time source in tests (including clocks that
/// stall or run backward).
///
/// # Example
///
/// ```
/// use floe::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// assert_eq!(FixedTime.current_millis(), 1234);
/// ```
pub trait TimeSource {
    /// Returns the current time in milliseconds since the configured epoch.
    fn current_millis(&self) -> u64;
}

/// A wall-clock time source.
///
/// Reads `SystemTime::now()` on every call and subtracts the configured
/// epoch. Wall clocks can step backward (NTP corrections, manual
/// adjustments); a generator driven by this clock surfaces such a step as
/// [`Error::ClockRegression`] rather than reissuing timestamps.
///
/// Readings saturate at zero if the system clock is ever observed before the
/// epoch.
///
/// [`Error::ClockRegression`]: crate::Error::ClockRegression
#[derive(Clone, Debug)]
pub struct SystemClock {
    epoch: Duration,
}

impl Default for SystemClock {
    /// Constructs a wall clock aligned to [`DEFAULT_EPOCH`].
    fn default() -> Self {
        Self::with_epoch(DEFAULT_EPOCH)
    }
}

impl SystemClock {
    /// Constructs a wall clock with a custom epoch, specified as a duration
    /// since 1970-01-01 UTC.
    pub const fn with_epoch(epoch: Duration) -> Self {
        Self { epoch }
    }
}

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .saturating_sub(self.epoch)
            .as_millis() as u64
    }
}

/// A monotonic time source anchored to an epoch at construction.
///
/// The offset between the wall clock and the epoch is computed once; after
/// that, readings advance with `Instant`, so they never go backward even if
/// the system clock is adjusted externally. A generator driven by this clock
/// cannot observe a regression.
#[derive(Clone, Debug)]
pub struct MonotonicClock {
    start: Instant,
    epoch_offset: u64, // in milliseconds
}

impl Default for MonotonicClock {
    /// Constructs a monotonic clock aligned to [`DEFAULT_EPOCH`].
    ///
    /// Panics if the system time is earlier than the default epoch.
    fn default() -> Self {
        Self::with_epoch(DEFAULT_EPOCH)
    }
}

impl MonotonicClock {
    /// Constructs a monotonic clock using a custom epoch as the origin
    /// (t = 0), specified as a duration since 1970-01-01 UTC.
    ///
    /// # Panics
    ///
    /// Panics if the current system time is earlier than the given epoch.
    pub fn with_epoch(epoch: Duration) -> Self {
        let system_now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before UNIX epoch");
        let offset = system_now
            .checked_sub(epoch)
            .expect("system clock before custom epoch")
            .as_millis() as u64;

        Self {
            start: Instant::now(),
            epoch_offset: offset,
        }
    }
}

impl TimeSource for MonotonicClock {
    /// Returns the milliseconds since the configured epoch, based on the
    /// monotonic time elapsed since construction.
    fn current_millis(&self) -> u64 {
        self.epoch_offset + self.start.elapsed().as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_tracks_epoch_offset() {
        // A clock with a later epoch must always read earlier than one with
        // an earlier epoch.
        let base = SystemClock::default();
        let shifted = SystemClock::with_epoch(DEFAULT_EPOCH + Duration::from_secs(60));
        assert!(shifted.current_millis() < base.current_millis());
    }

    #[test]
    fn monotonic_clock_never_decreases() {
        let clock = MonotonicClock::default();
        let mut last = clock.current_millis();
        for _ in 0..10_000 {
            let now = clock.current_millis();
            assert!(now >= last);
            last = now;
        }
    }
}
