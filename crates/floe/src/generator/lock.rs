use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    error::{Error, Result},
    generator::Mutex,
    id::FloeId,
    time::TimeSource,
};

/// A mutex-serialized ID generator for multi-threaded use.
///
/// The mutable state (`lastTimestamp` and `sequence`, packed into a single
/// [`FloeId`]) lives behind an [`Arc<Mutex<_>>`]. Every call to
/// [`next_id`](Self::next_id) runs the whole algorithm — clock read,
/// comparison, sequence update, commit — inside one critical section, so
/// exactly one caller is inside at a time and the order in which calls
/// complete equals the numeric order of the returned IDs.
///
/// Cloning is cheap and shares the underlying state: clones hand out IDs
/// from the same timestamp/sequence stream.
///
/// ## See also
/// - [`BasicFloeGenerator`] for single-threaded use without locking
///
/// [`BasicFloeGenerator`]: crate::generator::BasicFloeGenerator
pub struct LockFloeGenerator<T>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    state: Arc<crossbeam_utils::CachePadded<Mutex<FloeId>>>,
    #[cfg(not(feature = "cache-padded"))]
    state: Arc<Mutex<FloeId>>,
    time: T,
}

impl<T> Clone for LockFloeGenerator<T>
where
    T: TimeSource + Clone,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            time: self.time.clone(),
        }
    }
}

impl<T> LockFloeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a new generator for the given datacenter/server pair.
    ///
    /// `datacenter_id` and `server_id` must each be in `[0, 31]`; they are
    /// fixed for the generator's lifetime and encoded into every ID. Distinct
    /// pairs across concurrently running instances are what keep IDs globally
    /// unique — assigning them (via configuration, environment, or an
    /// external coordinator) is the caller's responsibility.
    ///
    /// # Example
    /// ```
    /// use floe::{LockFloeGenerator, MonotonicClock};
    ///
    /// let generator = LockFloeGenerator::new(1, 1, MonotonicClock::default());
    /// let id = generator.next_id().unwrap();
    /// assert_eq!(id.datacenter_id(), 1);
    /// assert_eq!(id.server_id(), 1);
    /// ```
    pub fn new(datacenter_id: u64, server_id: u64, time: T) -> Self {
        Self::from_components(0, datacenter_id, server_id, 0, time)
    }

    /// Creates a generator preloaded with explicit state.
    ///
    /// Useful for pinning the starting timestamp/sequence in tests. In
    /// typical use, prefer [`Self::new`].
    pub fn from_components(
        timestamp: u64,
        datacenter_id: u64,
        server_id: u64,
        sequence: u64,
        time: T,
    ) -> Self {
        let id = FloeId::from_components(timestamp, datacenter_id, server_id, sequence);
        Self {
            #[cfg(feature = "cache-padded")]
            state: Arc::new(crossbeam_utils::CachePadded::new(Mutex::new(id))),
            #[cfg(not(feature = "cache-padded"))]
            state: Arc::new(Mutex::new(id)),
            time,
        }
    }

    /// Generates the next ID.
    ///
    /// Each returned ID is strictly greater than every ID previously returned
    /// by this generator (or any clone sharing its state). If the 4096-ID
    /// budget for the current millisecond is exhausted, the call busy-polls
    /// the time source until the next millisecond while still holding the
    /// critical section; other callers queue behind it. That wait is bounded
    /// by clock granularity and is the only point where this method blocks
    /// beyond lock acquisition.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockRegression`] if the time source reports a timestamp
    ///   earlier than the last issued one. State is left untouched; the
    ///   caller decides whether to abort, alert, or retry once the clock has
    ///   caught up.
    /// - [`Error::LockPoisoned`] if a thread panicked while holding the lock
    ///   (std mutex only; compiled out with the `parking-lot` feature).
    ///
    /// [`Error::LockPoisoned`]: crate::Error
    ///
    /// # Example
    /// ```
    /// use floe::{LockFloeGenerator, MonotonicClock};
    ///
    /// let generator = LockFloeGenerator::new(0, 3, MonotonicClock::default());
    /// match generator.next_id() {
    ///     Ok(id) => println!("issued {id}"),
    ///     Err(e) => eprintln!("cannot issue IDs: {e}"),
    /// }
    /// ```
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&self) -> Result<FloeId> {
        let mut state = {
            #[cfg(feature = "parking-lot")]
            {
                self.state.lock()
            }
            #[cfg(not(feature = "parking-lot"))]
            {
                self.state.lock()?
            }
        };

        let now = self.time.current_millis();
        let last = state.timestamp();

        let next = if now < last {
            return Err(Error::ClockRegression {
                last,
                observed: now,
            });
        } else if now == last {
            if state.has_sequence_room() {
                state.increment_sequence()
            } else {
                state.rollover_to(self.wait_for_next_millis(last))
            }
        } else {
            state.rollover_to(now)
        };

        *state = next;
        Ok(next)
    }

    /// Spins until the time source passes `last`, returning the new reading.
    ///
    /// Only reached when a single millisecond's sequence space is exhausted,
    /// so the wait is bounded by clock granularity in practice.
    #[cold]
    #[inline(never)]
    fn wait_for_next_millis(&self, last: u64) -> u64 {
        loop {
            let now = self.time.current_millis();
            if now > last {
                return now;
            }
            core::hint::spin_loop();
        }
    }
}
