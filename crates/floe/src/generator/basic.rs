use core::cell::Cell;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    error::{Error, Result},
    id::FloeId,
    time::TimeSource,
};

/// A single-threaded ID generator.
///
/// State lives in a [`Cell`], so there is no locking and no `Sync` impl.
/// This matches the single-writer design where every worker owns its own
/// generator (with a distinct datacenter/server pair, or funneled behind a
/// channel): equivalent serialization to a mutex, without one.
///
/// ## See also
/// - [`LockFloeGenerator`] for sharing one generator across threads
///
/// [`LockFloeGenerator`]: crate::generator::LockFloeGenerator
pub struct BasicFloeGenerator<T>
where
    T: TimeSource,
{
    state: Cell<FloeId>,
    time: T,
}

impl<T> BasicFloeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a new generator for the given datacenter/server pair.
    ///
    /// `datacenter_id` and `server_id` must each be in `[0, 31]`; they are
    /// fixed for the generator's lifetime and encoded into every ID.
    ///
    /// # Example
    /// ```
    /// use floe::{BasicFloeGenerator, MonotonicClock};
    ///
    /// let generator = BasicFloeGenerator::new(2, 5, MonotonicClock::default());
    /// let id = generator.next_id().unwrap();
    /// assert_eq!(id.datacenter_id(), 2);
    /// assert_eq!(id.server_id(), 5);
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
            state: Cell::new(id),
            time,
        }
    }

    /// Generates the next ID.
    ///
    /// Each returned ID is strictly greater than every ID previously returned
    /// by this generator. If the 4096-ID budget for the current millisecond
    /// is exhausted, the call busy-polls the time source until the next
    /// millisecond.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockRegression`] if the time source reports a timestamp
    ///   earlier than the last issued one. State is left untouched.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&self) -> Result<FloeId> {
        let state = self.state.get();
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

        self.state.set(next);
        Ok(next)
    }

    /// Spins until the time source passes `last`, returning the new reading.
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
