use core::fmt;

/// A result type defaulting to [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `floe` can emit.
///
/// The only domain error is [`Error::ClockRegression`]. When the `parking-lot`
/// feature is enabled, mutexes do not poison and [`Error::LockPoisoned`] is
/// compiled out, leaving clock regression as the sole failure mode.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum Error {
    /// The time source reported a timestamp earlier than one already used by
    /// this generator.
    ///
    /// Handing out another ID at `observed` could repeat a timestamp/sequence
    /// pair that was already issued, so the generator refuses instead of
    /// silently recovering. The caller decides policy: abort the enclosing
    /// operation, alert, or retry after the clock condition clears. Retrying
    /// immediately will usually reproduce the same error.
    ClockRegression {
        /// Milliseconds since the epoch of the last issued ID.
        last: u64,
        /// Milliseconds since the epoch reported by the time source.
        observed: u64,
    },

    /// The operation failed because the generator's lock was **poisoned**.
    ///
    /// This occurs when a thread panics while holding the lock. When the
    /// `parking-lot` feature is enabled, mutexes do not poison, so this
    /// variant is not available.
    #[cfg(not(feature = "parking-lot"))]
    LockPoisoned,
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ClockRegression { last, observed } => write!(
                fmt,
                "clock moved backward: last issued timestamp {last}ms, observed {observed}ms"
            ),
            #[cfg(not(feature = "parking-lot"))]
            Self::LockPoisoned => write!(fmt, "generator lock poisoned"),
        }
    }
}

impl core::error::Error for Error {}

#[cfg(not(feature = "parking-lot"))]
use crate::generator::{MutexGuard, PoisonError};
#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
