//! Snowflake-style 64-bit ID generation.
//!
//! A [`FloeId`] packs a millisecond timestamp (relative to a configurable
//! epoch), a datacenter ID, a server ID, and a per-millisecond sequence
//! counter into a single non-negative 64-bit value. Generators hand out IDs
//! that are unique and strictly increasing for the lifetime of the instance,
//! provided each concurrently running instance is configured with a distinct
//! `(datacenter_id, server_id)` pair.
//!
//! ```
//! use floe::{LockFloeGenerator, MonotonicClock};
//!
//! let generator = LockFloeGenerator::new(1, 1, MonotonicClock::default());
//! let a = generator.next_id().unwrap();
//! let b = generator.next_id().unwrap();
//! assert!(a < b);
//! ```

mod error;
mod generator;
mod id;
mod time;

pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::time::*;
