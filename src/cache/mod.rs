//! Local persistence with time-based expiry
//!
//! A [`StorageMedium`] holds raw strings; an [`ExpiringStore`] layered on top
//! wraps every value with its write time and TTL, so stale entries read as
//! misses.

pub mod clock;
pub mod medium;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use medium::{FileMedium, MemoryMedium, StorageMedium};
pub use store::{ExpiringStore, DEFAULT_TTL_HOURS};
