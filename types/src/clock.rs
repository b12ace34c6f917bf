//! Time source for the engine.

use crate::time::Timestamp;

/// Supplies "now" to the engine.
///
/// Implementations must be monotonically non-decreasing. The engine reads the
/// clock once per public operation.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time from the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}
