//! Monotonic millisecond timestamps.
//!
//! Every timer in the firmware (dwell windows, reminder cadence, test
//! signal phase) compares [`Instant`]s through explicit, non-negative
//! duration arithmetic.  A reading that appears to go backwards yields
//! `None` (checked) or zero (saturating), never a wrapped value.

use core::ops::Add;
use core::time::Duration;

use serde::{Deserialize, Serialize};

/// Milliseconds since boot, as reported by the platform timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Instant {
    millis: u64,
}

impl Instant {
    /// The boot instant.
    pub const ZERO: Self = Self { millis: 0 };

    pub const fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    pub const fn as_millis(self) -> u64 {
        self.millis
    }

    /// Time elapsed since `earlier`, or `None` if `earlier` is in the future.
    pub fn checked_duration_since(self, earlier: Instant) -> Option<Duration> {
        self.millis
            .checked_sub(earlier.millis)
            .map(Duration::from_millis)
    }

    /// Time elapsed since `earlier`, clamped to zero.
    pub fn saturating_duration_since(self, earlier: Instant) -> Duration {
        self.checked_duration_since(earlier).unwrap_or(Duration::ZERO)
    }
}

impl Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, rhs: Duration) -> Instant {
        let ms = u64::try_from(rhs.as_millis()).unwrap_or(u64::MAX);
        Instant {
            millis: self.millis.saturating_add(ms),
        }
    }
}
