//! One polling tick's worth of meter data.

use serde::Serialize;

use crate::time::Instant;

/// A point-in-time measurement from the meter or the test signal.
///
/// Built once per tick and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Sample {
    /// RMS line voltage (V).
    pub voltage: f32,
    /// RMS load current (A).
    pub current: f32,
    /// Active power (W).
    pub power: f32,
    /// Energy counter as persisted by the meter (kWh).
    pub energy_kwh: f32,
    /// Power factor (0.00 – 1.00).
    pub power_factor: f32,
    /// When the sample was taken.
    pub timestamp: Instant,
}

impl Sample {
    /// Same readings, fresh timestamp.  Used when the meter fails and the
    /// last good values are reported as stale data.
    pub fn restamped(self, timestamp: Instant) -> Self {
        Self { timestamp, ..self }
    }
}
