//! Sensor subsystem — the energy meter driver.
//!
//! The meter reading is folded into a [`Sample`] each tick by the
//! hardware adapter; frequency and the meter's own alarm flag are logged
//! but not supervised.

pub mod pzem;

use crate::monitor::Sample;
use crate::time::Instant;
use pzem::PzemReading;

/// Convert a raw meter reading into a monitor sample stamped at `now`.
pub fn to_sample(reading: &PzemReading, now: Instant) -> Sample {
    Sample {
        voltage: reading.voltage,
        current: reading.current,
        power: reading.power,
        energy_kwh: reading.energy_kwh,
        power_factor: reading.power_factor,
        timestamp: now,
    }
}
