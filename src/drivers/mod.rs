//! Actuator and input drivers.

pub mod cutoff;
pub mod mode_pin;
