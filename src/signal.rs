//! Deterministic test-mode signal generator.
//!
//! Produces a square-wave supply voltage so the alert path can be
//! exercised without a faulty mains supply:
//!
//! ```text
//!  V
//!  230 ┤█████     █████     █████
//!  200 ┤     █████     █████     █████
//!      └────┬────┬────┬────┬────┬────▶ t (s)
//!           5   10   15   20   25
//! ```
//!
//! The output depends only on `now - start`, never on how often it is
//! called, so a run is reproducible from any instant given the same start.

use core::fmt;

use serde::Serialize;

use crate::config::TestSignalConfig;
use crate::monitor::Sample;
use crate::time::Instant;

/// Which half of the cycle the signal is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SignalPhase {
    Normal,
    Fault,
}

impl fmt::Display for SignalPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL VOLTAGE"),
            Self::Fault => write!(f, "SIMULATING VOLTAGE DROP"),
        }
    }
}

pub struct TestSignalGenerator {
    config: TestSignalConfig,
}

impl TestSignalGenerator {
    pub fn new(config: TestSignalConfig) -> Self {
        Self { config }
    }

    /// Phase at `now` for a run started at `start`.  An instant before
    /// `start` is treated as the start of the run.
    pub fn phase(&self, now: Instant, start: Instant) -> SignalPhase {
        let elapsed = now.saturating_duration_since(start).as_millis();
        let cycle = u128::from(self.config.cycle_ms.max(1));
        if elapsed % cycle < u128::from(self.config.fault_offset_ms) {
            SignalPhase::Normal
        } else {
            SignalPhase::Fault
        }
    }

    /// Synthetic supply voltage at `now`.
    pub fn voltage(&self, now: Instant, start: Instant) -> f32 {
        match self.phase(now, start) {
            SignalPhase::Normal => self.config.normal_voltage,
            SignalPhase::Fault => self.config.fault_voltage,
        }
    }

    /// Full synthetic sample.  The energy counter is passed through
    /// unchanged so test runs do not disturb billing.
    pub fn sample(&self, now: Instant, start: Instant, energy_kwh: f32) -> Sample {
        let voltage = self.voltage(now, start);
        Sample {
            voltage,
            current: self.config.current,
            power: voltage * self.config.current,
            energy_kwh,
            power_factor: self.config.power_factor,
            timestamp: now,
        }
    }
}

/// Edge detector for phase changes, for logging and display only.
#[derive(Debug, Default)]
pub struct PhaseTracker {
    last: Option<SignalPhase>,
}

impl PhaseTracker {
    /// Returns the new phase when it differs from the previous call.
    pub fn update(&mut self, phase: SignalPhase) -> Option<SignalPhase> {
        let changed = self.last != Some(phase);
        self.last = Some(phase);
        changed.then_some(phase)
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
