//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the energy meter, the relay/buzzer driver, and the optional mode
//! jumper, exposing them through [`SampleSource`], [`CutoffActuator`] and
//! [`ModeInput`].  This is the only module in the system that touches
//! actual hardware.  On non-espidf targets the meter uses its cfg-gated
//! simulation and the pins are whatever `embedded_hal` mocks the caller
//! supplies.

use embedded_hal::digital::{InputPin, OutputPin};
use log::{info, warn};

use crate::app::ports::{CutoffActuator, ModeInput, SampleSource};
use crate::drivers::cutoff::CutoffDriver;
use crate::drivers::mode_pin::ModePin;
use crate::monitor::{MonitorMode, Sample};
use crate::sensors::pzem::PzemSensor;
use crate::sensors::to_sample;
use crate::time::Instant;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<R, B, P> {
    meter: PzemSensor,
    cutoff: CutoffDriver<R, B>,
    mode_pin: Option<ModePin<P>>,
    /// Last good reading, reported again while the meter is silent.
    last_good: Option<Sample>,
    consecutive_failures: u32,
}

impl<R: OutputPin, B: OutputPin, P: InputPin> HardwareAdapter<R, B, P> {
    pub fn new(meter: PzemSensor, cutoff: CutoffDriver<R, B>, mode_pin: Option<ModePin<P>>) -> Self {
        Self {
            meter,
            cutoff,
            mode_pin,
            last_good: None,
            consecutive_failures: 0,
        }
    }

    /// Meter reads that failed in a row (0 after any success).
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn cutoff(&self) -> &CutoffDriver<R, B> {
        &self.cutoff
    }
}

// ── SampleSource implementation ───────────────────────────────

impl<R: OutputPin, B: OutputPin, P: InputPin> SampleSource for HardwareAdapter<R, B, P> {
    fn read(&mut self, now: Instant) -> Sample {
        match self.meter.read() {
            Ok(reading) => {
                if self.consecutive_failures > 0 {
                    info!(
                        "Meter back online after {} failed reads",
                        self.consecutive_failures
                    );
                }
                self.consecutive_failures = 0;
                if reading.alarm {
                    warn!("Meter power alarm flag set ({:.1} W)", reading.power);
                }
                let sample = to_sample(&reading, now);
                self.last_good = Some(sample);
                sample
            }
            Err(e) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                // Log the first failure and then every 12th (one per minute
                // at the default tick) to keep the console readable.
                if self.consecutive_failures % 12 == 1 {
                    warn!(
                        "Meter 0x{:02X} read failed: {} ({} in a row), reusing last sample",
                        self.meter.address(),
                        e,
                        self.consecutive_failures
                    );
                }
                self.last_good
                    .map_or_else(|| unavailable(now), |s| s.restamped(now))
            }
        }
    }
}

/// Placeholder before the first good read.  NaN never breaches a limit,
/// so a meter that is dead from boot cannot trigger a cutoff.
fn unavailable(now: Instant) -> Sample {
    Sample {
        voltage: f32::NAN,
        current: f32::NAN,
        power: f32::NAN,
        energy_kwh: 0.0,
        power_factor: f32::NAN,
        timestamp: now,
    }
}

// ── CutoffActuator implementation ─────────────────────────────

impl<R: OutputPin, B: OutputPin, P: InputPin> CutoffActuator for HardwareAdapter<R, B, P> {
    fn cut(&mut self) {
        self.cutoff.cut();
    }

    fn restore(&mut self) {
        self.cutoff.restore();
    }

    fn is_cut(&self) -> bool {
        self.cutoff.is_cut()
    }
}

// ── ModeInput implementation ──────────────────────────────────

impl<R: OutputPin, B: OutputPin, P: InputPin> ModeInput for HardwareAdapter<R, B, P> {
    fn requested_mode(&mut self) -> Option<MonitorMode> {
        self.mode_pin.as_mut().and_then(ModePin::read)
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
