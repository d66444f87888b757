//! Load relay and alarm buzzer.
//!
//! The relay is wired normally-open on the load side: HIGH energises the
//! coil and powers the load, LOW cuts it.  The buzzer sounds while HIGH.
//!
//! The driver remembers its logical state and only touches the pins on a
//! change, so a cutoff restated every tick never toggles the relay coil.
//!
//! ## Dual-target design
//!
//! Generic over `embedded_hal` output pins: ESP-IDF `PinDriver`s on
//! target, recording mock pins in host tests.

use embedded_hal::digital::OutputPin;
use log::{info, warn};

use crate::error::{self, ActuatorError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutoffState {
    /// Load energised, buzzer silent.
    Restored,
    /// Load cut, buzzer sounding.
    Cut,
}

pub struct CutoffDriver<R, B> {
    relay: R,
    buzzer: B,
    state: CutoffState,
}

impl<R: OutputPin, B: OutputPin> CutoffDriver<R, B> {
    /// Take the pins and drive the safe state (load on, buzzer off).
    pub fn new(relay: R, buzzer: B) -> Self {
        let mut driver = Self {
            relay,
            buzzer,
            state: CutoffState::Restored,
        };
        driver.drive(CutoffState::Restored);
        driver
    }

    /// Cut the load and sound the buzzer.  No-op if already cut.
    pub fn cut(&mut self) {
        if self.state == CutoffState::Cut {
            return;
        }
        self.drive(CutoffState::Cut);
        self.state = CutoffState::Cut;
        warn!("Cutoff: load de-energised, buzzer on");
    }

    /// Re-energise the load and silence the buzzer.  No-op if already restored.
    pub fn restore(&mut self) {
        if self.state == CutoffState::Restored {
            return;
        }
        self.drive(CutoffState::Restored);
        self.state = CutoffState::Restored;
        info!("Cutoff: load restored, buzzer off");
    }

    pub fn state(&self) -> CutoffState {
        self.state
    }

    pub fn is_cut(&self) -> bool {
        self.state == CutoffState::Cut
    }

    /// Hand the pins back (tests inspect recorded writes).
    pub fn release(self) -> (R, B) {
        (self.relay, self.buzzer)
    }

    /// Write both pins, logging a failed write.  The logical state still
    /// follows `target`, so the next change retries the pins.
    fn drive(&mut self, target: CutoffState) {
        if let Err(e) = self.write_pins(target) {
            warn!("Cutoff: {}", e);
        }
    }

    /// Both pins are written even when the relay write fails.
    fn write_pins(&mut self, target: CutoffState) -> error::Result<()> {
        let (relay, buzzer) = match target {
            CutoffState::Restored => (self.relay.set_high(), self.buzzer.set_low()),
            CutoffState::Cut => (self.relay.set_low(), self.buzzer.set_high()),
        };
        relay.map_err(|_| ActuatorError::RelayWriteFailed)?;
        buzzer.map_err(|_| ActuatorError::BuzzerWriteFailed)?;
        Ok(())
    }
}
