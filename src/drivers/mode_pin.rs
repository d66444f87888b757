//! Test-mode jumper input.
//!
//! Active-low with pull-up: strapping the pin to GND selects test mode,
//! leaving it floating (pulled HIGH) selects normal mode.  The pin is
//! sampled once per tick; there is no debounce because the monitor only
//! reacts to a level that differs from the current mode.

use embedded_hal::digital::InputPin;
use log::warn;

use crate::monitor::MonitorMode;

pub struct ModePin<P> {
    pin: P,
}

impl<P: InputPin> ModePin<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Mode selected by the pin level, or `None` if the read failed.
    pub fn read(&mut self) -> Option<MonitorMode> {
        match self.pin.is_low() {
            Ok(true) => Some(MonitorMode::Test),
            Ok(false) => Some(MonitorMode::Normal),
            Err(_) => {
                warn!("Mode pin read failed, keeping current mode");
                None
            }
        }
    }
}
