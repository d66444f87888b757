//! Monotonic clock for the control loop.
//!
//! On target the millisecond count comes from the ESP-IDF high-resolution
//! timer (`esp_timer_get_time`, microseconds since boot).  On host it is
//! measured from the moment the adapter was created, so simulations start
//! at [`Instant::ZERO`].

use crate::time::Instant;

/// Source of [`Instant`]s for the control loop.
#[derive(Debug)]
pub struct Esp32TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    origin: std::time::Instant,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            origin: std::time::Instant::now(),
        }
    }

    pub fn now(&self) -> Instant {
        Instant::from_millis(self.uptime_ms())
    }

    #[cfg(target_os = "espidf")]
    fn uptime_ms(&self) -> u64 {
        // SAFETY: reads a free-running counter; no shared state is touched.
        let us = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
        u64::try_from(us).unwrap_or(0) / 1_000
    }

    #[cfg(not(target_os = "espidf"))]
    fn uptime_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}
