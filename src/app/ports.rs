//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (meter, relay, notifier, sinks) implement these
//! traits.  The [`AppService`](super::service::AppService) consumes them
//! via generics, so the domain core never touches hardware directly.

use crate::monitor::{MonitorMode, Sample};
use crate::signal::SignalPhase;
use crate::time::Instant;

use super::events::{AppEvent, TelemetryData};

// ───────────────────────────────────────────────────────────────
// Sample source (driven adapter: meter → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: one measurement per tick.
pub trait SampleSource {
    /// Read the meter.  On a hardware fault the adapter returns stale or
    /// zero values rather than an error; the core does not retry.
    fn read(&mut self, now: Instant) -> Sample;
}

// ───────────────────────────────────────────────────────────────
// Cutoff actuator (driven adapter: domain → relay + buzzer)
// ───────────────────────────────────────────────────────────────

/// Binary power cutoff.  Both commands are idempotent.
pub trait CutoffActuator {
    /// Cut the load and sound the buzzer.
    fn cut(&mut self);

    /// Restore the load and silence the buzzer.
    fn restore(&mut self);

    /// Whether the load is currently cut.
    fn is_cut(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Mode input (driven adapter: jumper pin → domain)
// ───────────────────────────────────────────────────────────────

/// Physical mode selector, polled once per tick.
pub trait ModeInput {
    /// Mode requested by the input, or `None` if there is no input or it
    /// could not be read.
    fn requested_mode(&mut self) -> Option<MonitorMode>;
}

// ───────────────────────────────────────────────────────────────
// Notifier (driven adapter: domain → email / webhook)
// ───────────────────────────────────────────────────────────────

/// Best-effort outbound message.
pub trait Notifier {
    /// Send `message`.  Returns whether the transport accepted it.
    /// Must not retry internally.
    fn send(&mut self, message: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Event sink (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Display (driven adapter: domain → screen)
// ───────────────────────────────────────────────────────────────

/// Front-panel display, refreshed once per tick.
pub trait DisplayPort {
    /// Normal mode: running cost and energy counter.
    fn show_reading(&mut self, cost: f32, energy_kwh: f32);

    /// Test mode: which half of the test waveform is playing.
    fn show_test_phase(&mut self, phase: SignalPhase);
}

// ───────────────────────────────────────────────────────────────
// Telemetry (driven adapter: domain → dashboard)
// ───────────────────────────────────────────────────────────────

/// Push-only dashboard feed, once per tick.
pub trait TelemetrySink {
    fn publish(&mut self, data: &TelemetryData);
}
