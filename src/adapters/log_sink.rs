//! Log-based sink adapter.
//!
//! Implements [`EventSink`], [`DisplayPort`] and [`TelemetrySink`] by
//! writing to the ESP-IDF logger (which goes to UART / USB-CDC in
//! production).  A panel driver or dashboard client would implement the
//! same traits.

use log::{debug, error, info, warn};

use crate::app::events::{AppEvent, TelemetryData};
use crate::app::ports::{DisplayPort, EventSink, TelemetrySink};
use crate::monitor::Transition;
use crate::signal::SignalPhase;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink {
    /// Last line shown on the (virtual) display, to avoid repeating it.
    last_display: Option<heapless::String<48>>,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn show(&mut self, line: heapless::String<48>) {
        if self.last_display.as_ref() == Some(&line) {
            return;
        }
        info!("DISPLAY | {}", line);
        self.last_display = Some(line);
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                debug!(
                    "TELEM | mode={:?} | V={:.1} I={:.2} P={:.1}W E={:.3}kWh PF={:.2} | \
                     cost={:.2} Ft={:.4} | active=0b{:03b} | cut={}",
                    t.mode,
                    t.voltage,
                    t.current,
                    t.power,
                    t.energy_kwh,
                    t.power_factor,
                    t.cost,
                    t.tariff_rate,
                    t.active_conditions,
                    t.cut,
                );
            }
            AppEvent::Condition { kind, transition } => match transition {
                Transition::Onset => warn!("CONDITION | {} onset", kind),
                Transition::Recovered => info!("CONDITION | {} recovered", kind),
            },
            AppEvent::CutoffEngaged => error!("CUTOFF | load disconnected"),
            AppEvent::PowerRestored => info!("CUTOFF | load restored"),
            AppEvent::ModeChanged { from, to } => {
                info!("MODE | {:?} -> {:?}", from, to);
            }
            AppEvent::TestPhaseChanged(phase) => info!("TEST | phase {}", phase),
            AppEvent::TariffRateChanged(rate) => info!("TARIFF | Ft={:.4}", rate),
            AppEvent::NotificationFailed => warn!("NOTIFY | alert not delivered"),
            AppEvent::ReminderSent { delivered } => {
                info!("REMINDER | delivered={}", delivered);
            }
            AppEvent::Started(mode) => {
                info!("START | initial_mode={:?}", mode);
            }
        }
    }
}

impl DisplayPort for LogEventSink {
    fn show_reading(&mut self, cost: f32, energy_kwh: f32) {
        let mut line = heapless::String::new();
        // Overflow truncates the line.
        let _ = core::fmt::write(
            &mut line,
            format_args!("Cost {:.2} THB | {:.2} kWh", cost, energy_kwh),
        );
        self.show(line);
    }

    fn show_test_phase(&mut self, phase: SignalPhase) {
        let mut line = heapless::String::new();
        let _ = core::fmt::write(&mut line, format_args!("TEST MODE | {}", phase));
        self.show(line);
    }
}

impl TelemetrySink for LogEventSink {
    fn publish(&mut self, data: &TelemetryData) {
        self.emit(&AppEvent::Telemetry(*data));
    }
}
