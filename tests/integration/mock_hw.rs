//! Mock adapters for integration tests.
//!
//! Records every port call so tests can assert on the full command
//! history without touching real GPIO or UART registers.

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use energymon::app::events::{AppEvent, TelemetryData};
use energymon::app::ports::{
    CutoffActuator, DisplayPort, EventSink, ModeInput, Notifier, SampleSource, TelemetrySink,
};
use energymon::monitor::{MonitorMode, Sample};
use energymon::signal::SignalPhase;
use energymon::time::Instant;

// ── Cutoff call record ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutoffCall {
    Cut,
    Restore,
}

// ── MockHardware ──────────────────────────────────────────────

/// Meter, relay and jumper in one, like the real adapter.
pub struct MockHardware {
    pub sample: Sample,
    pub pin: Option<MonitorMode>,
    pub calls: Vec<CutoffCall>,
    pub reads: u32,
    cut: bool,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            sample: nominal(),
            pin: None,
            calls: Vec::new(),
            reads: 0,
            cut: false,
        }
    }

    pub fn set_voltage(&mut self, voltage: f32) {
        self.sample.voltage = voltage;
    }

    pub fn set_current(&mut self, current: f32) {
        self.sample.current = current;
    }

    pub fn is_cut_now(&self) -> bool {
        self.cut
    }

    pub fn cut_count(&self) -> usize {
        self.calls.iter().filter(|c| **c == CutoffCall::Cut).count()
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleSource for MockHardware {
    fn read(&mut self, now: Instant) -> Sample {
        self.reads += 1;
        self.sample.restamped(now)
    }
}

impl CutoffActuator for MockHardware {
    fn cut(&mut self) {
        self.calls.push(CutoffCall::Cut);
        self.cut = true;
    }

    fn restore(&mut self) {
        self.calls.push(CutoffCall::Restore);
        self.cut = false;
    }

    fn is_cut(&self) -> bool {
        self.cut
    }
}

impl ModeInput for MockHardware {
    fn requested_mode(&mut self) -> Option<MonitorMode> {
        self.pin
    }
}

/// 230 V, 1 A, 100 kWh on the counter.
pub fn nominal() -> Sample {
    Sample {
        voltage: 230.0,
        current: 1.0,
        power: 230.0,
        energy_kwh: 100.0,
        power_factor: 1.0,
        timestamp: Instant::ZERO,
    }
}

// ── MockNotifier ──────────────────────────────────────────────

pub struct MockNotifier {
    pub sent: Vec<String>,
    pub online: bool,
}

#[allow(dead_code)]
impl MockNotifier {
    pub fn new() -> Self {
        Self {
            sent: Vec::new(),
            online: true,
        }
    }

    pub fn offline() -> Self {
        Self {
            sent: Vec::new(),
            online: false,
        }
    }

    pub fn reminders(&self) -> usize {
        self.sent.iter().filter(|m| m.contains("Reminder")).count()
    }

    pub fn alerts(&self) -> usize {
        self.sent.iter().filter(|m| m.starts_with('\u{1F6A8}')).count()
    }
}

impl Notifier for MockNotifier {
    fn send(&mut self, message: &str) -> bool {
        self.sent.push(message.to_string());
        self.online
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayCall {
    Reading { cost: f32, energy_kwh: f32 },
    TestPhase(SignalPhase),
}

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
    pub display: Vec<DisplayCall>,
    pub telemetry: Vec<TelemetryData>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

impl DisplayPort for RecordingSink {
    fn show_reading(&mut self, cost: f32, energy_kwh: f32) {
        self.display.push(DisplayCall::Reading { cost, energy_kwh });
    }

    fn show_test_phase(&mut self, phase: SignalPhase) {
        self.display.push(DisplayCall::TestPhase(phase));
    }
}

impl TelemetrySink for RecordingSink {
    fn publish(&mut self, data: &TelemetryData) {
        self.telemetry.push(*data);
    }
}

// ── embedded-hal pins ─────────────────────────────────────────

/// Output pin whose level is observable after it is moved into a driver.
#[derive(Clone, Default)]
pub struct SharedOutPin(pub Rc<Cell<Option<bool>>>);

impl ErrorType for SharedOutPin {
    type Error = Infallible;
}

impl OutputPin for SharedOutPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set(Some(false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set(Some(true));
        Ok(())
    }
}

/// Input pin whose level the test can change after it is moved.
#[derive(Clone, Default)]
pub struct SharedInPin(pub Rc<Cell<bool>>);

impl ErrorType for SharedInPin {
    type Error = Infallible;
}

impl InputPin for SharedInPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0.get())
    }
}
