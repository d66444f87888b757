//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the condition monitor, the test signal, the bill
//! reminder, and the tariff.  It exposes a clean, hardware-agnostic API.
//! All I/O flows through port traits injected at call sites, making the
//! entire service testable with mock adapters.
//!
//! ```text
//!  SampleSource ──▶ ┌─────────────────────────┐ ──▶ EventSink
//!     ModeInput ──▶ │       AppService        │ ──▶ DisplayPort
//!                   │ Monitor · Signal · Cost │ ──▶ TelemetrySink
//! CutoffActuator ◀──└─────────────────────────┘ ──▶ Notifier
//! ```

use log::{debug, info, warn};

use crate::config::SystemConfig;
use crate::error::{ConfigError, Error};
use crate::monitor::{Action, ActionSet, ConditionMonitor, MonitorMode, Sample};
use crate::reminder::{ReminderTimer, reminder_text};
use crate::signal::{PhaseTracker, TestSignalGenerator};
use crate::tariff;
use crate::time::Instant;

use super::commands::AppCommand;
use super::events::{AppEvent, TelemetryData};
use super::ports::{
    CutoffActuator, DisplayPort, EventSink, ModeInput, Notifier, SampleSource, TelemetrySink,
};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    monitor: ConditionMonitor,
    generator: TestSignalGenerator,
    phase: PhaseTracker,
    /// Start of the current test run; the signal cycle is measured from here.
    test_start: Instant,
    reminder: ReminderTimer,
    tariff_rate: f32,
    /// Energy counter from the last real meter reading.  Held while the
    /// test signal is playing.
    last_energy_kwh: f32,
    last_sample: Sample,
    last_cost: f32,
    tick_count: u64,
}

impl AppService {
    /// Construct the service from configuration.  `boot` arms the bill
    /// reminder, so the first reminder goes out one interval after boot.
    pub fn new(config: &SystemConfig, boot: Instant) -> Self {
        Self {
            monitor: ConditionMonitor::from_config(config),
            generator: TestSignalGenerator::new(config.test_signal),
            phase: PhaseTracker::default(),
            test_start: boot,
            reminder: ReminderTimer::new(config.reminder_interval(), boot),
            tariff_rate: config.initial_tariff_rate,
            last_energy_kwh: 0.0,
            last_sample: Sample::default(),
            last_cost: 0.0,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started(self.monitor.mode()));
        info!(
            "AppService started in {:?} mode (Ft={:.4})",
            self.monitor.mode(),
            self.tariff_rate
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full cycle: mode pin → sample → cost → monitor → actuators
    /// → telemetry → display → reminder.
    ///
    /// Remote commands must be applied with [`handle_command`] before this
    /// call so the pin, read here, wins when both disagree.
    ///
    /// The `hw` parameter satisfies [`SampleSource`], [`CutoffActuator`]
    /// and [`ModeInput`] in one borrow.  `sink` does the same for the
    /// three output ports.
    ///
    /// [`handle_command`]: Self::handle_command
    pub fn tick(
        &mut self,
        now: Instant,
        hw: &mut (impl SampleSource + CutoffActuator + ModeInput),
        notifier: &mut impl Notifier,
        sink: &mut (impl EventSink + DisplayPort + TelemetrySink),
    ) {
        self.tick_count += 1;

        // 1. Physical mode selector
        if let Some(requested) = hw.requested_mode() {
            self.set_mode(requested, now, hw, sink);
        }

        // 2. Sample: live meter or synthetic test signal
        let sample = match self.monitor.mode() {
            MonitorMode::Normal => {
                let sample = hw.read(now);
                self.last_energy_kwh = sample.energy_kwh;
                sample
            }
            MonitorMode::Test => {
                let phase = self.generator.phase(now, self.test_start);
                if let Some(changed) = self.phase.update(phase) {
                    sink.emit(&AppEvent::TestPhaseChanged(changed));
                }
                self.generator
                    .sample(now, self.test_start, self.last_energy_kwh)
            }
        };

        // 3. Bill
        let cost = tariff::cost(sample.energy_kwh, self.tariff_rate);
        self.last_sample = sample;
        self.last_cost = cost;

        // 4. Monitor
        let actions = self.monitor.evaluate(&sample, now);

        // 5. Apply actions via ports
        self.apply_actions(&actions, hw, Some(&mut *notifier), sink);

        // 6. Telemetry
        sink.publish(&self.build_telemetry(hw.is_cut()));

        // 7. Display
        match self.monitor.mode() {
            MonitorMode::Normal => sink.show_reading(cost, sample.energy_kwh),
            MonitorMode::Test => {
                sink.show_test_phase(self.generator.phase(now, self.test_start))
            }
        }

        // 8. Bill reminder (normal mode only)
        if self.monitor.mode() == MonitorMode::Normal && self.reminder.poll(now) {
            let delivered = notifier.send(&reminder_text(cost));
            if !delivered {
                warn!("Bill reminder not delivered, next attempt in one interval");
            }
            sink.emit(&AppEvent::ReminderSent { delivered });
        }

        debug!(
            "tick {}: V={:.1} I={:.2} E={:.3} cost={:.2}",
            self.tick_count, sample.voltage, sample.current, sample.energy_kwh, cost
        );
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (remote console, dashboard).
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        now: Instant,
        hw: &mut impl CutoffActuator,
        sink: &mut impl EventSink,
    ) -> Result<(), Error> {
        match cmd {
            AppCommand::SetMode(mode) => {
                self.set_mode(mode, now, hw, sink);
                Ok(())
            }
            AppCommand::SetTariffRate(rate) => {
                self.set_tariff_rate(rate, sink)?;
                Ok(())
            }
        }
    }

    /// Replace the Ft rate.  Non-finite values are rejected and the
    /// previous rate kept.
    pub fn set_tariff_rate(
        &mut self,
        rate: f32,
        sink: &mut impl EventSink,
    ) -> Result<(), ConfigError> {
        if !rate.is_finite() {
            warn!("Rejected tariff rate {rate}, keeping {:.4}", self.tariff_rate);
            return Err(ConfigError::InvalidTariffRate);
        }
        self.tariff_rate = rate;
        sink.emit(&AppEvent::TariffRateChanged(rate));
        info!("Ft rate set to {rate:.4}");
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a telemetry snapshot from the last tick.
    pub fn build_telemetry(&self, cut: bool) -> TelemetryData {
        let s = &self.last_sample;
        TelemetryData {
            mode: self.monitor.mode(),
            voltage: s.voltage,
            current: s.current,
            power: s.power,
            energy_kwh: s.energy_kwh,
            power_factor: s.power_factor,
            cost: self.last_cost,
            tariff_rate: self.tariff_rate,
            active_conditions: self.monitor.active_mask(),
            cut,
        }
    }

    pub fn mode(&self) -> MonitorMode {
        self.monitor.mode()
    }

    pub fn monitor(&self) -> &ConditionMonitor {
        &self.monitor
    }

    pub fn tariff_rate(&self) -> f32 {
        self.tariff_rate
    }

    /// Sample taken on the last tick.
    pub fn last_sample(&self) -> &Sample {
        &self.last_sample
    }

    /// Bill computed on the last tick.
    pub fn last_cost(&self) -> f32 {
        self.last_cost
    }

    // ── Internal ──────────────────────────────────────────────

    /// Switch mode if `mode` differs from the current one.  The pin is
    /// polled every tick, so repeats of the current mode are ignored.
    fn set_mode(
        &mut self,
        mode: MonitorMode,
        now: Instant,
        hw: &mut impl CutoffActuator,
        sink: &mut impl EventSink,
    ) {
        let from = self.monitor.mode();
        if mode == from {
            return;
        }
        let actions = self.monitor.set_mode(mode);
        if mode == MonitorMode::Test {
            self.test_start = now;
            self.phase.reset();
        }
        sink.emit(&AppEvent::ModeChanged { from, to: mode });
        self.apply_actions(&actions, hw, None::<&mut NoNotifier>, sink);
    }

    /// Translate monitor actions into port calls.
    fn apply_actions<N: Notifier>(
        &self,
        actions: &ActionSet,
        hw: &mut impl CutoffActuator,
        mut notifier: Option<&mut N>,
        sink: &mut impl EventSink,
    ) {
        for action in actions {
            match action {
                Action::Log(kind, transition) => sink.emit(&AppEvent::Condition {
                    kind: *kind,
                    transition: *transition,
                }),
                Action::Cutoff => {
                    let was_cut = hw.is_cut();
                    hw.cut();
                    if !was_cut {
                        sink.emit(&AppEvent::CutoffEngaged);
                    }
                }
                Action::Restore => {
                    let was_cut = hw.is_cut();
                    hw.restore();
                    if was_cut {
                        sink.emit(&AppEvent::PowerRestored);
                    }
                }
                Action::Notify(text) => {
                    let delivered = notifier
                        .as_deref_mut()
                        .is_some_and(|n| n.send(text.as_str()));
                    if !delivered {
                        warn!("Alert not delivered: {}", text.as_str());
                        sink.emit(&AppEvent::NotificationFailed);
                    }
                }
            }
        }
    }
}

/// Placeholder notifier type for action sets that carry no alerts.
enum NoNotifier {}

impl Notifier for NoNotifier {
    fn send(&mut self, _message: &str) -> bool {
        match *self {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::{ConditionKind, Transition};
    use crate::signal::SignalPhase;

    #[derive(Default)]
    struct FakeHw {
        sample: Sample,
        pin: Option<MonitorMode>,
        cut: bool,
        reads: u32,
    }

    impl SampleSource for FakeHw {
        fn read(&mut self, now: Instant) -> Sample {
            self.reads += 1;
            self.sample.restamped(now)
        }
    }

    impl CutoffActuator for FakeHw {
        fn cut(&mut self) {
            self.cut = true;
        }
        fn restore(&mut self) {
            self.cut = false;
        }
        fn is_cut(&self) -> bool {
            self.cut
        }
    }

    impl ModeInput for FakeHw {
        fn requested_mode(&mut self) -> Option<MonitorMode> {
            self.pin
        }
    }

    #[derive(Default)]
    struct Outbox {
        sent: Vec<String>,
        offline: bool,
    }

    impl Notifier for Outbox {
        fn send(&mut self, message: &str) -> bool {
            self.sent.push(message.to_string());
            !self.offline
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<AppEvent>,
        readings: Vec<(f32, f32)>,
        phases: Vec<SignalPhase>,
        telemetry: Vec<TelemetryData>,
    }

    impl EventSink for Recorder {
        fn emit(&mut self, event: &AppEvent) {
            self.events.push(event.clone());
        }
    }

    impl DisplayPort for Recorder {
        fn show_reading(&mut self, cost: f32, energy_kwh: f32) {
            self.readings.push((cost, energy_kwh));
        }
        fn show_test_phase(&mut self, phase: SignalPhase) {
            self.phases.push(phase);
        }
    }

    impl TelemetrySink for Recorder {
        fn publish(&mut self, data: &TelemetryData) {
            self.telemetry.push(*data);
        }
    }

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    fn nominal() -> Sample {
        Sample {
            voltage: 230.0,
            current: 1.0,
            power: 230.0,
            energy_kwh: 100.0,
            power_factor: 1.0,
            timestamp: Instant::ZERO,
        }
    }

    fn make_app() -> AppService {
        AppService::new(&SystemConfig::default(), Instant::ZERO)
    }

    #[test]
    fn normal_tick_reads_meter_and_shows_cost() {
        let mut app = make_app();
        let mut hw = FakeHw {
            sample: nominal(),
            ..Default::default()
        };
        let mut out = Outbox::default();
        let mut rec = Recorder::default();

        app.tick(at(5_000), &mut hw, &mut out, &mut rec);

        assert_eq!(hw.reads, 1);
        assert_eq!(rec.readings.len(), 1);
        let (cost, energy) = rec.readings[0];
        assert_eq!(energy, 100.0);
        assert!((cost - 355.0).abs() < 1e-3);
        assert_eq!(rec.telemetry.len(), 1);
        assert!(!hw.cut);
    }

    #[test]
    fn test_mode_uses_generator_and_holds_energy() {
        let mut app = make_app();
        let mut hw = FakeHw {
            sample: nominal(),
            ..Default::default()
        };
        let mut out = Outbox::default();
        let mut rec = Recorder::default();

        app.tick(at(1_000), &mut hw, &mut out, &mut rec);
        hw.pin = Some(MonitorMode::Test);
        hw.sample.energy_kwh = 999.0;
        app.tick(at(2_000), &mut hw, &mut out, &mut rec);

        assert_eq!(hw.reads, 1, "meter is not read in test mode");
        let s = app.last_sample();
        assert_eq!(s.voltage, 230.0);
        assert_eq!(s.energy_kwh, 100.0);
        assert!((s.power - 230.0 * 2.5).abs() < 1e-3);
        assert_eq!(rec.phases, vec![SignalPhase::Normal]);
    }

    #[test]
    fn test_mode_cuts_on_fault_phase_and_restores() {
        let mut app = make_app();
        let mut hw = FakeHw {
            pin: Some(MonitorMode::Test),
            ..Default::default()
        };
        let mut out = Outbox::default();
        let mut rec = Recorder::default();

        // Test run starts at t=0 ms.
        app.tick(at(0), &mut hw, &mut out, &mut rec);
        assert!(!hw.cut);
        app.tick(at(5_000), &mut hw, &mut out, &mut rec);
        assert!(hw.cut, "200 V breaches the low limit with zero dwell");
        assert_eq!(out.sent.len(), 1);
        assert!(out.sent[0].contains("TEST MODE"));

        app.tick(at(10_000), &mut hw, &mut out, &mut rec);
        assert!(!hw.cut, "next cycle returns to 230 V");
        assert!(rec.events.contains(&AppEvent::CutoffEngaged));
        assert!(rec.events.contains(&AppEvent::PowerRestored));
    }

    #[test]
    fn pin_overrides_remote_request_on_same_tick() {
        let mut app = make_app();
        let mut hw = FakeHw {
            sample: nominal(),
            pin: Some(MonitorMode::Normal),
            ..Default::default()
        };
        let mut out = Outbox::default();
        let mut rec = Recorder::default();

        app.handle_command(AppCommand::SetMode(MonitorMode::Test), at(0), &mut hw, &mut rec)
            .unwrap();
        assert_eq!(app.mode(), MonitorMode::Test);
        app.tick(at(0), &mut hw, &mut out, &mut rec);
        assert_eq!(app.mode(), MonitorMode::Normal);
    }

    #[test]
    fn repeated_pin_level_does_not_reset_monitor() {
        let mut app = make_app();
        let mut hw = FakeHw {
            sample: Sample {
                voltage: 200.0,
                ..nominal()
            },
            pin: Some(MonitorMode::Normal),
            ..Default::default()
        };
        let mut out = Outbox::default();
        let mut rec = Recorder::default();

        app.tick(at(0), &mut hw, &mut out, &mut rec);
        app.tick(at(300_000), &mut hw, &mut out, &mut rec);
        app.tick(at(600_000), &mut hw, &mut out, &mut rec);
        assert!(hw.cut);
        assert_eq!(
            app.monitor().state(ConditionKind::LowVoltage).active_since(),
            Some(at(0))
        );
    }

    #[test]
    fn mode_change_emits_event_and_restores_power() {
        let mut app = make_app();
        let mut hw = FakeHw {
            cut: true,
            ..Default::default()
        };
        let mut rec = Recorder::default();

        app.handle_command(AppCommand::SetMode(MonitorMode::Test), at(0), &mut hw, &mut rec)
            .unwrap();
        assert!(!hw.cut);
        assert_eq!(
            rec.events,
            vec![
                AppEvent::ModeChanged {
                    from: MonitorMode::Normal,
                    to: MonitorMode::Test
                },
                AppEvent::PowerRestored,
            ]
        );
    }

    #[test]
    fn non_finite_tariff_rate_is_rejected() {
        let mut app = make_app();
        let mut hw = FakeHw::default();
        let mut rec = Recorder::default();

        let err = app.handle_command(AppCommand::SetTariffRate(f32::NAN), at(0), &mut hw, &mut rec);
        assert_eq!(err, Err(Error::Config(ConfigError::InvalidTariffRate)));
        assert_eq!(app.tariff_rate(), 0.30);

        app.handle_command(AppCommand::SetTariffRate(-0.1), at(0), &mut hw, &mut rec)
            .unwrap();
        assert_eq!(app.tariff_rate(), -0.1);
        assert_eq!(rec.events, vec![AppEvent::TariffRateChanged(-0.1)]);
    }

    #[test]
    fn reminder_fires_once_per_interval_even_when_undelivered() {
        let mut app = make_app();
        let mut hw = FakeHw {
            sample: nominal(),
            ..Default::default()
        };
        let mut out = Outbox {
            offline: true,
            ..Default::default()
        };
        let mut rec = Recorder::default();

        for t in (0..=1_200_000).step_by(5_000) {
            app.tick(at(t), &mut hw, &mut out, &mut rec);
        }
        assert_eq!(out.sent.len(), 2);
        assert!(out.sent[0].contains("355.00 บาท"));
        let reminders = rec
            .events
            .iter()
            .filter(|e| matches!(e, AppEvent::ReminderSent { delivered: false }))
            .count();
        assert_eq!(reminders, 2);
    }

    #[test]
    fn failed_alert_is_reported() {
        let mut app = make_app();
        let mut hw = FakeHw {
            pin: Some(MonitorMode::Test),
            sample: nominal(),
            ..Default::default()
        };
        let mut out = Outbox {
            offline: true,
            ..Default::default()
        };
        let mut rec = Recorder::default();

        app.tick(at(0), &mut hw, &mut out, &mut rec);
        app.tick(at(6_000), &mut hw, &mut out, &mut rec);
        assert!(hw.cut, "cutoff does not wait for delivery");
        assert!(rec.events.contains(&AppEvent::NotificationFailed));
        assert!(rec.events.contains(&AppEvent::Condition {
            kind: ConditionKind::LowVoltage,
            transition: Transition::Onset,
        }));
    }
}
