//! Integration tests for the AppService → monitor → ports pipeline.
//!
//! These run on the host (x86_64) and drive the service tick by tick with
//! a mock clock, verifying the cutoff, notification, mode, and reminder
//! behaviour end to end.

use super::mock_hw::{CutoffCall, DisplayCall, MockHardware, MockNotifier, RecordingSink};

use energymon::app::commands::AppCommand;
use energymon::app::events::AppEvent;
use energymon::app::service::AppService;
use energymon::config::SystemConfig;
use energymon::monitor::{ConditionKind, MonitorMode, Transition};
use energymon::signal::SignalPhase;
use energymon::time::Instant;

const TICK_MS: u64 = 5_000;
const DWELL_MS: u64 = 600_000;

struct Rig {
    app: AppService,
    hw: MockHardware,
    notifier: MockNotifier,
    sink: RecordingSink,
}

impl Rig {
    fn new() -> Self {
        let mut app = AppService::new(&SystemConfig::default(), Instant::ZERO);
        let mut sink = RecordingSink::new();
        app.start(&mut sink);
        Self {
            app,
            hw: MockHardware::new(),
            notifier: MockNotifier::new(),
            sink,
        }
    }

    fn tick(&mut self, ms: u64) {
        self.app.tick(
            Instant::from_millis(ms),
            &mut self.hw,
            &mut self.notifier,
            &mut self.sink,
        );
    }

    /// Tick every 5 s over `[from, to]`.
    fn run(&mut self, from: u64, to: u64) {
        let mut t = from;
        while t <= to {
            self.tick(t);
            t += TICK_MS;
        }
    }

    fn command(&mut self, cmd: AppCommand, ms: u64) {
        self.app
            .handle_command(cmd, Instant::from_millis(ms), &mut self.hw, &mut self.sink)
            .expect("command accepted");
    }
}

// ── Dwell and cutoff ──────────────────────────────────────────

#[test]
fn sustained_low_voltage_cuts_after_ten_minutes() {
    let mut rig = Rig::new();
    rig.hw.set_voltage(205.0);

    rig.run(0, DWELL_MS - TICK_MS);
    assert!(!rig.hw.is_cut_now(), "no cutoff before the dwell elapses");
    assert_eq!(rig.notifier.alerts(), 0);

    rig.tick(DWELL_MS);
    assert!(rig.hw.is_cut_now());
    assert_eq!(rig.notifier.alerts(), 1);
    assert!(rig.notifier.sent[0].contains("Voltage DROP lasted over 10 minutes"));
}

#[test]
fn alert_is_sent_once_but_cutoff_is_restated() {
    let mut rig = Rig::new();
    rig.hw.set_current(15.0);

    rig.run(0, DWELL_MS + 10 * TICK_MS);
    assert_eq!(rig.notifier.alerts(), 1);
    assert_eq!(rig.hw.cut_count(), 11, "Cutoff restated each evaluation");
    assert_eq!(
        rig.sink.count(|e| *e == AppEvent::CutoffEngaged),
        1,
        "engage event only on the edge"
    );
}

#[test]
fn brief_dip_never_cuts() {
    let mut rig = Rig::new();
    rig.hw.set_voltage(205.0);
    rig.run(0, 300_000);
    rig.hw.set_voltage(230.0);
    rig.tick(305_000);
    rig.hw.set_voltage(205.0);
    rig.run(310_000, 900_000);

    // Re-anchored at 310 s, so the dwell is met at 910 s, not before.
    assert!(!rig.hw.is_cut_now());
    rig.tick(910_000);
    assert!(rig.hw.is_cut_now());
    assert_eq!(
        rig.sink.count(|e| matches!(
            e,
            AppEvent::Condition {
                kind: ConditionKind::LowVoltage,
                transition: Transition::Recovered
            }
        )),
        1
    );
}

#[test]
fn power_restored_when_supply_recovers() {
    let mut rig = Rig::new();
    rig.hw.set_voltage(250.0);
    rig.run(0, DWELL_MS);
    assert!(rig.hw.is_cut_now());

    rig.hw.set_voltage(230.0);
    rig.tick(DWELL_MS + TICK_MS);
    assert!(!rig.hw.is_cut_now());
    assert_eq!(rig.hw.calls.last(), Some(&CutoffCall::Restore));
    assert!(rig.sink.events.contains(&AppEvent::PowerRestored));
}

// ── Test mode ─────────────────────────────────────────────────

#[test]
fn test_mode_cycles_cutoff_with_the_signal() {
    let mut rig = Rig::new();
    rig.hw.pin = Some(MonitorMode::Test);

    rig.run(0, 20_000);

    // 230 V for 0-4.999 s, 200 V for 5-9.999 s, repeating.
    let cuts = rig.sink.count(|e| *e == AppEvent::CutoffEngaged);
    let restores = rig.sink.count(|e| *e == AppEvent::PowerRestored);
    assert_eq!(cuts, 2, "fault phases at 5 s and 15 s");
    assert_eq!(restores, 2, "normal phases at 10 s and 20 s");
    assert_eq!(rig.notifier.alerts(), 2);
    assert!(rig.notifier.sent[0].contains("TEST MODE"));
    assert_eq!(rig.hw.reads, 0, "meter untouched in test mode");
}

#[test]
fn test_mode_display_shows_phase() {
    let mut rig = Rig::new();
    rig.hw.pin = Some(MonitorMode::Test);
    rig.tick(0);
    rig.tick(5_000);
    assert_eq!(
        rig.sink.display,
        vec![
            DisplayCall::TestPhase(SignalPhase::Normal),
            DisplayCall::TestPhase(SignalPhase::Fault),
        ]
    );
}

#[test]
fn leaving_test_mode_restores_power_and_resumes_metering() {
    let mut rig = Rig::new();
    rig.hw.pin = Some(MonitorMode::Test);
    rig.tick(0);
    rig.tick(5_000);
    assert!(rig.hw.is_cut_now());

    rig.hw.pin = Some(MonitorMode::Normal);
    rig.tick(6_000);
    assert!(!rig.hw.is_cut_now());
    assert_eq!(rig.hw.reads, 1);
    assert!(matches!(
        rig.sink.display.last(),
        Some(DisplayCall::Reading { .. })
    ));
}

#[test]
fn remote_test_mode_without_pin_takes_effect() {
    let mut rig = Rig::new();
    rig.command(AppCommand::SetMode(MonitorMode::Test), 0);
    rig.tick(0);
    assert_eq!(rig.app.mode(), MonitorMode::Test);
    assert!(rig.sink.events.contains(&AppEvent::ModeChanged {
        from: MonitorMode::Normal,
        to: MonitorMode::Test,
    }));
}

#[test]
fn pin_wins_over_remote_request() {
    let mut rig = Rig::new();
    rig.hw.pin = Some(MonitorMode::Normal);
    rig.command(AppCommand::SetMode(MonitorMode::Test), 0);
    rig.tick(0);
    assert_eq!(rig.app.mode(), MonitorMode::Normal);
}

// ── Billing and reminders ─────────────────────────────────────

#[test]
fn display_shows_cost_from_tariff() {
    let mut rig = Rig::new();
    rig.command(AppCommand::SetTariffRate(0.75), 0);
    rig.tick(0);
    match rig.sink.display.last() {
        Some(DisplayCall::Reading { cost, energy_kwh }) => {
            assert_eq!(*energy_kwh, 100.0);
            assert!((cost - 400.0).abs() < 1e-3);
        }
        other => panic!("unexpected display call {other:?}"),
    }
}

#[test]
fn reminder_every_ten_minutes_even_when_offline() {
    let mut rig = Rig::new();
    rig.notifier = MockNotifier::offline();

    rig.run(0, 3 * DWELL_MS);
    assert_eq!(rig.notifier.reminders(), 3);
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::ReminderSent { delivered: false })),
        3
    );
}

#[test]
fn no_reminder_in_test_mode() {
    let mut rig = Rig::new();
    rig.hw.pin = Some(MonitorMode::Test);
    rig.run(0, 2 * DWELL_MS);
    assert_eq!(rig.notifier.reminders(), 0);
}

#[test]
fn telemetry_published_every_tick() {
    let mut rig = Rig::new();
    rig.hw.set_current(12.0);
    rig.run(0, 4 * TICK_MS);
    assert_eq!(rig.sink.telemetry.len(), 5);
    let last = rig.sink.telemetry.last().unwrap();
    assert_eq!(last.active_conditions, ConditionKind::HighCurrent.mask());
    assert!(!last.cut);
}
