//! Full pipeline on the host: simulated PZEM meter → HardwareAdapter →
//! AppService → relay/buzzer pins and the simulated webhook.
//!
//! The simulated meter is process-global, so every test here takes
//! `SIM_LOCK` first.

use std::sync::Mutex;

use super::mock_hw::{RecordingSink, SharedInPin, SharedOutPin};

use energymon::adapters::hardware::HardwareAdapter;
use energymon::adapters::notifier::WebhookNotifier;
use energymon::app::service::AppService;
use energymon::config::SystemConfig;
use energymon::drivers::cutoff::CutoffDriver;
use energymon::drivers::mode_pin::ModePin;
use energymon::monitor::MonitorMode;
use energymon::sensors::pzem::{self, PZEM_DEFAULT_ADDRESS, PzemSensor};
use energymon::time::Instant;

static SIM_LOCK: Mutex<()> = Mutex::new(());

struct Board {
    relay: SharedOutPin,
    buzzer: SharedOutPin,
    jumper: SharedInPin,
    hw: HardwareAdapter<SharedOutPin, SharedOutPin, SharedInPin>,
}

fn make_board() -> Board {
    let relay = SharedOutPin::default();
    let buzzer = SharedOutPin::default();
    let jumper = SharedInPin::default();
    jumper.0.set(true); // pulled up: normal mode
    let hw = HardwareAdapter::new(
        PzemSensor::new(PZEM_DEFAULT_ADDRESS),
        CutoffDriver::new(relay.clone(), buzzer.clone()),
        Some(ModePin::new(jumper.clone())),
    );
    Board {
        relay,
        buzzer,
        jumper,
        hw,
    }
}

#[test]
fn boot_leaves_load_energised_and_buzzer_silent() {
    let _guard = SIM_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let board = make_board();
    assert_eq!(board.relay.0.get(), Some(true));
    assert_eq!(board.buzzer.0.get(), Some(false));
}

#[test]
fn overcurrent_from_meter_trips_relay_and_posts_webhook() {
    let _guard = SIM_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    pzem::sim_set_offline(false);
    pzem::sim_set_reading(230.0, 16.0, 42.0);

    let mut board = make_board();
    let mut notifier = WebhookNotifier::new("http://relay.invalid/trigger");
    let mut sink = RecordingSink::new();
    let mut app = AppService::new(&SystemConfig::default(), Instant::ZERO);

    for t in (0..=600_000).step_by(5_000) {
        app.tick(Instant::from_millis(t), &mut board.hw, &mut notifier, &mut sink);
    }

    assert_eq!(board.relay.0.get(), Some(false), "load cut");
    assert_eq!(board.buzzer.0.get(), Some(true), "buzzer sounding");

    // Alert first, then the 10-minute bill reminder on the same tick.
    let bodies: Vec<serde_json::Value> = notifier
        .sim_payloads()
        .iter()
        .map(|b| serde_json::from_slice(b).unwrap())
        .collect();
    assert_eq!(bodies.len(), 2);
    assert!(bodies[0]["value1"].as_str().unwrap().contains("Overcurrent"));
    assert!(bodies[1]["value1"].as_str().unwrap().contains("บาท"));

    pzem::sim_set_reading(230.0, 1.0, 0.0);
}

#[test]
fn grounding_the_jumper_switches_to_test_signal() {
    let _guard = SIM_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    pzem::sim_set_offline(false);
    pzem::sim_set_reading(230.0, 1.0, 7.0);

    let mut board = make_board();
    let mut notifier = WebhookNotifier::new("http://relay.invalid/trigger");
    let mut sink = RecordingSink::new();
    let mut app = AppService::new(&SystemConfig::default(), Instant::ZERO);

    app.tick(Instant::from_millis(0), &mut board.hw, &mut notifier, &mut sink);
    assert_eq!(app.mode(), MonitorMode::Normal);

    board.jumper.0.set(false);
    app.tick(Instant::from_millis(1_000), &mut board.hw, &mut notifier, &mut sink);
    assert_eq!(app.mode(), MonitorMode::Test);
    assert!((app.last_sample().energy_kwh - 7.0).abs() < 0.01, "energy held");

    // Fault half of the cycle starts 5 s after entering test mode.
    app.tick(Instant::from_millis(6_000), &mut board.hw, &mut notifier, &mut sink);
    assert_eq!(board.relay.0.get(), Some(false));

    board.jumper.0.set(true);
    app.tick(Instant::from_millis(7_000), &mut board.hw, &mut notifier, &mut sink);
    assert_eq!(app.mode(), MonitorMode::Normal);
    assert_eq!(board.relay.0.get(), Some(true));
}

#[test]
fn silent_meter_keeps_last_sample_and_stays_safe() {
    let _guard = SIM_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    pzem::sim_set_offline(false);
    pzem::sim_set_reading(229.0, 2.0, 3.0);

    let mut board = make_board();
    let mut notifier = WebhookNotifier::new("http://relay.invalid/trigger");
    let mut sink = RecordingSink::new();
    let mut app = AppService::new(&SystemConfig::default(), Instant::ZERO);

    app.tick(Instant::from_millis(0), &mut board.hw, &mut notifier, &mut sink);
    pzem::sim_set_offline(true);
    app.tick(Instant::from_millis(5_000), &mut board.hw, &mut notifier, &mut sink);
    pzem::sim_set_offline(false);

    assert_eq!(board.hw.consecutive_failures(), 1);
    assert!((app.last_sample().voltage - 229.0).abs() < 0.05);
    assert_eq!(board.relay.0.get(), Some(true));
}
