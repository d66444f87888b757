//! Energy monitor firmware — main entry point.
//!
//! Hexagonal architecture with a single-owner control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter        LogEventSink          WebhookNotifier  │
//! │  (Sample+Cutoff+Mode)   (Event+Display+Tele)  (Notifier)       │
//! │  Esp32TimeAdapter       EspWifiLink           console thread   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  ConditionMonitor · TestSignal · Tariff · Reminder     │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Build-time settings: `ENERGYMON_WIFI_SSID`, `ENERGYMON_WIFI_PASS`,
//! `ENERGYMON_WEBHOOK_URL`.  Without an SSID the device runs offline.
#![deny(unused_must_use)]

use std::io::BufRead;

use anyhow::{Context, Result};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyInputPin, AnyOutputPin, PinDriver, Pull};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::uart::{UartDriver, config::Config as UartConfig};
use esp_idf_hal::units::Hertz;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{error, info, warn};

use energymon::adapters::console::{self, CMD_CHANNEL, SubmitError};
use energymon::adapters::hardware::HardwareAdapter;
use energymon::adapters::log_sink::LogEventSink;
use energymon::adapters::notifier::WebhookNotifier;
use energymon::adapters::time::Esp32TimeAdapter;
use energymon::adapters::wifi::{self, EspWifiLink, RetryPolicy, WifiCredentials};
use energymon::app::service::AppService;
use energymon::config::SystemConfig;
use energymon::drivers::cutoff::CutoffDriver;
use energymon::drivers::mode_pin::ModePin;
use energymon::pins;
use energymon::sensors::pzem::{PZEM_BAUD_RATE, PZEM_DEFAULT_ADDRESS, PzemSensor};

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Energy monitor v{}               ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = SystemConfig::default();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config invalid: {e}"))?;

    // ── 3. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take().context("peripherals already taken")?;

    // SAFETY: each GPIO number in `pins` is claimed exactly once, here.
    let (relay, buzzer, jumper, uart_tx, uart_rx) = unsafe {
        (
            AnyOutputPin::new(pins::RELAY_GPIO),
            AnyOutputPin::new(pins::BUZZER_GPIO),
            AnyInputPin::new(pins::TEST_MODE_GPIO),
            AnyOutputPin::new(pins::PZEM_TX_GPIO),
            AnyInputPin::new(pins::PZEM_RX_GPIO),
        )
    };

    let cutoff = CutoffDriver::new(PinDriver::output(relay)?, PinDriver::output(buzzer)?);

    let mut jumper = PinDriver::input(jumper)?;
    jumper.set_pull(Pull::Up)?;

    let uart = UartDriver::new(
        peripherals.uart2,
        uart_tx,
        uart_rx,
        Option::<AnyInputPin>::None,
        Option::<AnyOutputPin>::None,
        &UartConfig::default().baudrate(Hertz(PZEM_BAUD_RATE)),
    )?;
    let meter = PzemSensor::new(uart, PZEM_DEFAULT_ADDRESS);

    let mut hw = HardwareAdapter::new(meter, cutoff, Some(ModePin::new(jumper)));

    // ── 4. Uplink (optional) ──────────────────────────────────
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take().ok();
    let _wifi = match option_env!("ENERGYMON_WIFI_SSID") {
        Some(ssid) => bring_up_wifi(
            peripherals.modem,
            sysloop,
            nvs,
            ssid,
            option_env!("ENERGYMON_WIFI_PASS").unwrap_or(""),
            RetryPolicy::from_config(&config),
        ),
        None => {
            warn!("No WiFi SSID configured, running offline");
            None
        }
    };
    let webhook_url = option_env!("ENERGYMON_WEBHOOK_URL").unwrap_or("");
    if webhook_url.is_empty() {
        warn!("No webhook URL configured, alerts and reminders are log-only");
    }
    let mut notifier = WebhookNotifier::new(webhook_url);

    // ── 5. Remote console ─────────────────────────────────────
    std::thread::Builder::new()
        .name("console".into())
        .stack_size(4096)
        .spawn(console_reader)?;

    // ── 6. Application service ────────────────────────────────
    let clock = Esp32TimeAdapter::new();
    let mut sink = LogEventSink::new();
    let mut app = AppService::new(&config, clock.now());
    app.start(&mut sink);

    let interval_ms = config.control_loop_interval_ms;
    info!("System ready. Entering control loop ({} ms).", interval_ms);

    // ── 7. Control loop ───────────────────────────────────────
    loop {
        let now = clock.now();

        // Remote commands first; the mode pin read inside `tick` wins.
        while let Some(cmd) = console::try_recv_command(&CMD_CHANNEL) {
            if let Err(e) = app.handle_command(cmd, now, &mut hw, &mut sink) {
                warn!("Command {:?} rejected: {}", cmd, e);
            }
        }

        app.tick(now, &mut hw, &mut notifier, &mut sink);

        FreeRtos::delay_ms(interval_ms);
    }
}

// ── Helpers ───────────────────────────────────────────────────

fn bring_up_wifi(
    modem: esp_idf_hal::modem::Modem,
    sysloop: EspSystemEventLoop,
    nvs: Option<EspDefaultNvsPartition>,
    ssid: &str,
    password: &str,
    policy: RetryPolicy,
) -> Option<EspWifiLink> {
    let creds = match WifiCredentials::new(ssid, password) {
        Ok(c) => c,
        Err(e) => {
            error!("WiFi credentials rejected: {}", e);
            return None;
        }
    };
    let mut link = match EspWifiLink::new(modem, sysloop, nvs, &creds) {
        Ok(l) => l,
        Err(e) => {
            error!("WiFi init failed: {}", e);
            return None;
        }
    };
    let delay = |d: core::time::Duration| FreeRtos::delay_ms(d.as_millis() as u32);
    if wifi::connect_with_retries(&mut link, policy, delay).is_err() {
        warn!("Alerts and reminders will not be delivered until the uplink is up");
    }
    Some(link)
}

/// Read console lines and queue parsed commands for the control loop.
fn console_reader() {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else {
            FreeRtos::delay_ms(100);
            continue;
        };
        match console::submit_line(&CMD_CHANNEL, &line) {
            Ok(Some(cmd)) => info!("Console: queued {:?}", cmd),
            Ok(None) => {}
            Err(e @ SubmitError::QueueFull(_)) => warn!("Console: {}", e),
            Err(e @ SubmitError::Parse(_)) => warn!("Console: '{}': {}", line.trim(), e),
        }
    }
}
