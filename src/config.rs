//! System configuration parameters
//!
//! All tunable parameters for the energy monitor.  The configuration is
//! fixed at boot; the tariff rate is the only value that changes at
//! runtime and it arrives through [`AppCommand::SetTariffRate`].
//!
//! [`AppCommand::SetTariffRate`]: crate::app::commands::AppCommand::SetTariffRate

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Thresholds ---
    /// Supply voltage above which the over-voltage condition is raised (V)
    pub voltage_high_limit: f32,
    /// Supply voltage below which the under-voltage condition is raised (V)
    pub voltage_low_limit: f32,
    /// Load current above which the over-current condition is raised (A)
    pub current_high_limit: f32,

    // --- Alerting ---
    /// Continuous breach time before power is cut in normal mode (ms)
    pub alert_duration_ms: u32,
    /// Bill reminder cadence (ms)
    pub reminder_interval_ms: u32,

    // --- Billing ---
    /// Fuel-adjustment (Ft) rate applied at boot (THB/kWh)
    pub initial_tariff_rate: f32,

    // --- Timing ---
    /// Main loop polling interval (ms)
    pub control_loop_interval_ms: u32,

    // --- Connectivity ---
    /// Link checks before falling back to offline operation
    pub wifi_connect_attempts: u32,
    /// Delay between link checks (ms)
    pub wifi_retry_delay_ms: u32,

    // --- Test mode ---
    pub test_signal: TestSignalConfig,
}

/// Shape of the synthetic waveform used in test mode.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TestSignalConfig {
    /// Voltage reported during the healthy half of each cycle (V)
    pub normal_voltage: f32,
    /// Voltage reported during the fault half of each cycle (V)
    pub fault_voltage: f32,
    /// Full cycle length (ms)
    pub cycle_ms: u32,
    /// Offset into the cycle where the fault phase begins (ms)
    pub fault_offset_ms: u32,
    /// Constant synthetic load current (A)
    pub current: f32,
    /// Constant synthetic power factor
    pub power_factor: f32,
}

impl Default for TestSignalConfig {
    fn default() -> Self {
        Self {
            normal_voltage: 230.0,
            fault_voltage: 200.0,
            cycle_ms: 10_000,
            fault_offset_ms: 5_000,
            current: 2.5,
            power_factor: 0.95,
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Thresholds
            voltage_high_limit: 240.0,
            voltage_low_limit: 210.0,
            current_high_limit: 10.0,

            // Alerting
            alert_duration_ms: 600_000,   // 10 min
            reminder_interval_ms: 600_000, // 10 min

            // Billing
            initial_tariff_rate: 0.30,

            // Timing
            control_loop_interval_ms: 5_000,

            // Connectivity: 20 × 500 ms ≈ 10 s before going offline
            wifi_connect_attempts: 20,
            wifi_retry_delay_ms: 500,

            test_signal: TestSignalConfig::default(),
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = [
            self.voltage_high_limit,
            self.voltage_low_limit,
            self.current_high_limit,
            self.initial_tariff_rate,
        ];
        if limits.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::ValidationFailed(
                "thresholds and tariff rate must be finite",
            ));
        }
        if self.voltage_low_limit <= 0.0 || self.voltage_low_limit >= self.voltage_high_limit {
            return Err(ConfigError::ValidationFailed(
                "voltage_low_limit must be > 0 and < voltage_high_limit",
            ));
        }
        if self.current_high_limit <= 0.0 {
            return Err(ConfigError::ValidationFailed(
                "current_high_limit must be > 0",
            ));
        }
        if self.alert_duration_ms == 0 {
            return Err(ConfigError::ValidationFailed("alert_duration_ms must be > 0"));
        }
        if self.reminder_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "reminder_interval_ms must be > 0",
            ));
        }
        if !(100..=60_000).contains(&self.control_loop_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "control_loop_interval_ms must be 100–60000",
            ));
        }

        let ts = &self.test_signal;
        if ts.cycle_ms == 0 || ts.fault_offset_ms == 0 || ts.fault_offset_ms >= ts.cycle_ms {
            return Err(ConfigError::ValidationFailed(
                "test_signal.fault_offset_ms must fall inside the cycle",
            ));
        }
        if !(ts.fault_voltage < self.voltage_low_limit) {
            return Err(ConfigError::ValidationFailed(
                "test_signal.fault_voltage must be below voltage_low_limit",
            ));
        }
        if !(ts.normal_voltage >= self.voltage_low_limit
            && ts.normal_voltage <= self.voltage_high_limit)
        {
            return Err(ConfigError::ValidationFailed(
                "test_signal.normal_voltage must sit inside the voltage band",
            ));
        }
        Ok(())
    }

    pub fn alert_duration(&self) -> Duration {
        Duration::from_millis(u64::from(self.alert_duration_ms))
    }

    pub fn reminder_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.reminder_interval_ms))
    }

    pub fn control_loop_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.control_loop_interval_ms))
    }
}
