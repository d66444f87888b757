//! Fault conditions, their thresholds, and per-condition tracking state.

use core::fmt;

use serde::Serialize;

use crate::config::SystemConfig;
use crate::time::Instant;

use super::sample::Sample;

/// Breach limits, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub voltage_high: f32,
    pub voltage_low: f32,
    pub current_high: f32,
}

impl Thresholds {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            voltage_high: config.voltage_high_limit,
            voltage_low: config.voltage_low_limit,
            current_high: config.current_high_limit,
        }
    }
}

/// The three supervised conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum ConditionKind {
    LowVoltage = 0,
    HighVoltage = 1,
    HighCurrent = 2,
}

impl ConditionKind {
    pub const COUNT: usize = 3;

    /// Evaluation order.  Conditions are independent; the order only
    /// affects the order of returned actions.
    pub const ALL: [ConditionKind; Self::COUNT] = [
        ConditionKind::LowVoltage,
        ConditionKind::HighVoltage,
        ConditionKind::HighCurrent,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Bit for this condition in [`ConditionMonitor::active_mask`].
    ///
    /// [`ConditionMonitor::active_mask`]: super::ConditionMonitor::active_mask
    pub const fn mask(self) -> u8 {
        1 << (self as u8)
    }

    /// True if `sample` is on the unsafe side of this condition's limit.
    /// A NaN reading never breaches.
    pub fn is_breached(self, sample: &Sample, limits: &Thresholds) -> bool {
        match self {
            Self::LowVoltage => sample.voltage < limits.voltage_low,
            Self::HighVoltage => sample.voltage > limits.voltage_high,
            Self::HighCurrent => sample.current > limits.current_high,
        }
    }

    /// Short label used in alert text.
    pub const fn label(self) -> &'static str {
        match self {
            Self::LowVoltage => "Voltage DROP",
            Self::HighVoltage => "Voltage OVER",
            Self::HighCurrent => "Overcurrent",
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LowVoltage => write!(f, "low voltage"),
            Self::HighVoltage => write!(f, "high voltage"),
            Self::HighCurrent => write!(f, "high current"),
        }
    }
}

/// Edge reported for a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Transition {
    /// The condition started breaching.
    Onset,
    /// The condition stopped breaching.
    Recovered,
}

/// Tracking state for one condition.
///
/// `active_since` doubles as the active flag: `Some` while breaching,
/// anchored at the first breaching sample and never moved until recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConditionState {
    pub(super) active_since: Option<Instant>,
    /// Dwell satisfied and notification already issued for this episode.
    pub(super) escalated: bool,
}

impl ConditionState {
    pub fn is_active(&self) -> bool {
        self.active_since.is_some()
    }

    pub fn active_since(&self) -> Option<Instant> {
        self.active_since
    }

    pub fn is_escalated(&self) -> bool {
        self.escalated
    }
}
