//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use serde::Serialize;

use crate::monitor::{ConditionKind, MonitorMode, Transition};
use crate::signal::SignalPhase;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The application service has started (carries initial mode).
    Started(MonitorMode),

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),

    /// A supervised condition began or stopped breaching.
    Condition {
        kind: ConditionKind,
        transition: Transition,
    },

    /// The relay was opened.
    CutoffEngaged,

    /// The relay was closed again.
    PowerRestored,

    /// Monitoring mode switched.
    ModeChanged { from: MonitorMode, to: MonitorMode },

    /// The test waveform changed phase.
    TestPhaseChanged(SignalPhase),

    /// The Ft rate changed.
    TariffRateChanged(f32),

    /// An alert could not be delivered.
    NotificationFailed,

    /// A bill reminder was attempted.
    ReminderSent { delivered: bool },
}

/// One tick's dashboard record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TelemetryData {
    pub mode: MonitorMode,
    pub voltage: f32,
    pub current: f32,
    pub power: f32,
    pub energy_kwh: f32,
    pub power_factor: f32,
    pub cost: f32,
    pub tariff_rate: f32,
    /// Active-condition bitmask (see [`ConditionKind::mask`]).
    pub active_conditions: u8,
    pub cut: bool,
}
