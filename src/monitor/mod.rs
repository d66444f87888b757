//! Condition monitor — the alert state machine.
//!
//! Runs once per tick after the sample is taken.  Each condition is
//! tracked independently:
//!
//! ```text
//!            breach                    dwell elapsed
//!  Inactive ────────▶ Active(since) ─────────────────▶ Escalated
//!     ▲                   │                                │
//!     │   no breach       │           no breach            │
//!     └───────────────────┴────────────────────────────────┘
//! ```
//!
//! 1. A breach on an inactive condition anchors `active_since = now`.
//! 2. A non-breaching sample clears the condition at once; no dwell is
//!    needed to recover.
//! 3. Once `now - active_since >= dwell` the condition escalates: a
//!    notification is issued for the episode and `Cutoff` is restated on
//!    every evaluation while it stays escalated.
//! 4. When the last escalated condition recovers, `Restore` is issued.
//!
//! The dwell is [`SystemConfig::alert_duration`] in normal mode and zero
//! in test mode.  The monitor performs no I/O; every side effect is an
//! [`Action`] for the caller to apply.

pub mod action;
pub mod condition;
pub mod sample;

use core::time::Duration;

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::SystemConfig;
use crate::time::Instant;

pub use action::{Action, ActionSet, AlertText};
pub use condition::{ConditionKind, ConditionState, Thresholds, Transition};
pub use sample::Sample;

/// Operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MonitorMode {
    /// Live meter data, full dwell window.
    #[default]
    Normal,
    /// Synthetic test signal, zero dwell.
    Test,
}

/// Per-condition alert state machine.
pub struct ConditionMonitor {
    thresholds: Thresholds,
    alert_duration: Duration,
    mode: MonitorMode,
    states: [ConditionState; ConditionKind::COUNT],
}

impl ConditionMonitor {
    pub fn new(thresholds: Thresholds, alert_duration: Duration) -> Self {
        Self {
            thresholds,
            alert_duration,
            mode: MonitorMode::Normal,
            states: [ConditionState::default(); ConditionKind::COUNT],
        }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new(Thresholds::from_config(config), config.alert_duration())
    }

    /// Classify `sample` and return the actions to perform.
    pub fn evaluate(&mut self, sample: &Sample, now: Instant) -> ActionSet {
        let dwell = self.dwell();
        let was_escalated = self.is_escalated();
        let mut actions = ActionSet::new();
        let mut newly_escalated = [false; ConditionKind::COUNT];

        for kind in ConditionKind::ALL {
            let breached = kind.is_breached(sample, &self.thresholds);
            let state = &mut self.states[kind.index()];

            match (breached, state.active_since) {
                (true, None) => {
                    state.active_since = Some(now);
                    warn!(
                        "CONDITION ONSET: {kind} (V={:.1} I={:.2})",
                        sample.voltage, sample.current
                    );
                    action::record(&mut actions, Action::Log(kind, Transition::Onset));
                }
                (false, Some(_)) => {
                    *state = ConditionState::default();
                    info!("CONDITION RECOVERED: {kind}");
                    action::record(&mut actions, Action::Log(kind, Transition::Recovered));
                }
                _ => {}
            }

            let Some(since) = state.active_since else {
                continue;
            };
            if state.escalated {
                continue;
            }
            // A clock reading earlier than the anchor counts as "not yet".
            let dwell_met = now
                .checked_duration_since(since)
                .is_some_and(|held| held >= dwell);
            if dwell_met {
                state.escalated = true;
                newly_escalated[kind.index()] = true;
                error!("CONDITION ESCALATED: {kind}, cutting power");
            }
        }

        if self.is_escalated() {
            action::record(&mut actions, Action::Cutoff);
            for kind in ConditionKind::ALL {
                if newly_escalated[kind.index()] {
                    action::record(
                        &mut actions,
                        Action::Notify(action::alert_text(kind, self.mode, dwell)),
                    );
                }
            }
        } else if was_escalated {
            info!("All escalated conditions recovered, restoring power");
            action::record(&mut actions, Action::Restore);
        }

        actions
    }

    /// Switch mode.  Clears every condition and requests `Restore` so no
    /// cutoff survives the switch.
    pub fn set_mode(&mut self, mode: MonitorMode) -> ActionSet {
        if mode != self.mode {
            info!("Monitor mode {:?} -> {:?}", self.mode, mode);
        }
        self.mode = mode;
        self.reset();
        let mut actions = ActionSet::new();
        action::record(&mut actions, Action::Restore);
        actions
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn mode(&self) -> MonitorMode {
        self.mode
    }

    /// Effective dwell for the current mode.
    pub fn dwell(&self) -> Duration {
        match self.mode {
            MonitorMode::Normal => self.alert_duration,
            MonitorMode::Test => Duration::ZERO,
        }
    }

    pub fn state(&self, kind: ConditionKind) -> ConditionState {
        self.states[kind.index()]
    }

    pub fn is_active(&self, kind: ConditionKind) -> bool {
        self.states[kind.index()].is_active()
    }

    /// Bitmask of active conditions (see [`ConditionKind::mask`]).
    pub fn active_mask(&self) -> u8 {
        ConditionKind::ALL
            .iter()
            .filter(|k| self.is_active(**k))
            .fold(0, |acc, k| acc | k.mask())
    }

    /// True while at least one condition is past its dwell.
    pub fn is_escalated(&self) -> bool {
        self.states.iter().any(ConditionState::is_escalated)
    }

    // ── Internal ──────────────────────────────────────────────

    fn reset(&mut self) {
        self.states = [ConditionState::default(); ConditionKind::COUNT];
    }
}
