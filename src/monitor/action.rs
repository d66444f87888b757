//! Side effects requested by the monitor.
//!
//! The monitor performs no I/O.  It returns an [`ActionSet`] and the
//! caller applies each [`Action`] in order.

use core::fmt::{self, Write};
use core::time::Duration;

use super::MonitorMode;
use super::condition::{ConditionKind, Transition};

/// Upper bound on actions per evaluation:
/// 3 log events + 1 cutoff/restore + 3 notifications.
pub const ACTION_CAP: usize = 8;

/// Maximum alert text length in bytes.
pub const ALERT_TEXT_CAP: usize = 128;

pub type AlertText = heapless::String<ALERT_TEXT_CAP>;

/// Actions returned by one `evaluate` or `set_mode` call.
pub type ActionSet = heapless::Vec<Action, ACTION_CAP>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// A condition changed state.  Informational only.
    Log(ConditionKind, Transition),
    /// De-energise the load and sound the buzzer.
    Cutoff,
    /// Energise the load and silence the buzzer.
    Restore,
    /// Send an alert message.
    Notify(AlertText),
}

/// Append to a set whose capacity covers the worst case.
pub(super) fn record(actions: &mut ActionSet, action: Action) {
    let pushed = actions.push(action);
    debug_assert!(pushed.is_ok(), "action set overflow");
}

/// Alert text for a condition that just escalated.
///
/// Test mode cuts on first breach.  In normal mode the text names the
/// dwell the condition outlasted.
pub(super) fn alert_text(kind: ConditionKind, mode: MonitorMode, dwell: Duration) -> AlertText {
    let mut text = AlertText::new();
    // Every message fits in ALERT_TEXT_CAP; a write error only truncates.
    let _ = match mode {
        MonitorMode::Test => write!(
            text,
            "\u{1F6A8} TEST MODE: {} detected. Power cut immediately.",
            kind.label()
        ),
        MonitorMode::Normal => write!(
            text,
            "\u{1F6A8} {} lasted over {}. Cutting power...",
            kind.label(),
            DwellText(dwell)
        ),
    };
    text
}

/// Renders a dwell as whole minutes when it is one, seconds otherwise.
struct DwellText(Duration);

impl fmt::Display for DwellText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0.as_secs();
        match (secs / 60, secs % 60) {
            (1, 0) => write!(f, "1 minute"),
            (m, 0) if m > 1 => write!(f, "{m} minutes"),
            _ if secs == 1 => write!(f, "1 second"),
            _ => write!(f, "{secs} seconds"),
        }
    }
}
