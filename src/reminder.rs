//! Periodic bill reminder.
//!
//! The timer re-arms when a reminder is *scheduled*, not when it is
//! delivered: under a dead uplink the cadence stays at one attempt per
//! interval instead of retrying every tick.

use core::time::Duration;

use crate::time::Instant;

pub struct ReminderTimer {
    interval: Duration,
    last_fired: Instant,
}

impl ReminderTimer {
    /// Arm the timer at `armed_at` (normally boot).
    pub fn new(interval: Duration, armed_at: Instant) -> Self {
        Self {
            interval,
            last_fired: armed_at,
        }
    }

    /// True when a reminder is due.  Re-arms on the same call.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last_fired) < self.interval {
            return false;
        }
        self.last_fired = now;
        true
    }

    pub fn last_fired(&self) -> Instant {
        self.last_fired
    }
}

/// Reminder text for the current bill, in English and Thai.
pub fn reminder_text(cost: f32) -> String {
    format!(
        "\u{1F4E2} Reminder for current electricity bill payment \
         (แจ้งเตือนชำระค่าไฟฟ้าเดือนปัจจุบัน) \u{1F4B5} ยอดที่ต้องชำระ {:.2} บาท",
        cost
    )
}
