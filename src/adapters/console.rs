//! Remote console bridge.
//!
//! A helper thread reads text lines from the serial console, parses them
//! into [`AppCommand`]s and queues them on a bounded static channel.  The
//! control loop drains the channel before each tick, so the service keeps
//! a single owner and never blocks on console input.
//!
//! ```text
//! ┌──────────────┐  AppCommand  ┌──────────────┐
//! │ console task │─────────────▶│ control loop │
//! │ (stdin)      │  CMD_CHANNEL │ (sync)       │
//! └──────────────┘              └──────────────┘
//! ```

use core::fmt;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::app::commands::{AppCommand, ParseCommandError};

/// Commands buffered between two control ticks.
pub const CMD_DEPTH: usize = 8;

pub type CommandChannel = Channel<CriticalSectionRawMutex, AppCommand, CMD_DEPTH>;

/// Console task → control loop.
pub static CMD_CHANNEL: CommandChannel = Channel::new();

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubmitError {
    /// The line is not a command.
    Parse(ParseCommandError),
    /// The control loop has not drained the queue; the command was dropped.
    QueueFull(AppCommand),
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "{e}"),
            Self::QueueFull(cmd) => write!(f, "command queue full, dropped {cmd:?}"),
        }
    }
}

/// Parse one console line and queue it.  Blank lines yield `Ok(None)`.
pub fn submit_line(
    channel: &CommandChannel,
    line: &str,
) -> Result<Option<AppCommand>, SubmitError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let cmd: AppCommand = line.parse().map_err(SubmitError::Parse)?;
    channel
        .try_send(cmd)
        .map_err(|_| SubmitError::QueueFull(cmd))?;
    Ok(Some(cmd))
}

/// Next queued command, if any.  Never blocks.
pub fn try_recv_command(channel: &CommandChannel) -> Option<AppCommand> {
    channel.try_receive().ok()
}
