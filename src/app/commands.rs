//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (remote
//! console, dashboard) that the [`AppService`](super::service::AppService)
//! interprets and acts upon.  The physical mode pin is not a command; it
//! is polled through [`ModeInput`](super::ports::ModeInput) each tick.

use core::fmt;
use core::str::FromStr;

use crate::monitor::MonitorMode;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppCommand {
    /// Switch between live monitoring and the test signal.
    SetMode(MonitorMode),

    /// Replace the Ft tariff rate (THB/kWh).
    SetTariffRate(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseCommandError {
    Empty,
    UnknownVerb,
    BadArgument,
}

impl fmt::Display for ParseCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty command"),
            Self::UnknownVerb => write!(f, "unknown command (expected 'mode' or 'ft')"),
            Self::BadArgument => write!(f, "bad argument"),
        }
    }
}

/// Console syntax: `mode test`, `mode normal`, `ft <rate>`.
impl FromStr for AppCommand {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or(ParseCommandError::Empty)?;
        let arg = words.next().ok_or(ParseCommandError::BadArgument)?;
        if words.next().is_some() {
            return Err(ParseCommandError::BadArgument);
        }

        match verb.to_ascii_lowercase().as_str() {
            "mode" => match arg.to_ascii_lowercase().as_str() {
                "test" | "1" | "on" => Ok(Self::SetMode(MonitorMode::Test)),
                "normal" | "0" | "off" => Ok(Self::SetMode(MonitorMode::Normal)),
                _ => Err(ParseCommandError::BadArgument),
            },
            "ft" => arg
                .parse::<f32>()
                .map(Self::SetTariffRate)
                .map_err(|_| ParseCommandError::BadArgument),
            _ => Err(ParseCommandError::UnknownVerb),
        }
    }
}
