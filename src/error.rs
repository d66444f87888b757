//! Unified error types for the energy monitor firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! top-level loop's error handling uniform.  All variants are `Copy` so
//! they pass through the sensor and notification paths without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The energy meter could not be read or returned a malformed frame.
    Sensor(SensorError),
    /// A relay or buzzer output could not be driven.
    Actuator(ActuatorError),
    /// A communication subsystem failed.
    Comms(CommsError),
    /// Peripheral or driver initialisation failed.  Names the subsystem.
    Init(&'static str),
    /// Configuration is invalid.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

/// Failures talking Modbus-RTU to the PZEM-004T meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// UART write failed or no reply arrived before the timeout.
    NoResponse,
    /// Reply shorter than the expected frame.
    ShortFrame,
    /// CRC-16 trailer does not match the payload.
    CrcMismatch,
    /// Reply came from a different slave address.
    UnexpectedAddress,
    /// Reply carries a function code we did not ask for.
    UnexpectedFunction,
    /// Meter answered with a Modbus exception code.
    ExceptionResponse(u8),
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoResponse => write!(f, "meter did not respond"),
            Self::ShortFrame => write!(f, "short frame"),
            Self::CrcMismatch => write!(f, "CRC mismatch"),
            Self::UnexpectedAddress => write!(f, "unexpected slave address"),
            Self::UnexpectedFunction => write!(f, "unexpected function code"),
            Self::ExceptionResponse(code) => write!(f, "modbus exception 0x{code:02X}"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// Relay GPIO write failed.
    RelayWriteFailed,
    /// Buzzer GPIO write failed.
    BuzzerWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RelayWriteFailed => write!(f, "relay write failed"),
            Self::BuzzerWriteFailed => write!(f, "buzzer write failed"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    /// The station could not join the configured network.
    WifiConnectFailed,
    /// The webhook request could not be sent.
    HttpRequestFailed,
    /// The webhook answered with a non-success status.
    HttpStatus(u16),
    /// The notification payload could not be encoded.
    PayloadEncoding,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WifiConnectFailed => write!(f, "WiFi connect failed"),
            Self::HttpRequestFailed => write!(f, "HTTP request failed"),
            Self::HttpStatus(code) => write!(f, "HTTP status {code}"),
            Self::PayloadEncoding => write!(f, "payload encoding failed"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// A runtime tariff update was not a finite number.
    InvalidTariffRate,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::InvalidTariffRate => write!(f, "tariff rate must be finite"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
