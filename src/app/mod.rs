//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the orchestration rules for the energy monitor:
//! mode selection, sampling, billing, condition supervision, and the bill
//! reminder.  All interaction with hardware happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
