//! Energy monitor firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

// Target code below names the ESP-IDF crates, which only the feature pulls in.
#[cfg(all(target_os = "espidf", not(feature = "espidf")))]
compile_error!("building for ESP-IDF requires `--features espidf`");

pub mod app;
pub mod config;
pub mod error;
pub mod monitor;
pub mod pins;
pub mod reminder;
pub mod signal;
pub mod tariff;
pub mod time;

// Hardware-facing modules; the ESP-IDF implementations are guarded by
// cfg attributes inside, host builds get simulations.
pub mod adapters;
pub mod drivers;
pub mod sensors;
