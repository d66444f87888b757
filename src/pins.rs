//! GPIO / peripheral pin assignments for the energy monitor board
//! (ESP32 DevKit, PZEM-004T v3 on UART2).
//!
//! Single source of truth — `main` references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Load cutoff
// ---------------------------------------------------------------------------

/// Relay coil driver: HIGH = load energised, LOW = load cut.
pub const RELAY_GPIO: i32 = 23;
/// Active buzzer: HIGH = sounding.
pub const BUZZER_GPIO: i32 = 18;

// ---------------------------------------------------------------------------
// Mode selection
// ---------------------------------------------------------------------------

/// Test-mode jumper, internal pull-up.  LOW = test mode.
pub const TEST_MODE_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// Energy meter (PZEM-004T v3, Modbus-RTU over TTL UART)
// ---------------------------------------------------------------------------

/// ESP32 RX ← meter TX.
pub const PZEM_RX_GPIO: i32 = 16;
/// ESP32 TX → meter RX.
pub const PZEM_TX_GPIO: i32 = 17;
