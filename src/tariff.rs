//! Electricity cost.
//!
//! Cost = energy × (Ft rate + base rate).  The Ft (fuel adjustment) rate
//! is set at runtime; the base rate is fixed.

/// Fixed per-kWh surcharge added to the Ft rate (THB/kWh).
pub const FIXED_SURCHARGE: f32 = 3.25;

/// Cost in THB for `energy_kwh` at `tariff_rate`.  Non-finite input
/// propagates to the result.
pub fn cost(energy_kwh: f32, tariff_rate: f32) -> f32 {
    energy_kwh * (tariff_rate + FIXED_SURCHARGE)
}
