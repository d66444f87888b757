//! Fuzz target: `pzem::parse_response`
//!
//! Drives arbitrary byte sequences into the meter frame parser and
//! asserts that it never panics and that anything it accepts decodes to
//! finite, non-negative quantities.
//!
//! cargo fuzz run fuzz_pzem_frame

#![no_main]

use energymon::sensors::pzem::{self, PZEM_DEFAULT_ADDRESS};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(r) = pzem::parse_response(PZEM_DEFAULT_ADDRESS, data) {
        for v in [r.voltage, r.current, r.power, r.energy_kwh, r.frequency, r.power_factor] {
            assert!(v.is_finite() && v >= 0.0, "decoded {v}");
        }
        // Re-encoding an accepted reading must parse back to it.
        let again = pzem::encode_response(PZEM_DEFAULT_ADDRESS, &r);
        assert!(pzem::parse_response(PZEM_DEFAULT_ADDRESS, &again).is_ok());
    }
});
