//! Fuzz target: `AppCommand::from_str` → `AppService::set_tariff_rate`
//!
//! Console input is untrusted.  The parser must never panic, and a
//! non-finite tariff rate ("ft inf", "ft NaN") must never reach the bill.
//!
//! cargo fuzz run fuzz_console_command

#![no_main]

use energymon::app::commands::AppCommand;
use energymon::app::events::AppEvent;
use energymon::app::ports::EventSink;
use energymon::app::service::AppService;
use energymon::config::SystemConfig;
use energymon::time::Instant;
use libfuzzer_sys::fuzz_target;

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let Ok(line) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok(AppCommand::SetTariffRate(rate)) = line.parse::<AppCommand>() {
        let mut app = AppService::new(&SystemConfig::default(), Instant::ZERO);
        let accepted = app.set_tariff_rate(rate, &mut Discard).is_ok();
        assert_eq!(accepted, rate.is_finite());
        assert!(app.tariff_rate().is_finite());
    }
});
