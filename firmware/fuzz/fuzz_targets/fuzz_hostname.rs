//! Fuzz target: `is_valid_hostname`
//!
//! Any accepted hostname must fit the SNTP server field and be ASCII.
//!
//! cargo fuzz run fuzz_hostname

#![no_main]

use libfuzzer_sys::fuzz_target;
use tftclock::ntp::{NtpSettings, is_valid_hostname};

fuzz_target!(|host: &str| {
    if !is_valid_hostname(host) {
        return;
    }
    assert!(host.is_ascii());
    assert!(host.len() <= 254);

    if let Ok(settings) = NtpSettings::new(host, 0) {
        assert!(settings.validate().is_ok());
        assert_eq!(settings.effective_server(), host);
    }
});
