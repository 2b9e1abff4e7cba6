//! Fuzz target: NVS credential record decoding
//!
//! Feeds arbitrary bytes through the same decode the NVS adapter runs on
//! boot.  Decoding may fail, but must never panic, and anything that
//! decodes must survive validation and re-encoding.
//!
//! cargo fuzz run fuzz_credential_record

#![no_main]

use libfuzzer_sys::fuzz_target;
use tftclock::adapters::nvs::{MAX_BLOB_SIZE, decode_credentials, encode_credentials};

fuzz_target!(|data: &[u8]| {
    let Ok(creds) = decode_credentials(data) else {
        return;
    };

    // Whatever came off flash, validation must return, not panic.
    let _ = creds.validate();

    let bytes = encode_credentials(&creds).expect("decoded record must re-encode");
    assert!(bytes.len() <= MAX_BLOB_SIZE);
    let again = decode_credentials(&bytes).expect("re-encoded record must decode");
    assert_eq!(creds, again);
});
