//! Fuzz target for script filename parsing.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_script_id
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use sqlstep_migrate::{MigrationScript, parse_script_id};

fuzz_target!(|data: &[u8]| {
    if let Ok(filename) = std::str::from_utf8(data) {
        // Never panics; an accepted id is non-negative and reproduces the prefix digits.
        if let Ok(id) = parse_script_id(filename) {
            assert!(id >= 0);
            let prefix: String = filename.chars().take_while(|c| c.is_ascii_digit()).collect();
            assert_eq!(prefix.parse::<i64>().ok(), Some(id));

            let script = MigrationScript::new(filename, "SELECT 1;").unwrap();
            assert_eq!(script.id, id);
            assert_eq!(script.fingerprint.len(), 32);
        }
    }
});
