//! Structured fuzzing for sequence validation and reconciliation.
//!
//! Generates id sequences with occasional gaps and duplicates and checks
//! that a plan is only produced for contiguous sequences starting at 1.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_reconcile
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sqlstep_migrate::{MigrationScript, reconcile, validate_sequence};

/// A generated script.
#[derive(Debug, Arbitrary)]
struct FuzzScript {
    id: u16,
    name: u8,
    body: String,
}

fuzz_target!(|input: Vec<FuzzScript>| {
    let mut scripts: Vec<MigrationScript> = input
        .iter()
        .filter_map(|s| {
            MigrationScript::new(format!("{}_script_{}.sql", s.id, s.name), s.body.clone()).ok()
        })
        .collect();
    scripts.sort_by_key(|s| s.id);

    let contiguous = validate_sequence(&scripts).is_ok();
    let starts_at_one = scripts.first().is_none_or(|s| s.id == 1);

    match reconcile(scripts.clone(), &[]) {
        Ok(plan) => {
            assert!(starts_at_one);
            if contiguous {
                assert_eq!(plan.pending.len(), scripts.len());
            }
        }
        Err(e) => assert!(e.is_integrity_violation()),
    }
});
