//! Fuzz target for rules.json parsing.
//!
//! Parsing and validation must return errors, never panic.

#![no_main]

use fw_config::Rules;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Ok(rules) = Rules::parse_json(data) {
        let _ = rules.validate();
    }
});
