//! Fuzz target for time-bin label parsing.

#![no_main]

use fw_common::TimeBin;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Ok(bin) = data.parse::<TimeBin>() {
        assert_eq!(bin.label().parse::<TimeBin>().ok(), Some(bin));
    }
});
