//! Fuzz target for baseline table reading.
//!
//! The reader must never panic: malformed cells become missing values and
//! structural problems become errors. Every loaded station is named and unique.

#![no_main]

use std::collections::HashSet;

use fw_core::load::read_baseline;
use fw_core::logging::LogContext;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let ctx = LogContext::new("run-fuzz", "host-fuzz");
    if let Ok((stations, report)) = read_baseline(data, &ctx) {
        assert_eq!(stations.len(), report.rows_loaded);
        let mut seen = HashSet::new();
        for station in &stations {
            assert!(!station.name.is_empty());
            assert!(seen.insert(station.name.as_str()));
        }
    }
});
