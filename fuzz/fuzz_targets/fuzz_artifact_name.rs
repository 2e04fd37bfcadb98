//! Fuzz target for cache artifact name parsing.
//!
//! Tests that arbitrary directory entries never panic the parser and that
//! only `<prefix><digits>.cache` names are accepted.

#![no_main]

use data_replicator::cache::parse_artifact_timestamp;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (&str, &str)| {
    let (name, prefix) = data;

    if let Some(timestamp) = parse_artifact_timestamp(name, prefix) {
        // Accepted names are prefix, digits and suffix
        let digits = &name[prefix.len()..name.len() - ".cache".len()];
        assert!(digits.bytes().all(|b| b.is_ascii_digit()));
        assert_eq!(digits.parse::<u64>().ok(), Some(timestamp));
    }

    // Rendered names always parse back
    if let Some(value) = name.len().checked_mul(31) {
        let rendered = format!("{}{}.cache", prefix, value);
        assert_eq!(parse_artifact_timestamp(&rendered, prefix), Some(value as u64));
    }
});
