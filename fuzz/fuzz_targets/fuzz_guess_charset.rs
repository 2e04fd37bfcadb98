//! Fuzz target for charset guessing and payload decoding.
//!
//! Guessing must never panic, must agree with the candidate order, and
//! decoding with the guessed charset must be lossless.

#![no_main]

use data_replicator::encoding::{self, CANDIDATES};
use data_replicator::Payload;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let guessed = encoding::guess(data);

    // The guess is the first candidate that decodes cleanly
    let first_clean = CANDIDATES
        .iter()
        .copied()
        .find(|candidate| encoding::decodes_cleanly(candidate, data));
    if let Some(first) = first_clean {
        assert_eq!(guessed, first);
    }

    // Valid UTF-8 always wins
    if std::str::from_utf8(data).is_ok() {
        assert_eq!(guessed, encoding_rs::UTF_8);
    }

    let payload = Payload::new(data.to_vec());
    let _ = payload.text();
    assert_eq!(payload.len(), data.len());
});
