//! Property-based tests using proptest.
//!
//! These tests verify invariants that should hold for all inputs,
//! helping catch edge cases that unit tests might miss.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use data_replicator::cache::{artifact_prefix, parse_artifact_timestamp};
use data_replicator::encoding::{self, CANDIDATES};
use data_replicator::job::ChangeDetector;
use data_replicator::origin::charset_from_content_type;
use data_replicator::{Endpoint, FileCache, Observer, Payload};
use encoding_rs::{ISO_8859_15, UTF_8};
use proptest::prelude::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// =============================================================================
// Encoding Guesser Properties
// =============================================================================

proptest! {
    /// Any valid UTF-8 text is guessed as UTF-8
    #[test]
    fn guess_valid_utf8_is_utf8(text in any::<String>()) {
        prop_assert_eq!(encoding::guess(text.as_bytes()), UTF_8);
    }

    /// The guess is the first candidate that decodes cleanly
    #[test]
    fn guess_is_first_clean_candidate(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let expected = CANDIDATES
            .iter()
            .copied()
            .find(|candidate| encoding::decodes_cleanly(candidate, &bytes))
            .unwrap_or(encoding::DEFAULT_CHARSET);
        prop_assert_eq!(encoding::guess(&bytes), expected);
    }

    /// Bytes that are not UTF-8 are read as ISO-8859-15, which maps every byte
    #[test]
    fn guess_non_utf8_is_latin9(bytes in prop::collection::vec(any::<u8>(), 1..256)) {
        prop_assume!(std::str::from_utf8(&bytes).is_err());
        prop_assert_eq!(encoding::guess(&bytes), ISO_8859_15);
    }

    /// Payload text always round-trips for UTF-8 input
    #[test]
    fn payload_text_matches_utf8_input(text in any::<String>()) {
        let payload = Payload::new(text.clone().into_bytes());
        prop_assert_eq!(payload.text(), text.as_str());
    }
}

// =============================================================================
// Fingerprint & Change Detection Properties
// =============================================================================

proptest! {
    /// Equal bytes always give equal fingerprints
    #[test]
    fn fingerprint_is_deterministic(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        prop_assert_eq!(
            Payload::new(bytes.clone()).fingerprint(),
            Payload::new(bytes).fingerprint()
        );
    }

    /// The observer sees exactly the values that differ from the previous delivery
    #[test]
    fn detector_suppresses_consecutive_duplicates(
        values in prop::collection::vec(prop::sample::select(vec!["A=1", "A=2", "B=7", ""]), 0..40)
    ) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut detector = ChangeDetector::new(Observer::text(move |text| {
            sink.lock().unwrap().push(text.to_string());
            Ok(())
        }));

        for value in &values {
            detector.offer(&Payload::new(value.as_bytes().to_vec())).unwrap();
        }

        let mut expected: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        expected.dedup();
        prop_assert_eq!(seen.lock().unwrap().clone(), expected);
    }

    /// Offering the same payload twice in a row calls the observer once
    #[test]
    fn detector_is_idempotent(bytes in prop::collection::vec(any::<u8>(), 0..128)) {
        let calls = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&calls);
        let mut detector = ChangeDetector::new(Observer::binary(move |_| {
            *counter.lock().unwrap() += 1;
            Ok(())
        }));

        let payload = Payload::new(bytes);
        prop_assert!(detector.offer(&payload).unwrap());
        prop_assert!(!detector.offer(&payload).unwrap());
        prop_assert_eq!(*calls.lock().unwrap(), 1);
    }
}

// =============================================================================
// Cache Naming & Retention Properties
// =============================================================================

proptest! {
    /// The artifact prefix decodes back to the endpoint and is file-name safe
    #[test]
    fn artifact_prefix_is_reversible(path in "[a-zA-Z0-9/._-]{0,40}") {
        let endpoint = Endpoint::parse(&format!("https://config.example/{}", path)).unwrap();
        let prefix = artifact_prefix(&endpoint);

        prop_assert!(prefix.ends_with('_'));
        prop_assert!(!prefix.contains('/'));
        let decoded = URL_SAFE_NO_PAD.decode(prefix.trim_end_matches('_')).unwrap();
        prop_assert_eq!(decoded, endpoint.as_str().as_bytes().to_vec());
    }

    /// Every timestamp survives the artifact file name
    #[test]
    fn artifact_name_timestamp_roundtrip(ts in any::<u64>()) {
        let name = format!("cHJlZml4_{}.cache", ts);
        prop_assert_eq!(parse_artifact_timestamp(&name, "cHJlZml4_"), Some(ts));
    }

    /// Names with anything but digits between prefix and suffix never match
    #[test]
    fn artifact_name_rejects_non_digits(middle in "[0-9]{0,5}[^0-9][0-9a-z_.]{0,5}") {
        let name = format!("cHJlZml4_{}.cache", middle);
        prop_assert_eq!(parse_artifact_timestamp(&name, "cHJlZml4_"), None);
    }

    /// Content-type parsing never panics
    #[test]
    fn content_type_parsing_never_panics(value in "\\PC{0,64}") {
        let _ = charset_from_content_type(&value);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// After N updates exactly one artifact remains, holding the last content
    #[test]
    fn retention_keeps_one_artifact(updates in prop::collection::vec("[a-z0-9=]{0,16}", 1..6)) {
        let dir = tempfile::tempdir().unwrap();
        let endpoint = Endpoint::parse("bundle:app.properties").unwrap();
        let cache = FileCache::new(dir.path(), endpoint, Duration::from_secs(3600));

        for content in &updates {
            cache.commit(content.as_bytes()).unwrap();
            cache.cleanup();
        }

        prop_assert_eq!(cache.artifacts().unwrap().len(), 1);
        let last = updates.last().unwrap();
        let payload = cache.load_blocking().unwrap();
        prop_assert_eq!(payload.text(), last.as_str());
    }
}
