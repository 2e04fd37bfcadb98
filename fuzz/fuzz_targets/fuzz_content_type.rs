//! Fuzz target for Content-type charset extraction.
//!
//! Arbitrary header values must never panic, and a recognised charset
//! must produce a Payload whose bytes are valid UTF-8.

#![no_main]

use data_replicator::origin::charset_from_content_type;
use data_replicator::Payload;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (&str, &[u8])| {
    let (header, body) = data;

    if let Ok(Some(charset)) = charset_from_content_type(header) {
        let payload = Payload::with_charset(body.to_vec(), charset);
        assert!(std::str::from_utf8(payload.as_bytes()).is_ok());
        assert_eq!(payload.known_charset(), Some(encoding_rs::UTF_8));
    }
});
