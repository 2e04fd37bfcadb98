// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! One fetched (or cached) version of the replicated resource.

use crate::encoding;
use bytes::Bytes;
use encoding_rs::{Encoding, UTF_8};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::Hasher;
use std::sync::OnceLock;

/// Immutable resource content plus its fingerprint.
///
/// Text is decoded lazily on first access, with the known charset if the
/// origin supplied one and with [`encoding::guess`] otherwise.
#[derive(Clone)]
pub struct Payload {
    bytes: Bytes,
    fingerprint: u64,
    charset: Option<&'static Encoding>,
    text: OnceLock<String>,
}

impl Payload {
    /// Payload with no charset metadata; text is decoded heuristically.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self {
            fingerprint: fingerprint(&bytes),
            bytes,
            charset: None,
            text: OnceLock::new(),
        }
    }

    /// Payload whose charset was declared by the origin.
    ///
    /// The bytes are transcoded to UTF-8 so that binary observers and the
    /// cache see the same normalised content and a later heuristic decode
    /// of the cached copy yields the same text.
    pub fn with_charset(bytes: impl Into<Bytes>, charset: &'static Encoding) -> Self {
        let bytes = bytes.into();
        let normalised = if charset == UTF_8 && std::str::from_utf8(&bytes).is_ok() {
            bytes
        } else {
            let (text, _) = charset.decode_without_bom_handling(&bytes);
            Bytes::from(text.into_owned().into_bytes())
        };
        Self {
            fingerprint: fingerprint(&normalised),
            bytes: normalised,
            charset: Some(UTF_8),
            text: OnceLock::new(),
        }
    }

    /// Raw content.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Raw content as a cheaply clonable buffer.
    pub fn bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    /// 64-bit content fingerprint used for change detection.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Charset declared by the origin, if any.
    pub fn known_charset(&self) -> Option<&'static Encoding> {
        self.charset
    }

    /// Charset used to decode the text.
    pub fn charset(&self) -> &'static Encoding {
        self.charset.unwrap_or_else(|| encoding::guess(&self.bytes))
    }

    /// Decoded text (computed once).
    pub fn text(&self) -> &str {
        self.text.get_or_init(|| {
            let (text, _) = self.charset().decode_without_bom_handling(&self.bytes);
            text.into_owned()
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("len", &self.bytes.len())
            .field("fingerprint", &format_args!("{:016x}", self.fingerprint))
            .field("charset", &self.charset.map(Encoding::name))
            .finish()
    }
}

/// SipHash of the content with fixed keys. Only used to spot changes.
///
/// Stable within a build, not across Rust releases, so it is never persisted.
pub fn fingerprint(bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    hasher.write(bytes);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{BIG5, ISO_8859_15, WINDOWS_1252};

    #[test]
    fn test_fingerprint_stable_for_same_bytes() {
        let a = Payload::new(b"A=1".to_vec());
        let b = Payload::new(Bytes::from_static(b"A=1"));
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_fingerprint_covers_length() {
        assert_ne!(fingerprint(b""), fingerprint(b"\0"));
        assert_ne!(fingerprint(b"A=1"), fingerprint(b"A=1\0"));
        assert_eq!(Payload::new(Vec::new()).fingerprint(), fingerprint(b""));
    }

    #[test]
    fn test_fingerprint_differs_for_different_bytes() {
        let a = Payload::new(b"A=1".to_vec());
        let b = Payload::new(b"A=2".to_vec());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_heuristic_text() {
        let payload = Payload::new(b"German=Gr\xFC\xDFe".to_vec());
        assert!(payload.known_charset().is_none());
        assert_eq!(payload.charset(), ISO_8859_15);
        assert_eq!(payload.text(), "German=Grüße");
    }

    #[test]
    fn test_declared_charset_transcodes_to_utf8() {
        let payload = Payload::with_charset(b"German=Gr\xFC\xDFe".to_vec(), WINDOWS_1252);
        assert_eq!(payload.known_charset(), Some(UTF_8));
        assert_eq!(payload.as_bytes(), "German=Grüße".as_bytes());
        assert_eq!(payload.text(), "German=Grüße");
    }

    #[test]
    fn test_declared_big5_survives_heuristic_reload() {
        let (encoded, _, _) = BIG5.encode("Chinese=你好世界");
        let fetched = Payload::with_charset(encoded.into_owned(), BIG5);
        assert_eq!(fetched.text(), "Chinese=你好世界");

        // the cache stores the normalised bytes without charset metadata
        let reloaded = Payload::new(fetched.bytes());
        assert_eq!(reloaded.text(), "Chinese=你好世界");
        assert_eq!(reloaded.fingerprint(), fetched.fingerprint());
    }

    #[test]
    fn test_declared_utf8_keeps_buffer() {
        let raw = Bytes::from_static("Greek=Γειά".as_bytes());
        let payload = Payload::with_charset(raw.clone(), UTF_8);
        assert_eq!(payload.bytes(), raw);
        assert_eq!(payload.fingerprint(), fingerprint(&raw));
    }

    #[test]
    fn test_empty_payload() {
        let payload = Payload::new(Vec::new());
        assert!(payload.is_empty());
        assert_eq!(payload.text(), "");
    }

    #[test]
    fn test_debug_hides_content() {
        let payload = Payload::new(b"secret=hunter2".to_vec());
        let debug = format!("{:?}", payload);
        assert!(debug.contains("len: 14"));
        assert!(!debug.contains("hunter2"));
    }
}
