// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Heuristic charset detection.
//!
//! [`guess`] trial-decodes the bytes with a fixed list of candidates and
//! returns the first one that decodes without a single error. It ignores
//! byte-order marks and does no statistics, so it can pick a wrong
//! single-byte code page (Big5 input, for example, reads as ISO-8859-15).
//! Origins that know the charset pass it to [`Payload::with_charset`]
//! instead.
//!
//! ISO-8859-15 maps every byte, so in practice windows-1253 is only reached
//! by inputs that are already rejected earlier. The order is kept as is:
//! callers rely on which charset wins.
//!
//! [`Payload::with_charset`]: crate::payload::Payload::with_charset

use encoding_rs::{Encoding, ISO_8859_15, UTF_8, WINDOWS_1253};

/// Candidates in the order they are tried.
pub const CANDIDATES: [&Encoding; 3] = [UTF_8, ISO_8859_15, WINDOWS_1253];

/// Charset returned when no candidate decodes the bytes.
pub const DEFAULT_CHARSET: &Encoding = UTF_8;

/// Guess the charset of `bytes`. Never fails.
pub fn guess(bytes: &[u8]) -> &'static Encoding {
    CANDIDATES
        .iter()
        .copied()
        .find(|encoding| decodes_cleanly(encoding, bytes))
        .unwrap_or(DEFAULT_CHARSET)
}

/// Whether `encoding` decodes every byte of `bytes` without replacement.
pub fn decodes_cleanly(encoding: &'static Encoding, bytes: &[u8]) -> bool {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .is_some()
}
