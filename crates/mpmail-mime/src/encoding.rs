//! MIME encoding utilities.
//!
//! Supports Base64 body encoding with fixed-width line wrapping and RFC 2047
//! header encoding.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Maximum line length for Base64 encoded bodies (RFC 2045).
pub const MAX_LINE_LENGTH: usize = 76;

/// Encodes data as Base64 on a single line.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encodes data as Base64 split into lines of [`MAX_LINE_LENGTH`] characters.
///
/// Every line, including the last, is terminated by `\n`. Empty input
/// produces an empty string.
#[must_use]
pub fn wrap_base64(data: &[u8]) -> String {
    let encoded = encode_base64(data);
    let mut result = String::with_capacity(encoded.len() + encoded.len() / MAX_LINE_LENGTH + 1);

    // Base64 output is pure ASCII, so byte offsets are char boundaries
    let mut rest = encoded.as_str();
    while !rest.is_empty() {
        let (line, tail) = rest.split_at(rest.len().min(MAX_LINE_LENGTH));
        result.push_str(line);
        result.push('\n');
        rest = tail;
    }

    result
}

/// Encodes a header value using RFC 2047 B-encoding.
///
/// Format: `=?UTF-8?B?encoded-text?=`
///
/// The value is always encoded, even when it is plain ASCII.
#[must_use]
pub fn encode_rfc2047(text: &str) -> String {
    format!("=?UTF-8?B?{}?=", encode_base64(text.as_bytes()))
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_base64_encode() {
        assert_eq!(encode_base64(b"Hello, World!"), "SGVsbG8sIFdvcmxkIQ==");
    }

    #[test]
    fn test_wrap_short() {
        assert_eq!(wrap_base64(b"Hello, World!"), "SGVsbG8sIFdvcmxkIQ==\n");
    }

    #[test]
    fn test_wrap_empty() {
        assert_eq!(wrap_base64(b""), "");
    }

    #[test]
    fn test_wrap_exact_line() {
        // 57 input bytes encode to exactly 76 characters
        let wrapped = wrap_base64(&[0u8; 57]);
        assert_eq!(wrapped.len(), 77);
        assert_eq!(wrapped.matches('\n').count(), 1);
    }

    #[test]
    fn test_wrap_multiple_lines() {
        let wrapped = wrap_base64(&[7u8; 200]);
        let lines: Vec<&str> = wrapped.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[..3].iter().all(|l| l.len() == MAX_LINE_LENGTH));
        assert!(wrapped.ends_with('\n'));
    }

    #[test]
    fn test_rfc2047_ascii_is_encoded() {
        assert_eq!(encode_rfc2047("Hello"), "=?UTF-8?B?SGVsbG8=?=");
    }

    #[test]
    fn test_rfc2047_utf8() {
        assert_eq!(encode_rfc2047("Héllo"), "=?UTF-8?B?SMOpbGxv?=");
    }

    proptest! {
        #[test]
        fn wrapped_lines_decode_to_input(data in proptest::collection::vec(any::<u8>(), 0..600)) {
            let wrapped = wrap_base64(&data);
            prop_assert!(wrapped.lines().all(|l| l.len() <= MAX_LINE_LENGTH));
            let joined: String = wrapped.lines().collect();
            prop_assert_eq!(STANDARD.decode(joined).unwrap(), data);
        }

        #[test]
        fn rfc2047_is_deterministic(text in ".*") {
            prop_assert_eq!(encode_rfc2047(&text), encode_rfc2047(&text));
        }
    }
}
