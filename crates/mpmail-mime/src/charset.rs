//! Declared charset handling and conversion to UTF-8.

use tracing::debug;

use crate::error::{Error, Result};

/// Charset used when none is declared.
pub const DEFAULT_CHARSET: &str = "UTF-8";

/// Converts bytes in a named charset to UTF-8.
///
/// Only invoked for header values (addresses, subject, filenames) when the
/// message's declared charset is not UTF-8. Bodies keep their declared
/// charset.
pub trait Recode: Send + Sync {
    /// Converts `bytes`, encoded in `source_charset`, to a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns an error if the charset is not supported.
    fn recode(&self, bytes: &[u8], source_charset: &str) -> Result<String>;
}

/// [`Recode`] implementation backed by `encoding_rs`.
///
/// Accepts any WHATWG encoding label. Malformed input sequences are replaced
/// with U+FFFD.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodingRsRecoder;

impl Recode for EncodingRsRecoder {
    fn recode(&self, bytes: &[u8], source_charset: &str) -> Result<String> {
        let encoding = encoding_rs::Encoding::for_label(source_charset.trim().as_bytes())
            .ok_or_else(|| Error::UnsupportedCharset(source_charset.to_string()))?;

        let (decoded, had_errors) = encoding.decode_without_bom_handling(bytes);
        if had_errors {
            debug!(charset = source_charset, "Replaced malformed sequences while recoding");
        }
        Ok(decoded.into_owned())
    }
}

/// Returns true if the charset label names UTF-8.
#[must_use]
pub fn is_utf8(charset: &str) -> bool {
    let charset = charset.trim();
    charset.eq_ignore_ascii_case("utf-8") || charset.eq_ignore_ascii_case("utf8")
}

/// Converts header input to UTF-8.
///
/// UTF-8 input passes through without the recoder being consulted.
///
/// # Errors
///
/// Returns an error if the recoder rejects the charset.
pub fn to_utf8(bytes: &[u8], charset: &str, recoder: &dyn Recode) -> Result<String> {
    if is_utf8(charset) {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    } else {
        recoder.recode(bytes, charset)
    }
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

    struct PanickingRecoder;

    impl Recode for PanickingRecoder {
        fn recode(&self, _bytes: &[u8], _source_charset: &str) -> Result<String> {
            panic!("recoder must not be called for UTF-8");
        }
    }

    #[test]
    fn test_is_utf8() {
        assert!(is_utf8("UTF-8"));
        assert!(is_utf8("utf-8"));
        assert!(is_utf8("utf8"));
        assert!(!is_utf8("windows-1251"));
    }

    #[test]
    fn test_utf8_passthrough() {
        let text = to_utf8("Привет".as_bytes(), "UTF-8", &PanickingRecoder).unwrap();
        assert_eq!(text, "Привет");
    }

    #[test]
    fn test_recode_windows_1251() {
        // "Привет" in windows-1251
        let bytes = [0xCF, 0xF0, 0xE8, 0xE2, 0xE5, 0xF2];
        let text = to_utf8(&bytes, "windows-1251", &EncodingRsRecoder).unwrap();
        assert_eq!(text, "Привет");
    }

    #[test]
    fn test_recode_latin1() {
        let text = EncodingRsRecoder.recode(&[0x48, 0xE9], "ISO-8859-1").unwrap();
        assert_eq!(text, "Hé");
    }

    #[test]
    fn test_unknown_charset() {
        let err = EncodingRsRecoder.recode(b"abc", "x-no-such-charset").unwrap_err();
        assert!(matches!(err, Error::UnsupportedCharset(name) if name == "x-no-such-charset"));
    }
}
