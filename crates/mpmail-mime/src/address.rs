//! Email address parsing and header encoding.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::encoding::encode_rfc2047;

/// `Display Name <local@domain>`, with optional whitespace before the bracket.
#[allow(clippy::expect_used)]
static ADDRESS_WITH_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.+?)\s*<([^<>]+@[^<>]+)>$").expect("address pattern is valid")
});

/// Parsed view of an address string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    name: Option<String>,
    mailbox: String,
}

impl Address {
    /// Parses `Name <local@domain>` or a bare mailbox.
    ///
    /// Anything that does not match the named form is taken as a bare mailbox
    /// without validation.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match ADDRESS_WITH_NAME.captures(raw) {
            Some(caps) => Self {
                name: Some(caps[1].to_string()),
                mailbox: caps[2].to_string(),
            },
            None => Self {
                name: None,
                mailbox: raw.to_string(),
            },
        }
    }

    /// Returns the display name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the mailbox (`local@domain` for well-formed input).
    #[must_use]
    pub fn mailbox(&self) -> &str {
        &self.mailbox
    }
}

/// Formats the address for a header: the display name is RFC 2047 encoded.
impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} <{}>", encode_rfc2047(name), self.mailbox),
            None => f.write_str(&self.mailbox),
        }
    }
}

/// Encodes a single address for use in a header.
///
/// Input that does not carry a display name is returned unchanged.
#[must_use]
pub fn encode_address(raw: &str) -> String {
    let address = Address::parse(raw);
    if address.name.is_some() {
        address.to_string()
    } else {
        raw.to_string()
    }
}

/// Encodes a recipient list separated by `,` or `;`.
///
/// Segments are trimmed, empty ones dropped, and the rest joined with `", "`.
#[must_use]
pub fn encode_address_list(raw: &str) -> String {
    raw.split([',', ';'])
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(encode_address)
        .collect::<Vec<_>>()
        .join(", ")
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
    use crate::encoding::encode_base64;

    #[test]
    fn test_parse_named() {
        let addr = Address::parse("John Doe <john@example.com>");
        assert_eq!(addr.name(), Some("John Doe"));
        assert_eq!(addr.mailbox(), "john@example.com");
    }

    #[test]
    fn test_parse_without_space() {
        let addr = Address::parse("John<john@example.com>");
        assert_eq!(addr.name(), Some("John"));
        assert_eq!(addr.mailbox(), "john@example.com");
    }

    #[test]
    fn test_parse_bare() {
        let addr = Address::parse("  john@example.com ");
        assert_eq!(addr.name(), None);
        assert_eq!(addr.mailbox(), "john@example.com");
    }

    #[test]
    fn test_parse_mailbox_excludes_brackets() {
        let addr = Address::parse("A <b@c> <d@e>");
        assert_eq!(addr.name(), Some("A <b@c>"));
        assert_eq!(addr.mailbox(), "d@e");

        let addr = Address::parse("A <b@c>>");
        assert_eq!(addr.name(), None);
    }

    #[test]
    fn test_parse_brackets_only() {
        let addr = Address::parse("<john@example.com>");
        assert_eq!(addr.name(), None);
    }

    #[test]
    fn test_encode_named() {
        let encoded = encode_address("Name <a@b>");
        let name = encode_base64(b"Name");
        assert_eq!(encoded, format!("=?UTF-8?B?{name}?= <a@b>"));
    }

    #[test]
    fn test_encode_non_ascii_name() {
        assert_eq!(
            encode_address("Jörg <j@example.de>"),
            "=?UTF-8?B?SsO2cmc=?= <j@example.de>"
        );
    }

    #[test]
    fn test_encode_bare_unchanged() {
        assert_eq!(encode_address("a@b"), "a@b");
        assert_eq!(encode_address("not an address"), "not an address");
    }

    #[test]
    fn test_encode_list() {
        let encoded = encode_address_list("A <a@x>, b@y; C <c@z>");
        let expected = format!(
            "=?UTF-8?B?{}?= <a@x>, b@y, =?UTF-8?B?{}?= <c@z>",
            encode_base64(b"A"),
            encode_base64(b"C")
        );
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_encode_list_drops_empty_segments() {
        assert_eq!(encode_address_list("a@x,;b@y,"), "a@x, b@y");
        assert_eq!(encode_address_list(" , ; "), "");
    }
}
