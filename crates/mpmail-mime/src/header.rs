//! MIME header handling.

use std::fmt;

use crate::error::{Error, Result};

/// Ordered collection of header lines keyed by lower-cased header name.
///
/// Each name maps to one complete `Name: value` line. Setting a name that is
/// already present replaces its line in place, so output order is the order
/// in which names were first inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    lines: Vec<(String, String)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a header from its name and value, replacing any existing line.
    pub fn set(&mut self, name: &str, value: impl fmt::Display) {
        self.set_line(name, format!("{name}: {value}"));
    }

    /// Sets a complete header line under the given name.
    pub fn set_line(&mut self, name: &str, line: impl Into<String>) {
        let key = name.trim().to_lowercase();
        let line = line.into();
        match self.lines.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = line,
            None => self.lines.push((key, line)),
        }
    }

    /// Parses and stores a raw `Name: value` line.
    ///
    /// Returns the lower-cased header name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeaderSyntax`] if the line has no name, no
    /// value, or contains a line break.
    pub fn insert_raw(&mut self, line: &str) -> Result<String> {
        let name = parse_name(line).ok_or_else(|| Error::InvalidHeaderSyntax(line.to_string()))?;
        let key = name.to_lowercase();
        self.set_line(&key, line);
        Ok(key)
    }

    /// Gets the full line for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        let key = name.trim().to_lowercase();
        self.lines
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, line)| line.as_str())
    }

    /// Checks whether a header is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Removes a header, returning its line.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let key = name.trim().to_lowercase();
        let index = self.lines.iter().position(|(k, _)| *k == key)?;
        Some(self.lines.remove(index).1)
    }

    /// Merges `other` into this collection, in order.
    ///
    /// Lines from `other` replace same-named lines here.
    pub fn extend(&mut self, other: &Self) {
        for (key, line) in &other.lines {
            self.set_line(key, line.clone());
        }
    }

    /// Returns the number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns an iterator over `(lower-cased name, line)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Returns the header name of a `Name: value` line.
///
/// Names are RFC 5322 field names (printable ASCII, no spaces) and the line
/// must be a single line.
fn parse_name(line: &str) -> Option<&str> {
    if line.contains(['\r', '\n']) {
        return None;
    }

    let (name, value) = line.split_once(':')?;
    let name = name.trim();
    let valid_name = !name.is_empty() && name.chars().all(|c| c.is_ascii_graphic());
    (valid_name && !value.is_empty()).then_some(name)
}

/// Lines are joined with `\n`, without a trailing newline.
impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (_, line)) in self.lines.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_str(line)?;
        }
        Ok(())
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

    #[test]
    fn test_headers_new() {
        let headers = Headers::new();
        assert!(headers.is_empty());
        assert_eq!(headers.to_string(), "");
    }

    #[test]
    fn test_headers_set_get() {
        let mut headers = Headers::new();
        headers.set("Content-Type", "text/plain");
        assert_eq!(
            headers.get("Content-Type"),
            Some("Content-Type: text/plain")
        );
        // Case insensitive
        assert_eq!(
            headers.get("content-type"),
            Some("Content-Type: text/plain")
        );
    }

    #[test]
    fn test_headers_replace_keeps_position() {
        let mut headers = Headers::new();
        headers.set("From", "a@example.com");
        headers.set("Subject", "Hi");
        headers.set_line("FROM", "FROM: b@example.com");

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.to_string(), "FROM: b@example.com\nSubject: Hi");
    }

    #[test]
    fn test_headers_remove() {
        let mut headers = Headers::new();
        headers.set("Subject", "Test");
        assert_eq!(headers.remove("subject"), Some("Subject: Test".to_string()));
        assert!(!headers.contains("Subject"));
        assert_eq!(headers.remove("Subject"), None);
    }

    #[test]
    fn test_insert_raw() {
        let mut headers = Headers::new();
        let key = headers.insert_raw("X-Priority: 1 (Highest)").unwrap();
        assert_eq!(key, "x-priority");
        assert_eq!(headers.get("X-PRIORITY"), Some("X-Priority: 1 (Highest)"));
    }

    #[test]
    fn test_insert_raw_value_with_colon() {
        let mut headers = Headers::new();
        let key = headers.insert_raw("List-Unsubscribe: <mailto:u@example.com>").unwrap();
        assert_eq!(key, "list-unsubscribe");
    }

    #[test]
    fn test_insert_raw_invalid() {
        let mut headers = Headers::new();
        let invalid = [
            "no colon",
            ": value",
            "Name:",
            "Bad Name: x",
            "X-A: b\nBcc: c@d",
        ];
        for line in invalid {
            let err = headers.insert_raw(line).unwrap_err();
            assert!(matches!(err, Error::InvalidHeaderSyntax(_)), "{line}");
        }
        assert!(headers.is_empty());
    }

    #[test]
    fn test_extend_overrides() {
        let mut base = Headers::new();
        base.set("From", "a@example.com");
        base.set("Content-Type", "text/plain");

        let mut custom = Headers::new();
        custom.insert_raw("content-type: text/x-custom").unwrap();
        custom.insert_raw("X-Tag: 1").unwrap();

        base.extend(&custom);
        assert_eq!(
            base.to_string(),
            "From: a@example.com\ncontent-type: text/x-custom\nX-Tag: 1"
        );
    }

    #[test]
    fn test_headers_iter() {
        let mut headers = Headers::new();
        headers.set("From", "sender@example.com");
        headers.set("To", "recipient@example.com");

        let names: Vec<&str> = headers.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["from", "to"]);
    }
}
