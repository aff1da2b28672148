//! MIME content type rendering.

use std::fmt;

/// MIME content type with ordered parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Media type as given (e.g., "text/plain", "image/png").
    pub mime_type: String,
    /// Parameters in output order (e.g., charset, boundary, name).
    pub parameters: Vec<(String, String)>,
}

impl ContentType {
    /// Creates a new content type without parameters.
    #[must_use]
    pub fn new(mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            parameters: Vec::new(),
        }
    }

    /// Creates a text/plain content type.
    #[must_use]
    pub fn text_plain(charset: &str) -> Self {
        Self::new("text/plain").with_parameter("charset", charset)
    }

    /// Creates a text/html content type.
    #[must_use]
    pub fn text_html(charset: &str) -> Self {
        Self::new("text/html").with_parameter("charset", charset)
    }

    /// Creates a multipart/mixed content type with boundary.
    #[must_use]
    pub fn multipart_mixed(boundary: impl Into<String>) -> Self {
        Self::new("multipart/mixed").with_parameter("boundary", boundary)
    }

    /// Creates a multipart/alternative content type with boundary.
    #[must_use]
    pub fn multipart_alternative(boundary: impl Into<String>) -> Self {
        Self::new("multipart/alternative").with_parameter("boundary", boundary)
    }

    /// Creates a multipart/related content type with boundary.
    #[must_use]
    pub fn multipart_related(boundary: impl Into<String>) -> Self {
        Self::new("multipart/related").with_parameter("boundary", boundary)
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push((key.into(), value.into()));
        self
    }

    /// Returns a parameter value if present.
    #[must_use]
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the boundary parameter if present.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameter("boundary")
    }

    /// Checks if this is a multipart content type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.mime_type
            .get(..10)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("multipart/"))
    }
}

fn is_tspecial(c: char) -> bool {
    c.is_whitespace() || "()<>@,;:\\\"/[]?=".contains(c)
}

/// Charset values are written bare; every other value is quoted.
impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.mime_type)?;

        for (key, value) in &self.parameters {
            if key.eq_ignore_ascii_case("charset") && !value.contains(is_tspecial) {
                write!(f, "; {key}={value}")?;
            } else {
                write!(f, "; {key}=\"{value}\"")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_plain() {
        let ct = ContentType::text_plain("UTF-8");
        assert_eq!(ct.to_string(), "text/plain; charset=UTF-8");
        assert!(!ct.is_multipart());
    }

    #[test]
    fn test_multipart_mixed() {
        let ct = ContentType::multipart_mixed("mpm-part-123");
        assert_eq!(ct.boundary(), Some("mpm-part-123"));
        assert!(ct.is_multipart());
        assert_eq!(ct.to_string(), "multipart/mixed; boundary=\"mpm-part-123\"");
    }

    #[test]
    fn test_multipart_related() {
        let ct = ContentType::multipart_related("b");
        assert_eq!(ct.to_string(), "multipart/related; boundary=\"b\"");
    }

    #[test]
    fn test_name_parameter_quoted() {
        let ct = ContentType::new("image/png").with_parameter("name", "=?UTF-8?B?bG9nby5wbmc=?=");
        assert_eq!(
            ct.to_string(),
            "image/png; name=\"=?UTF-8?B?bG9nby5wbmc=?=\""
        );
    }

    #[test]
    fn test_parameter_order_preserved() {
        let ct = ContentType::new("text/plain")
            .with_parameter("charset", "iso-8859-1")
            .with_parameter("format", "flowed");

        assert_eq!(ct.parameter("CHARSET"), Some("iso-8859-1"));
        assert_eq!(
            ct.to_string(),
            "text/plain; charset=iso-8859-1; format=\"flowed\""
        );
    }
}
