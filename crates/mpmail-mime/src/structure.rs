//! MIME structure planning.
//!
//! | text | html    | attachments | images rewritten | layout                      |
//! |------|---------|-------------|------------------|-----------------------------|
//! | any  | none    | none        | n/a              | single-part `text/plain`    |
//! | any  | present | any         | false            | `multipart/mixed`           |
//! | any  | any     | ≥1          | false            | `multipart/mixed`           |
//! | any  | any     | ≥1          | true             | `multipart/related`         |
//!
//! Inside a multipart message, text and HTML together are nested as a
//! `multipart/alternative` part; attachments follow as siblings.

/// Top-level layout of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// A single base64 `text/plain` body, no boundaries.
    SinglePart,
    /// `multipart/mixed`.
    Mixed,
    /// `multipart/related`, used when HTML references inline images.
    Related,
}

impl Layout {
    /// Checks if the layout uses boundaries.
    #[must_use]
    pub const fn is_multipart(self) -> bool {
        !matches!(self, Self::SinglePart)
    }
}

/// Text parts of a multipart message, emitted before any attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyParts {
    /// No text parts.
    None,
    /// Only `text/plain`.
    Text,
    /// Only `text/html`.
    Html,
    /// `text/plain` then `text/html`, nested in `multipart/alternative`.
    Alternative,
}

/// Decided message shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    /// Top-level layout.
    pub layout: Layout,
    /// Text parts inside a multipart layout. Always [`BodyParts::None`] for
    /// [`Layout::SinglePart`].
    pub body: BodyParts,
}

/// Decides the message shape.
///
/// `related` is whether any HTML reference was rewritten to an inline image.
#[must_use]
pub const fn plan(has_text: bool, has_html: bool, attachment_count: usize, related: bool) -> Plan {
    if !has_html && attachment_count == 0 {
        return Plan {
            layout: Layout::SinglePart,
            body: BodyParts::None,
        };
    }

    let layout = if related { Layout::Related } else { Layout::Mixed };
    let body = match (has_text, has_html) {
        (true, true) => BodyParts::Alternative,
        (true, false) => BodyParts::Text,
        (false, true) => BodyParts::Html,
        (false, false) => BodyParts::None,
    };

    Plan { layout, body }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_only_is_single_part() {
        let plan = plan(true, false, 0, false);
        assert_eq!(plan.layout, Layout::SinglePart);
        assert!(!plan.layout.is_multipart());
    }

    #[test]
    fn test_empty_message_is_single_part() {
        assert_eq!(plan(false, false, 0, false).layout, Layout::SinglePart);
    }

    #[test]
    fn test_text_and_html() {
        let plan = plan(true, true, 0, false);
        assert_eq!(plan.layout, Layout::Mixed);
        assert_eq!(plan.body, BodyParts::Alternative);
    }

    #[test]
    fn test_html_only() {
        let plan = plan(false, true, 0, false);
        assert_eq!(plan.layout, Layout::Mixed);
        assert_eq!(plan.body, BodyParts::Html);
    }

    #[test]
    fn test_text_with_attachment() {
        let plan = plan(true, false, 2, false);
        assert_eq!(plan.layout, Layout::Mixed);
        assert_eq!(plan.body, BodyParts::Text);
    }

    #[test]
    fn test_attachments_only() {
        let plan = plan(false, false, 1, false);
        assert_eq!(plan.layout, Layout::Mixed);
        assert_eq!(plan.body, BodyParts::None);
    }

    #[test]
    fn test_related() {
        let plan = plan(true, true, 1, true);
        assert_eq!(plan.layout, Layout::Related);
        assert_eq!(plan.body, BodyParts::Alternative);
    }
}
