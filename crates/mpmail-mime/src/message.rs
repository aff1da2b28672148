//! The message being composed.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::warn;

use crate::attachment::{Attachment, AttachmentId, AttachmentStore};
use crate::charset::DEFAULT_CHARSET;
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::token::{TokenSource, UniqueTokens};

/// A message under construction.
///
/// Textual fields are byte strings in the message's declared charset, so
/// both `&str` and raw bytes can be passed to the setters. Empty values are
/// treated as unset when composing.
#[derive(Clone)]
pub struct Message {
    charset: String,
    text: Option<Vec<u8>>,
    html: Option<Vec<u8>>,
    from: Option<Vec<u8>>,
    to: Option<Vec<u8>>,
    reply_to: Option<Vec<u8>>,
    subject: Option<Vec<u8>>,
    headers: Headers,
    attachments: AttachmentStore,
    tokens: Arc<dyn TokenSource>,
}

impl Message {
    /// Creates an empty UTF-8 message.
    #[must_use]
    pub fn new() -> Self {
        Self::with_charset(DEFAULT_CHARSET)
    }

    /// Creates an empty message whose text is in `charset`.
    #[must_use]
    pub fn with_charset(charset: impl Into<String>) -> Self {
        Self::with_tokens(charset, Arc::new(UniqueTokens::new()))
    }

    /// Creates an empty message drawing boundaries and content IDs from
    /// `tokens`.
    #[must_use]
    pub fn with_tokens(charset: impl Into<String>, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            charset: charset.into(),
            text: None,
            html: None,
            from: None,
            to: None,
            reply_to: None,
            subject: None,
            headers: Headers::new(),
            attachments: AttachmentStore::new(Arc::clone(&tokens)),
            tokens,
        }
    }

    /// Sets the plain text body.
    pub fn text(&mut self, text: impl Into<Vec<u8>>) -> &mut Self {
        self.text = Some(text.into());
        self
    }

    /// Sets the HTML body.
    pub fn html(&mut self, html: impl Into<Vec<u8>>) -> &mut Self {
        self.html = Some(html.into());
        self
    }

    /// Sets the sender (`addr@example.com` or `Name <addr@example.com>`).
    pub fn from(&mut self, from: impl Into<Vec<u8>>) -> &mut Self {
        self.from = Some(from.into());
        self
    }

    /// Sets the recipients, separated by `,` or `;`.
    pub fn to(&mut self, to: impl Into<Vec<u8>>) -> &mut Self {
        self.to = Some(to.into());
        self
    }

    /// Sets the reply-to address. Defaults to the sender.
    pub fn reply_to(&mut self, reply_to: impl Into<Vec<u8>>) -> &mut Self {
        self.reply_to = Some(reply_to.into());
        self
    }

    /// Sets the subject.
    pub fn subject(&mut self, subject: impl Into<Vec<u8>>) -> &mut Self {
        self.subject = Some(subject.into());
        self
    }

    /// Returns the declared charset.
    #[must_use]
    pub fn charset(&self) -> &str {
        &self.charset
    }

    /// Returns the plain text body.
    #[must_use]
    pub fn text_body(&self) -> Option<&[u8]> {
        non_empty(self.text.as_deref())
    }

    /// Returns the HTML body.
    #[must_use]
    pub fn html_body(&self) -> Option<&[u8]> {
        non_empty(self.html.as_deref())
    }

    /// Returns the sender.
    #[must_use]
    pub fn from_address(&self) -> Option<&[u8]> {
        non_empty(self.from.as_deref())
    }

    /// Returns the recipients.
    #[must_use]
    pub fn to_addresses(&self) -> Option<&[u8]> {
        non_empty(self.to.as_deref())
    }

    /// Returns the reply-to address.
    #[must_use]
    pub fn reply_to_address(&self) -> Option<&[u8]> {
        non_empty(self.reply_to.as_deref())
    }

    /// Returns the subject.
    #[must_use]
    pub fn subject_text(&self) -> Option<&[u8]> {
        non_empty(self.subject.as_deref())
    }

    /// Adds a custom header line (`Name: value`).
    ///
    /// A header with the same name, compared case-insensitively, is replaced.
    /// Custom headers may redefine any header the composer generates.
    ///
    /// Returns the lower-cased header name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeaderSyntax`] if the line is malformed.
    pub fn add_header(&mut self, line: &str) -> Result<String> {
        self.headers.insert_raw(line).inspect_err(|_| {
            warn!(header = line, "Invalid header");
        })
    }

    /// Gets a custom header line by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HeaderNotFound`] if no such header was added.
    pub fn header(&self, name: &str) -> Result<&str> {
        self.headers.get(name).ok_or_else(|| header_not_found(name))
    }

    /// Removes a custom header by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HeaderNotFound`] if no such header was added.
    pub fn remove_header(&mut self, name: &str) -> Result<()> {
        self.headers
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| header_not_found(name))
    }

    /// Returns the custom headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Adds an attachment from memory.
    ///
    /// With `inline` set, the attachment gets a content ID and HTML
    /// references to `filename` are rewritten to it when composing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAttachment`] if any field is empty.
    pub fn add_attachment(
        &mut self,
        data: impl Into<Vec<u8>>,
        mime_type: impl Into<String>,
        filename: impl Into<Vec<u8>>,
        inline: bool,
    ) -> Result<AttachmentId> {
        self.attachments.add(data, mime_type, filename, inline)
    }

    /// Adds an attachment read from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, or
    /// [`Error::InvalidAttachment`] if it is empty or a field is missing.
    pub fn attach_file(
        &mut self,
        path: impl AsRef<Path>,
        mime_type: impl Into<String>,
        filename: impl Into<Vec<u8>>,
        inline: bool,
    ) -> Result<AttachmentId> {
        self.attachments.add_file(path, mime_type, filename, inline)
    }

    /// Removes an attachment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AttachmentNotFound`] if there is no such attachment.
    pub fn remove_attachment(&mut self, id: AttachmentId) -> Result<Attachment> {
        self.attachments.remove(id)
    }

    /// Returns the attachments.
    #[must_use]
    pub const fn attachments(&self) -> &AttachmentStore {
        &self.attachments
    }

    /// Returns the token source used for boundaries and content IDs.
    #[must_use]
    pub fn tokens(&self) -> &dyn TokenSource {
        self.tokens.as_ref()
    }
}

impl Default for Message {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn lossy(value: &Option<Vec<u8>>) -> Option<std::borrow::Cow<'_, str>> {
            value.as_deref().map(String::from_utf8_lossy)
        }
        f.debug_struct("Message")
            .field("charset", &self.charset)
            .field("from", &lossy(&self.from))
            .field("to", &lossy(&self.to))
            .field("subject", &lossy(&self.subject))
            .field("headers", &self.headers)
            .field("attachments", &self.attachments.len())
            .finish_non_exhaustive()
    }
}

fn non_empty(value: Option<&[u8]>) -> Option<&[u8]> {
    value.filter(|v| !v.is_empty())
}

fn header_not_found(name: &str) -> Error {
    let key = name.trim().to_lowercase();
    warn!(header = %key, "Header not found");
    Error::HeaderNotFound(key)
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
    fn test_defaults() {
        let message = Message::new();
        assert_eq!(message.charset(), "UTF-8");
        assert!(message.text_body().is_none());
        assert!(message.attachments().is_empty());
        assert!(message.headers().is_empty());
    }

    #[test]
    fn test_setters_and_getters() {
        let mut message = Message::new();
        message
            .from("Sender <sender@example.com>")
            .to("a@example.com; b@example.com")
            .reply_to("replies@example.com")
            .subject("Hello")
            .text("Plain")
            .html("<p>Html</p>");

        assert_eq!(
            message.from_address(),
            Some(b"Sender <sender@example.com>".as_slice())
        );
        assert_eq!(
            message.to_addresses(),
            Some(b"a@example.com; b@example.com".as_slice())
        );
        assert_eq!(
            message.reply_to_address(),
            Some(b"replies@example.com".as_slice())
        );
        assert_eq!(message.subject_text(), Some(b"Hello".as_slice()));
        assert_eq!(message.text_body(), Some(b"Plain".as_slice()));
        assert_eq!(message.html_body(), Some(b"<p>Html</p>".as_slice()));
    }

    #[test]
    fn test_empty_values_are_unset() {
        let mut message = Message::new();
        message.text("").to("");
        assert!(message.text_body().is_none());
        assert!(message.to_addresses().is_none());
    }

    #[test]
    fn test_charset() {
        let message = Message::with_charset("windows-1251");
        assert_eq!(message.charset(), "windows-1251");
    }

    #[test]
    fn test_header_roundtrip() {
        let mut message = Message::new();
        let key = message.add_header("X-Campaign: spring").unwrap();
        assert_eq!(key, "x-campaign");
        assert_eq!(message.header("X-CAMPAIGN").unwrap(), "X-Campaign: spring");

        message.add_header("x-campaign: summer").unwrap();
        assert_eq!(message.headers().len(), 1);
        assert_eq!(message.header("X-Campaign").unwrap(), "x-campaign: summer");
    }

    #[test]
    fn test_invalid_header_no_state_change() {
        let mut message = Message::new();
        assert!(matches!(
            message.add_header("garbage"),
            Err(Error::InvalidHeaderSyntax(_))
        ));
        assert!(message.headers().is_empty());
    }

    #[test]
    fn test_remove_missing_header() {
        let mut message = Message::new();
        message.add_header("X-Keep: 1").unwrap();

        let err = message.remove_header("X-Missing").unwrap_err();
        assert!(matches!(err, Error::HeaderNotFound(name) if name == "x-missing"));
        assert_eq!(message.headers().len(), 1);
        assert!(matches!(message.header("x-missing"), Err(Error::HeaderNotFound(_))));
    }

    #[test]
    fn test_remove_header() {
        let mut message = Message::new();
        message.add_header("X-Drop: 1").unwrap();
        message.remove_header("x-drop").unwrap();
        assert!(message.headers().is_empty());
    }

    #[test]
    fn test_empty_attachment_rejected() {
        let mut message = Message::new();
        let err = message
            .add_attachment(Vec::new(), "image/png", "logo.png", true)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAttachment(_)));
        assert_eq!(message.attachments().len(), 0);
    }

    #[test]
    fn test_attachment_roundtrip() {
        let mut message = Message::new();
        let id = message
            .add_attachment(b"%PDF".to_vec(), "application/pdf", "doc.pdf", false)
            .unwrap();
        assert_eq!(message.attachments().len(), 1);
        message.remove_attachment(id).unwrap();
        assert!(message.attachments().is_empty());
        assert!(matches!(
            message.remove_attachment(id),
            Err(Error::AttachmentNotFound(_))
        ));
    }

    #[test]
    fn test_shared_token_source() {
        let tokens: Arc<dyn TokenSource> = Arc::new(UniqueTokens::with_seed(7));
        let mut message = Message::with_tokens("UTF-8", Arc::clone(&tokens));
        let id = message
            .add_attachment(b"x".to_vec(), "image/gif", "a.gif", true)
            .unwrap();

        let cid = message.attachments().get(id).unwrap().content_id().unwrap();
        assert_eq!(cid, "cid-000000000000000700000000");
        assert_eq!(message.tokens().next_token(), "000000000000000700000001");
    }
}
