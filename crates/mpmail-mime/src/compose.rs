//! Message composition.
//!
//! Turns a [`Message`] into a header block and a body ready for a transport.
//! All parts are base64 encoded and lines end with `\n`.

use std::fmt::Write as _;

use tracing::debug;

use crate::address::{encode_address, encode_address_list};
use crate::attachment::Attachment;
use crate::charset::{Recode, to_utf8};
use crate::cid;
use crate::content_type::ContentType;
use crate::encoding::{encode_rfc2047, wrap_base64};
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::message::Message;
use crate::structure::{BodyParts, Layout, Plan, plan};

/// Default `X-Mailer` header value.
pub const DEFAULT_X_MAILER: &str = concat!("mpmail/", env!("CARGO_PKG_VERSION"));

/// Prefix of the outer multipart boundary.
pub const PART_BOUNDARY_PREFIX: &str = "mpm-part-";

/// Prefix of the nested `multipart/alternative` boundary.
pub const ALT_BOUNDARY_PREFIX: &str = "mpm-alt-";

/// Options applied to every composed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeOptions {
    /// Value of the `X-Mailer` header.
    pub x_mailer: String,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            x_mailer: DEFAULT_X_MAILER.to_string(),
        }
    }
}

/// A fully composed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedMessage {
    /// Encoded recipient list.
    pub to: String,
    /// Encoded subject.
    pub subject: String,
    /// Header lines, excluding `To` and `Subject`.
    pub headers: Headers,
    /// Message body.
    pub body: Vec<u8>,
    /// Layout that was chosen.
    pub layout: Layout,
}

impl ComposedMessage {
    /// Returns the header lines joined with `\n`.
    #[must_use]
    pub fn header_block(&self) -> String {
        self.headers.to_string()
    }

    /// Renders the complete message including `To` and `Subject`.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = format!(
            "To: {}\nSubject: {}\n{}\n\n",
            self.to, self.subject, self.headers
        )
        .into_bytes();
        out.extend_from_slice(&self.body);
        out
    }
}

/// Composes a message.
///
/// The message itself is not modified; inline image references are rewritten
/// in a copy of the HTML body.
///
/// # Errors
///
/// Returns [`Error::EmptyRecipient`] if no recipient is set, or an error from
/// `recoder` if header values cannot be converted to UTF-8.
pub fn compose(
    message: &Message,
    options: &ComposeOptions,
    recoder: &dyn Recode,
) -> Result<ComposedMessage> {
    let charset = message.charset();
    let utf8 = |bytes: Option<&[u8]>| to_utf8(bytes.unwrap_or_default(), charset, recoder);

    let raw_to = message.to_addresses().unwrap_or_default();
    if is_blank_list(raw_to) {
        return Err(Error::EmptyRecipient);
    }
    let to = encode_address_list(&utf8(Some(raw_to))?);
    if to.is_empty() {
        return Err(Error::EmptyRecipient);
    }

    let attachments = message.attachments().list();
    let (html, related) = match message.html_body() {
        Some(html) if !attachments.is_empty() => {
            let (html, related) = cid::rewrite(html, attachments);
            (Some(html), related)
        }
        html => (html.map(<[u8]>::to_vec), false),
    };
    let text = message.text_body();

    let plan = plan(text.is_some(), html.is_some(), attachments.len(), related);
    let tokens = message.tokens();
    let boundary = format!("{PART_BOUNDARY_PREFIX}{}", tokens.next_token());
    let alt_boundary = format!("{ALT_BOUNDARY_PREFIX}{}", tokens.next_token());

    let from = encode_address(&utf8(message.from_address())?);
    let reply_to = match message.reply_to_address() {
        Some(reply_to) => encode_address(&utf8(Some(reply_to))?),
        None => from.clone(),
    };
    let subject = encode_rfc2047(&utf8(message.subject_text())?);

    let mut headers = Headers::new();
    headers.set("From", from);
    headers.set("Reply-To", reply_to);
    headers.set("MIME-Version", "1.0");
    headers.set("X-Mailer", &options.x_mailer);
    match plan.layout {
        Layout::SinglePart => {
            headers.set("Content-Type", ContentType::text_plain(charset));
            headers.set("Content-Transfer-Encoding", "base64");
        }
        Layout::Mixed => headers.set("Content-Type", ContentType::multipart_mixed(&*boundary)),
        Layout::Related => headers.set("Content-Type", ContentType::multipart_related(&*boundary)),
    }
    headers.extend(message.headers());

    let mut body = String::new();
    if plan.layout.is_multipart() {
        let bodies = Bodies {
            text: text.unwrap_or_default(),
            html: html.as_deref().unwrap_or_default(),
        };
        write_text_parts(&mut body, &plan, &bodies, charset, &boundary, &alt_boundary);
        for attachment in attachments {
            let filename = encode_rfc2047(&utf8(Some(attachment.filename()))?);
            write_attachment(&mut body, attachment, &filename, &boundary);
        }
        let _ = writeln!(body, "--{boundary}--\n");
    } else {
        body.push_str(&wrap_base64(text.unwrap_or_default()));
        body.push('\n');
    }

    debug!(
        layout = ?plan.layout,
        attachments = attachments.len(),
        body_len = body.len(),
        "Composed message"
    );

    Ok(ComposedMessage {
        to,
        subject,
        headers,
        body: body.into_bytes(),
        layout: plan.layout,
    })
}

/// True if every `,`/`;` separated segment is whitespace.
fn is_blank_list(raw: &[u8]) -> bool {
    raw.split(|&b| matches!(b, b',' | b';'))
        .all(|segment| segment.iter().all(u8::is_ascii_whitespace))
}

struct Bodies<'a> {
    text: &'a [u8],
    html: &'a [u8],
}

fn write_text_parts(
    out: &mut String,
    plan: &Plan,
    bodies: &Bodies<'_>,
    charset: &str,
    boundary: &str,
    alt_boundary: &str,
) {
    let text_type = ContentType::text_plain(charset).to_string();
    let html_type = ContentType::text_html(charset).to_string();

    match plan.body {
        BodyParts::None => {}
        BodyParts::Text => write_part(out, boundary, &text_type, bodies.text),
        BodyParts::Html => write_part(out, boundary, &html_type, bodies.html),
        BodyParts::Alternative => {
            let _ = write!(
                out,
                "--{boundary}\nContent-Type: {}\n\n",
                ContentType::multipart_alternative(alt_boundary)
            );
            write_part(out, alt_boundary, &text_type, bodies.text);
            write_part(out, alt_boundary, &html_type, bodies.html);
            let _ = writeln!(out, "--{alt_boundary}--\n");
        }
    }
}

fn write_attachment(out: &mut String, attachment: &Attachment, filename: &str, boundary: &str) {
    let content_type = ContentType::new(attachment.mime_type()).with_parameter("name", filename);
    let _ = writeln!(out, "--{boundary}");
    if let Some(cid) = attachment.content_id() {
        let _ = writeln!(out, "Content-ID: <{cid}>");
    }
    let _ = writeln!(out, "Content-Type: {content_type}");
    let _ = writeln!(
        out,
        "Content-Disposition: attachment; filename=\"{filename}\""
    );
    out.push_str("Content-Transfer-Encoding: base64\n\n");
    out.push_str(&wrap_base64(attachment.data()));
    out.push('\n');
}

/// Writes a base64 text part.
fn write_part(out: &mut String, boundary: &str, content_type: &str, data: &[u8]) {
    let _ = writeln!(out, "--{boundary}");
    let _ = writeln!(out, "Content-Type: {content_type}");
    out.push_str("Content-Transfer-Encoding: base64\n\n");
    out.push_str(&wrap_base64(data));
    out.push('\n');
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
    use crate::charset::EncodingRsRecoder;
    use crate::token::UniqueTokens;
    use std::sync::Arc;

    fn message() -> Message {
        let mut message = Message::with_tokens("UTF-8", Arc::new(UniqueTokens::with_seed(0x1)));
        message.to("rcpt@example.com").from("sender@example.com");
        message
    }

    fn compose_default(message: &Message) -> ComposedMessage {
        compose(message, &ComposeOptions::default(), &EncodingRsRecoder).unwrap()
    }

    #[test]
    fn test_empty_recipient() {
        let mut message = Message::new();
        message.text("hello");
        let err = compose(&message, &ComposeOptions::default(), &EncodingRsRecoder).unwrap_err();
        assert!(matches!(err, Error::EmptyRecipient));

        message.to(" ; ,");
        let err = compose(&message, &ComposeOptions::default(), &EncodingRsRecoder).unwrap_err();
        assert!(matches!(err, Error::EmptyRecipient));
    }

    #[test]
    fn test_empty_recipient_checked_before_recoding() {
        let mut message = Message::with_charset("x-bogus");
        message.text("hello").subject("s");
        let err = compose(&message, &ComposeOptions::default(), &EncodingRsRecoder).unwrap_err();
        assert!(matches!(err, Error::EmptyRecipient));

        message.to(" , ");
        let err = compose(&message, &ComposeOptions::default(), &EncodingRsRecoder).unwrap_err();
        assert!(matches!(err, Error::EmptyRecipient));

        message.to("a@example.com");
        let err = compose(&message, &ComposeOptions::default(), &EncodingRsRecoder).unwrap_err();
        assert!(matches!(err, Error::UnsupportedCharset(_)));
    }

    #[test]
    fn test_single_part_exact() {
        let mut message = message();
        message.subject("Hi").text("Hello, World!");
        let composed = compose_default(&message);

        assert_eq!(composed.layout, Layout::SinglePart);
        assert_eq!(composed.to, "rcpt@example.com");
        assert_eq!(composed.subject, "=?UTF-8?B?SGk=?=");
        assert_eq!(
            composed.header_block(),
            format!(
                "From: sender@example.com\n\
                 Reply-To: sender@example.com\n\
                 MIME-Version: 1.0\n\
                 X-Mailer: {DEFAULT_X_MAILER}\n\
                 Content-Type: text/plain; charset=UTF-8\n\
                 Content-Transfer-Encoding: base64"
            )
        );
        assert_eq!(composed.body, b"SGVsbG8sIFdvcmxkIQ==\n\n");
    }

    #[test]
    fn test_empty_body_permitted() {
        let composed = compose_default(&message());
        assert_eq!(composed.layout, Layout::SinglePart);
        assert_eq!(composed.body, b"\n");
        assert_eq!(composed.subject, "=?UTF-8?B??=");
    }

    #[test]
    fn test_alternative_exact() {
        let mut message = message();
        message.text("t").html("h");
        let composed = compose_default(&message);

        let part = "mpm-part-000000000000000100000000";
        let alt = "mpm-alt-000000000000000100000001";
        let content_type = format!("Content-Type: multipart/mixed; boundary=\"{part}\"");
        assert_eq!(
            composed.headers.get("content-type"),
            Some(content_type.as_str())
        );
        let expected = format!(
            "--{part}\n\
             Content-Type: multipart/alternative; boundary=\"{alt}\"\n\n\
             --{alt}\n\
             Content-Type: text/plain; charset=UTF-8\n\
             Content-Transfer-Encoding: base64\n\n\
             dA==\n\n\
             --{alt}\n\
             Content-Type: text/html; charset=UTF-8\n\
             Content-Transfer-Encoding: base64\n\n\
             aA==\n\n\
             --{alt}--\n\n\
             --{part}--\n\n"
        );
        assert_eq!(String::from_utf8(composed.body).unwrap(), expected);
    }

    #[test]
    fn test_attachment_part_exact() {
        let mut message = message();
        message.text("t");
        message
            .add_attachment(b"abc".to_vec(), "text/csv", "a.csv", false)
            .unwrap();
        let composed = compose_default(&message);

        let part = "mpm-part-000000000000000100000000";
        let expected = format!(
            "--{part}\n\
             Content-Type: text/plain; charset=UTF-8\n\
             Content-Transfer-Encoding: base64\n\n\
             dA==\n\n\
             --{part}\n\
             Content-Type: text/csv; name=\"=?UTF-8?B?YS5jc3Y=?=\"\n\
             Content-Disposition: attachment; filename=\"=?UTF-8?B?YS5jc3Y=?=\"\n\
             Content-Transfer-Encoding: base64\n\n\
             YWJj\n\n\
             --{part}--\n\n"
        );
        assert_eq!(String::from_utf8(composed.body).unwrap(), expected);
    }

    #[test]
    fn test_related_with_content_id() {
        let mut message = message();
        message.html(r#"<img src="logo.png">"#);
        let id = message
            .add_attachment(b"\x89PNG".to_vec(), "image/png", "logo.png", true)
            .unwrap();
        let cid = message.attachments().get(id).unwrap().content_id().unwrap().to_string();

        let composed = compose_default(&message);
        assert_eq!(composed.layout, Layout::Related);
        assert!(
            composed
                .header_block()
                .contains("Content-Type: multipart/related; boundary=\"mpm-part-")
        );
        let body = String::from_utf8(composed.body).unwrap();
        assert!(body.contains(&format!("Content-ID: <{cid}>\n")));
        assert!(body.contains("Content-Type: text/html; charset=UTF-8"));

        // Message itself is untouched
        assert_eq!(
            message.html_body(),
            Some(br#"<img src="logo.png">"#.as_slice())
        );
    }

    #[test]
    fn test_reply_to_defaults_to_from() {
        let mut message = message();
        message.from("Sender <sender@example.com>");
        let composed = compose_default(&message);
        assert_eq!(
            composed.headers.get("reply-to"),
            Some("Reply-To: =?UTF-8?B?U2VuZGVy?= <sender@example.com>")
        );
    }

    #[test]
    fn test_reply_to_explicit() {
        let mut message = message();
        message.reply_to("Help <help@example.com>");
        let composed = compose_default(&message);
        assert_eq!(
            composed.headers.get("reply-to"),
            Some("Reply-To: =?UTF-8?B?SGVscA==?= <help@example.com>")
        );
    }

    #[test]
    fn test_custom_headers_override_in_place() {
        let mut message = message();
        message.add_header("X-Mailer: custom").unwrap();
        message.add_header("X-Extra: 1").unwrap();
        let composed = compose_default(&message);

        let names: Vec<&str> = composed.headers.iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec![
                "from",
                "reply-to",
                "mime-version",
                "x-mailer",
                "content-type",
                "content-transfer-encoding",
                "x-extra"
            ]
        );
        assert_eq!(composed.headers.get("x-mailer"), Some("X-Mailer: custom"));
    }

    #[test]
    fn test_x_mailer_option() {
        let options = ComposeOptions {
            x_mailer: "acme-mailer/2.0".to_string(),
        };
        let composed = compose(&message(), &options, &EncodingRsRecoder).unwrap();
        assert_eq!(
            composed.headers.get("x-mailer"),
            Some("X-Mailer: acme-mailer/2.0")
        );
    }

    #[test]
    fn test_declared_charset_recodes_headers_only() {
        let mut message =
            Message::with_tokens("windows-1251", Arc::new(UniqueTokens::with_seed(2)));
        // "Тест" in windows-1251
        let cp1251 = vec![0xD2, 0xE5, 0xF1, 0xF2];
        message.to("rcpt@example.com").subject(cp1251.clone()).text(cp1251.clone());

        let composed = compose_default(&message);
        assert_eq!(composed.subject, encode_rfc2047("Тест"));
        assert!(
            composed
                .header_block()
                .contains("Content-Type: text/plain; charset=windows-1251")
        );
        let body = String::from_utf8(composed.body).unwrap();
        assert_eq!(body, format!("{}\n", wrap_base64(&cp1251)));
    }

    #[test]
    fn test_unknown_charset_fails_before_output() {
        let mut message = Message::with_charset("x-unknown");
        message.to("rcpt@example.com");
        let err = compose(&message, &ComposeOptions::default(), &EncodingRsRecoder).unwrap_err();
        assert!(matches!(err, Error::UnsupportedCharset(_)));
    }

    #[test]
    fn test_to_bytes() {
        let mut message = message();
        message.subject("S").text("x");
        let composed = compose_default(&message);
        let raw = String::from_utf8(composed.to_bytes()).unwrap();
        let head = "To: rcpt@example.com\nSubject: =?UTF-8?B?Uw==?=\nFrom: ";
        assert!(raw.starts_with(head));
        assert!(raw.ends_with("\n\neA==\n\n"));
    }
}
