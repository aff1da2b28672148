//! Integration tests for the mailer.
//!
//! A recording sender captures what would be handed to the transport.

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;

use mpmail::mime::Error as MimeError;
use mpmail::{Error, Mailer, MailerConfig, Message, Sender};

/// Arguments of one `send` call.
#[derive(Debug, Clone)]
struct Sent {
    to: String,
    subject: String,
    body: Vec<u8>,
    headers: String,
}

/// Sender that records calls and answers with a fixed result.
#[derive(Debug)]
struct RecordingSender {
    accept: bool,
    sent: Mutex<Vec<Sent>>,
}

impl RecordingSender {
    fn new(accept: bool) -> Self {
        Self {
            accept,
            sent: Mutex::new(Vec::new()),
        }
    }

    fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }
}

impl Sender for RecordingSender {
    fn send(&self, to: &str, subject: &str, body: &[u8], headers: &str) -> bool {
        self.sent.lock().unwrap().push(Sent {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_vec(),
            headers: headers.to_string(),
        });
        self.accept
    }
}

fn has_line(headers: &str, prefix: &str) -> bool {
    headers
        .lines()
        .any(|line| line.to_ascii_lowercase().starts_with(prefix))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn welcome_message() -> Message {
    let mut message = Message::new();
    message
        .from("Shop <shop@example.com>")
        .to("Ann <ann@example.com>; bob@example.com")
        .subject("Welcome")
        .text("Hello")
        .html(r#"<img src="logo.png"> Hello"#);
    message
        .add_attachment(b"\x89PNG".to_vec(), "image/png", "logo.png", true)
        .unwrap();
    message
}

#[test]
fn test_send_hands_off_composed_message() {
    init_tracing();
    let mailer = Mailer::new(RecordingSender::new(true));

    assert!(mailer.send(&welcome_message()).unwrap());

    let sent = mailer.sender().sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].to,
        "=?UTF-8?B?QW5u?= <ann@example.com>, bob@example.com"
    );
    assert_eq!(sent[0].subject, "=?UTF-8?B?V2VsY29tZQ==?=");

    let headers = &sent[0].headers;
    let from = "=?UTF-8?B?U2hvcA==?= <shop@example.com>";
    assert!(headers.starts_with(&format!("From: {from}\n")));
    assert!(headers.contains(&format!("\nReply-To: {from}\n")));
    assert!(headers.contains("multipart/related; boundary=\"mpm-part-"));
    assert!(!has_line(headers, "to:"));
    assert!(!has_line(headers, "subject:"));
    assert!(sent[0].body.ends_with(b"--\n\n"));
}

#[test]
fn test_sender_refusal_reported() {
    init_tracing();
    let mailer = Mailer::new(RecordingSender::new(false));

    assert!(!mailer.send(&welcome_message()).unwrap());
    assert_eq!(mailer.sender().sent().len(), 1);
}

#[test]
fn test_empty_recipient_lenient() {
    init_tracing();
    let mailer = Mailer::new(RecordingSender::new(true));
    let mut message = Message::new();
    message.text("no recipient");

    assert!(!mailer.send(&message).unwrap());
    assert!(mailer.sender().sent().is_empty());
}

#[test]
fn test_empty_recipient_strict() {
    init_tracing();
    let config = MailerConfig::builder().fail_on_empty_recipient(true).build();
    let mailer = Mailer::with_config(RecordingSender::new(true), config);
    let mut message = Message::new();
    message.text("no recipient");

    let err = mailer.send(&message).unwrap_err();
    assert!(matches!(err, Error::Mime(MimeError::EmptyRecipient)));
    assert!(mailer.sender().sent().is_empty());
}

#[test]
fn test_empty_recipient_lenient_with_unknown_charset() {
    init_tracing();
    let mailer = Mailer::new(RecordingSender::new(true));
    let mut message = Message::with_charset("x-bogus");
    message.subject("s").text("no recipient");

    assert!(!mailer.send(&message).unwrap());
    assert!(mailer.sender().sent().is_empty());
}

#[test]
fn test_configured_x_mailer() {
    let config = MailerConfig::from_json(r#"{"x_mailer": "shop-notifier/3"}"#).unwrap();
    let mailer = Mailer::with_config(RecordingSender::new(true), config);
    let mut message = Message::new();
    message.to("a@example.com").text("x");

    mailer.send(&message).unwrap();
    let sent = mailer.sender().sent();
    assert!(sent[0].headers.contains("X-Mailer: shop-notifier/3"));
}

#[test]
fn test_unsupported_charset_sends_nothing() {
    let mailer = Mailer::new(RecordingSender::new(true));
    let mut message = Message::with_charset("x-bogus");
    message.to("a@example.com").subject("s");

    let err = mailer.send(&message).unwrap_err();
    assert!(matches!(err, Error::Mime(MimeError::UnsupportedCharset(_))));
    assert!(mailer.sender().sent().is_empty());
}

#[test]
fn test_closure_sender() {
    let sender = |to: &str, _: &str, _: &[u8], _: &str| to.contains("@example.com");
    let mailer = Mailer::new(sender);
    let mut message = Message::new();
    message.to("a@example.com").text("x");
    assert!(mailer.send(&message).unwrap());
}

#[test]
fn test_compose_only() {
    let mailer = Mailer::new(RecordingSender::new(true));
    let composed = mailer.compose(&welcome_message()).unwrap();
    assert_eq!(composed.layout, mpmail::mime::Layout::Related);
    assert!(mailer.sender().sent().is_empty());
}
