//! Integration tests for message composition.
//!
//! Composed bodies are split on their boundaries and every part is base64
//! decoded to check it reproduces the original content.

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use proptest::prelude::*;

use mpmail_mime::{
    ComposeOptions, ComposedMessage, EncodingRsRecoder, Error, Layout, Message, UniqueTokens,
    compose,
};

/// A serialized MIME part: header lines and raw payload.
struct RawPart {
    headers: String,
    payload: String,
}

impl RawPart {
    fn decoded(&self) -> Vec<u8> {
        let joined: String = self.payload.lines().collect();
        STANDARD.decode(joined).unwrap()
    }

    fn content_type(&self) -> &str {
        self.headers
            .lines()
            .find_map(|line| line.strip_prefix("Content-Type: "))
            .unwrap()
    }
}

fn boundary_of(content_type: &str) -> &str {
    let start = content_type.find("boundary=\"").unwrap() + "boundary=\"".len();
    let end = content_type[start..].find('"').unwrap();
    &content_type[start..start + end]
}

fn split_parts(body: &str, boundary: &str) -> Vec<RawPart> {
    let end = body.find(&format!("--{boundary}--\n")).unwrap();
    body[..end]
        .split(&format!("--{boundary}\n"))
        .skip(1)
        .map(|part| {
            let (headers, payload) = part.split_once("\n\n").unwrap();
            RawPart {
                headers: headers.to_string(),
                payload: payload.to_string(),
            }
        })
        .collect()
}

fn top_level_parts(composed: &ComposedMessage) -> Vec<RawPart> {
    let line = composed.headers.get("content-type").unwrap();
    let body = std::str::from_utf8(&composed.body).unwrap();
    split_parts(body, boundary_of(line))
}

fn compose_ok(message: &Message) -> ComposedMessage {
    compose(message, &ComposeOptions::default(), &EncodingRsRecoder).unwrap()
}

#[test]
fn test_text_only_single_part() {
    let mut message = Message::new();
    message.to("rcpt@example.com").text("Just text\nover two lines");

    let composed = compose_ok(&message);
    assert_eq!(composed.layout, Layout::SinglePart);

    let body = std::str::from_utf8(&composed.body).unwrap();
    assert!(!body.contains("--mpm-"));
    let joined: String = body.lines().collect();
    let decoded = STANDARD.decode(joined).unwrap();
    assert_eq!(decoded, b"Just text\nover two lines");
    assert!(
        composed
            .header_block()
            .contains("Content-Type: text/plain; charset=UTF-8\nContent-Transfer-Encoding: base64")
    );
}

#[test]
fn test_text_and_html_nested_alternative() {
    let mut message = Message::new();
    message.to("rcpt@example.com").text("Plain").html("<b>Bold</b>");

    let composed = compose_ok(&message);
    assert_eq!(composed.layout, Layout::Mixed);

    let parts = top_level_parts(&composed);
    assert_eq!(parts.len(), 1);
    assert!(parts[0].content_type().starts_with("multipart/alternative"));

    let inner = split_parts(&parts[0].payload, boundary_of(parts[0].content_type()));
    assert_eq!(inner.len(), 2);
    assert_eq!(inner[0].content_type(), "text/plain; charset=UTF-8");
    assert_eq!(inner[0].decoded(), b"Plain");
    assert_eq!(inner[1].content_type(), "text/html; charset=UTF-8");
    assert_eq!(inner[1].decoded(), b"<b>Bold</b>");
}

#[test]
fn test_inline_image_related() {
    let mut message = Message::new();
    message
        .to("rcpt@example.com")
        .html(r#"<p>Logo: <img src="logo.png"></p>"#);
    let png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0xFF];
    let id = message
        .add_attachment(png.clone(), "image/png", "logo.png", true)
        .unwrap();
    let cid = message.attachments().get(id).unwrap().content_id().unwrap().to_string();

    let composed = compose_ok(&message);
    assert_eq!(composed.layout, Layout::Related);
    assert!(
        composed
            .header_block()
            .contains("Content-Type: multipart/related; boundary=")
    );

    let parts = top_level_parts(&composed);
    assert_eq!(parts.len(), 2);

    let html = String::from_utf8(parts[0].decoded()).unwrap();
    assert_eq!(html, format!(r#"<p>Logo: <img src="cid:{cid}"></p>"#));
    assert!(!html.contains("logo.png"));

    assert!(parts[1].headers.contains(&format!("Content-ID: <{cid}>")));
    assert!(
        parts[1]
            .headers
            .contains("Content-Disposition: attachment; filename=\"=?UTF-8?B?bG9nby5wbmc=?=\"")
    );
    assert_eq!(parts[1].decoded(), png);
}

#[test]
fn test_compose_twice_is_stable() {
    let mut message = Message::new();
    message.to("rcpt@example.com").html(r#"<img src="a.gif">"#);
    let id = message.add_attachment(b"GIF89a".to_vec(), "image/gif", "a.gif", true).unwrap();
    let cid = message.attachments().get(id).unwrap().content_id().unwrap().to_string();

    for _ in 0..2 {
        let composed = compose_ok(&message);
        let parts = top_level_parts(&composed);
        let html = String::from_utf8(parts[0].decoded()).unwrap();
        assert_eq!(html, format!(r#"<img src="cid:{cid}">"#));
    }
}

#[test]
fn test_attachment_without_reference_is_mixed() {
    let mut message = Message::new();
    message.to("rcpt@example.com").html("<p>No image</p>");
    message
        .add_attachment(b"GIF89a".to_vec(), "image/gif", "a.gif", true)
        .unwrap();

    assert_eq!(compose_ok(&message).layout, Layout::Mixed);
}

#[test]
fn test_recipient_list_encoding() {
    let mut message = Message::new();
    message.to("A <a@x>, b@y; C <c@z>");

    let composed = compose_ok(&message);
    assert_eq!(
        composed.to,
        "=?UTF-8?B?QQ==?= <a@x>, b@y, =?UTF-8?B?Qw==?= <c@z>"
    );
}

#[test]
fn test_missing_recipient() {
    let mut message = Message::new();
    message.text("nobody to send to");
    assert!(matches!(
        compose(&message, &ComposeOptions::default(), &EncodingRsRecoder),
        Err(Error::EmptyRecipient)
    ));
}

#[test]
fn test_concurrent_messages_use_distinct_boundaries() {
    let tokens = Arc::new(UniqueTokens::new());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let tokens = Arc::clone(&tokens);
            std::thread::spawn(move || {
                (0..50)
                    .map(|_| {
                        let mut message = Message::with_tokens("UTF-8", tokens.clone());
                        message.to("rcpt@example.com").html("<p>x</p>");
                        let composed = compose_ok(&message);
                        composed.headers.get("content-type").unwrap().to_string()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for content_type in handle.join().unwrap() {
            assert!(seen.insert(content_type), "boundary reused");
        }
    }
}

proptest! {
    #[test]
    fn every_part_round_trips(
        text in proptest::collection::vec(any::<u8>(), 1..300),
        html in proptest::collection::vec(any::<u8>(), 1..300),
        payloads in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 1..500), 0..4),
    ) {
        let mut message = Message::with_charset("ISO-8859-1");
        message.to("rcpt@example.com").text(text.clone()).html(html.clone());
        for (i, payload) in payloads.iter().enumerate() {
            message
                .add_attachment(
                    payload.clone(),
                    "application/octet-stream",
                    format!("file{i}.bin"),
                    false,
                )
                .unwrap();
        }

        let composed = compose_ok(&message);
        let parts = top_level_parts(&composed);
        prop_assert_eq!(parts.len(), 1 + payloads.len());

        let inner = split_parts(&parts[0].payload, boundary_of(parts[0].content_type()));
        prop_assert_eq!(inner[0].decoded(), text);
        prop_assert_eq!(inner[1].decoded(), html);

        for (part, payload) in parts[1..].iter().zip(&payloads) {
            prop_assert_eq!(&part.decoded(), payload);
            prop_assert!(part.payload.lines().all(|line| line.len() <= 76));
        }
    }
}
