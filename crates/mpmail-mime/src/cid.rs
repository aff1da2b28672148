//! Rewriting of HTML image references to `cid:` URLs.
//!
//! An inline image attachment is referenced from the HTML body by its
//! filename. Before sending, `src="logo.png"` and `url('logo.png')` are
//! rewritten to point at the attachment's content ID, which makes the message
//! `multipart/related`.
//!
//! When two inline images share a filename, the first one in insertion order
//! takes every reference; later ones are left unreferenced.

use std::borrow::Cow;
use std::fmt::Write as _;

use regex::bytes::{Captures, Regex};
use tracing::warn;

use crate::attachment::Attachment;

/// Rewrites references to inline image attachments in `html`.
///
/// Only attachments with a content ID and an `image/*` MIME type are
/// considered. Filenames are matched literally and case-insensitively.
///
/// Returns the rewritten HTML and whether any reference was replaced.
#[must_use]
pub fn rewrite(html: &[u8], attachments: &[Attachment]) -> (Vec<u8>, bool) {
    let mut html = html.to_vec();
    let mut rewritten = false;

    for attachment in attachments.iter().filter(|a| a.is_image()) {
        let Some(cid) = attachment.content_id() else {
            continue;
        };
        let name = escape_literal(attachment.filename());

        let src = compile(&format!(r#"(?i-u)src=(['"]?){name}(['"]?)"#));
        let url = compile(&format!(r#"(?i-u)url\(['"]?{name}['"]?\)"#));
        let (Some(src), Some(url)) = (src, url) else {
            continue;
        };

        let replaced = replace(&src, &html, |caps: &Captures<'_>| {
            let parts: [&[u8]; 5] = [b"src=", &caps[1], b"cid:", cid.as_bytes(), &caps[2]];
            parts.concat()
        });
        if let Some(new) = replaced {
            html = new;
            rewritten = true;
        }

        let target = format!("url(cid:{cid})");
        if let Some(new) = replace(&url, &html, |_: &Captures<'_>| target.as_bytes().to_vec()) {
            html = new;
            rewritten = true;
        }
    }

    (html, rewritten)
}

/// Replaces all matches, returning `None` if nothing matched.
fn replace<F>(regex: &Regex, haystack: &[u8], replacement: F) -> Option<Vec<u8>>
where
    F: FnMut(&Captures<'_>) -> Vec<u8>,
{
    match regex.replace_all(haystack, replacement) {
        Cow::Owned(new) => Some(new),
        Cow::Borrowed(_) => None,
    }
}

fn compile(pattern: &str) -> Option<Regex> {
    Regex::new(pattern)
        .map_err(|e| warn!(error = %e, "Skipping inline image reference"))
        .ok()
}

/// Escapes bytes for use as a literal in a non-Unicode pattern.
///
/// Alphanumerics are kept so case-insensitive matching applies to them;
/// every other byte becomes a `\xNN` escape and matches exactly.
fn escape_literal(bytes: &[u8]) -> String {
    let mut pattern = String::with_capacity(bytes.len() * 4);
    for &byte in bytes {
        if byte.is_ascii_alphanumeric() {
            pattern.push(char::from(byte));
        } else {
            let _ = write!(pattern, r"\x{byte:02X}");
        }
    }
    pattern
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
    use crate::attachment::AttachmentStore;
    use crate::token::UniqueTokens;
    use std::sync::Arc;

    fn store() -> AttachmentStore {
        AttachmentStore::new(Arc::new(UniqueTokens::with_seed(0xfeed)))
    }

    fn rewrite_str(html: &str, store: &AttachmentStore) -> (String, bool) {
        let (html, rewritten) = rewrite(html.as_bytes(), store.list());
        (String::from_utf8(html).unwrap(), rewritten)
    }

    #[test]
    fn test_src_double_quotes() {
        let mut store = store();
        let id = store.add(b"png".to_vec(), "image/png", "logo.png", true).unwrap();
        let cid = store.get(id).unwrap().content_id().unwrap().to_string();

        let (html, rewritten) = rewrite_str(r#"<img src="logo.png">"#, &store);
        assert!(rewritten);
        assert_eq!(html, format!(r#"<img src="cid:{cid}">"#));
    }

    #[test]
    fn test_src_single_and_no_quotes() {
        let mut store = store();
        let id = store.add(b"png".to_vec(), "image/png", "logo.png", true).unwrap();
        let cid = store.get(id).unwrap().content_id().unwrap().to_string();

        let (html, _) = rewrite_str("<img src='logo.png'><img src=logo.png>", &store);
        assert_eq!(html, format!("<img src='cid:{cid}'><img src=cid:{cid}>"));
    }

    #[test]
    fn test_case_insensitive_and_global() {
        let mut store = store();
        let id = store.add(b"png".to_vec(), "image/png", "Logo.PNG", true).unwrap();
        let cid = store.get(id).unwrap().content_id().unwrap().to_string();

        let (html, _) = rewrite_str(r#"<IMG SRC="logo.png"><img src="LOGO.png">"#, &store);
        let expected = format!(r#"<IMG src="cid:{cid}"><img src="cid:{cid}">"#);
        assert_eq!(html, expected);
    }

    #[test]
    fn test_css_url() {
        let mut store = store();
        let id = store.add(b"png".to_vec(), "image/png", "bg.png", true).unwrap();
        let cid = store.get(id).unwrap().content_id().unwrap().to_string();

        let (html, rewritten) = rewrite_str(
            r#"<div style="background: url('bg.png')"></div><p style='x:url(bg.png)'>"#,
            &store,
        );
        assert!(rewritten);
        let expected = format!(
            r#"<div style="background: url(cid:{cid})"></div><p style='x:url(cid:{cid})'>"#
        );
        assert_eq!(html, expected);
    }

    #[test]
    fn test_filename_metacharacters_are_literal() {
        let mut store = store();
        store.add(b"png".to_vec(), "image/png", "a.png", true).unwrap();
        store.add(b"png".to_vec(), "image/png", "(x)+[1].png", true).unwrap();

        // "a.png" must not match "aXpng"
        let (html, rewritten) = rewrite_str(r#"<img src="aXpng">"#, &store);
        assert!(!rewritten);
        assert_eq!(html, r#"<img src="aXpng">"#);

        let (html, rewritten) = rewrite_str(r#"<img src="(x)+[1].png">"#, &store);
        assert!(rewritten);
        assert!(html.contains("cid:cid-"));
    }

    #[test]
    fn test_non_image_and_non_inline_skipped() {
        let mut store = store();
        store.add(b"pdf".to_vec(), "application/pdf", "doc.pdf", true).unwrap();
        store.add(b"png".to_vec(), "image/png", "logo.png", false).unwrap();

        let input = r#"<a href="doc.pdf"><img src="doc.pdf"><img src="logo.png">"#;
        let (html, rewritten) = rewrite_str(input, &store);
        assert!(!rewritten);
        assert_eq!(html, input);
    }

    #[test]
    fn test_unreferenced_inline_image_not_related() {
        let mut store = store();
        store.add(b"png".to_vec(), "image/png", "logo.png", true).unwrap();

        let (_, rewritten) = rewrite_str("<p>No images here</p>", &store);
        assert!(!rewritten);
    }

    #[test]
    fn test_non_utf8_filename() {
        let mut store = store();
        // "лого.png" in windows-1251
        let name = [0xEB, 0xEE, 0xE3, 0xEE, b'.', b'p', b'n', b'g'];
        let id = store.add(b"png".to_vec(), "image/png", name.to_vec(), true).unwrap();
        let cid = store.get(id).unwrap().content_id().unwrap().to_string();

        let mut html = b"<img src=\"".to_vec();
        html.extend_from_slice(&name);
        html.extend_from_slice(b"\">");

        let (out, rewritten) = rewrite(&html, store.list());
        assert!(rewritten);
        assert_eq!(out, format!("<img src=\"cid:{cid}\">").into_bytes());
    }

    #[test]
    fn test_input_untouched() {
        let mut store = store();
        store.add(b"png".to_vec(), "image/png", "logo.png", true).unwrap();

        let html = br#"<img src="logo.png">"#.to_vec();
        let _ = rewrite(&html, store.list());
        assert_eq!(html, br#"<img src="logo.png">"#.to_vec());
    }

    #[test]
    fn test_duplicate_filename_first_wins() {
        let mut store = store();
        let first = store.add(b"a".to_vec(), "image/png", "logo.png", true).unwrap();
        store.add(b"b".to_vec(), "image/png", "logo.png", true).unwrap();
        let cid = store.get(first).unwrap().content_id().unwrap().to_string();

        let (html, rewritten) = rewrite_str(r#"<img src="logo.png"><img src="logo.png">"#, &store);
        assert!(rewritten);
        let expected = format!(r#"<img src="cid:{cid}"><img src="cid:{cid}">"#);
        assert_eq!(html, expected);
    }
}
