//! Attachment records and storage.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::warn;

use crate::error::{Error, Result};
use crate::token::TokenSource;

/// Prefix of generated content IDs.
pub const CONTENT_ID_PREFIX: &str = "cid-";

/// Attachment identifier, unique within one message.
///
/// Identifiers start at 1 and are never reused after removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttachmentId(u32);

impl AttachmentId {
    /// Returns the numeric value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A file attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    id: AttachmentId,
    data: Vec<u8>,
    mime_type: String,
    filename: Vec<u8>,
    content_id: Option<String>,
}

impl Attachment {
    /// Returns the identifier.
    #[must_use]
    pub const fn id(&self) -> AttachmentId {
        self.id
    }

    /// Returns the raw payload.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the MIME type as given.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Returns the display filename in the message's declared charset.
    #[must_use]
    pub fn filename(&self) -> &[u8] {
        &self.filename
    }

    /// Returns the content ID, if one was requested.
    #[must_use]
    pub fn content_id(&self) -> Option<&str> {
        self.content_id.as_deref()
    }

    /// Checks if the MIME type is an image type.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.mime_type
            .get(..5)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image"))
    }
}

/// Ordered attachment storage.
#[derive(Clone)]
pub struct AttachmentStore {
    attachments: Vec<Attachment>,
    last_id: u32,
    tokens: Arc<dyn TokenSource>,
}

impl AttachmentStore {
    /// Creates an empty store drawing content IDs from `tokens`.
    #[must_use]
    pub fn new(tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            attachments: Vec::new(),
            last_id: 0,
            tokens,
        }
    }

    /// Adds an attachment.
    ///
    /// With `inline` set, a content ID is generated so HTML can embed the
    /// attachment by filename.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAttachment`] if the payload, MIME type, or
    /// filename is empty. Nothing is stored and no identifier is consumed.
    pub fn add(
        &mut self,
        data: impl Into<Vec<u8>>,
        mime_type: impl Into<String>,
        filename: impl Into<Vec<u8>>,
        inline: bool,
    ) -> Result<AttachmentId> {
        let data = data.into();
        let mime_type = mime_type.into();
        let filename = filename.into();

        let problem = if data.is_empty() {
            Some("payload is empty")
        } else if mime_type.trim().is_empty() {
            Some("MIME type is empty")
        } else if mime_type.contains(['\r', '\n']) {
            Some("MIME type contains a line break")
        } else if filename.is_empty() {
            Some("filename is empty")
        } else {
            None
        };
        if let Some(problem) = problem {
            warn!(mime_type = %mime_type, problem, "Failed to add an attachment");
            return Err(Error::InvalidAttachment(problem.to_string()));
        }

        self.last_id += 1;
        let id = AttachmentId(self.last_id);
        let content_id = if inline {
            Some(format!("{CONTENT_ID_PREFIX}{}", self.tokens.next_token()))
        } else {
            None
        };

        self.attachments.push(Attachment {
            id,
            data,
            mime_type,
            filename,
            content_id,
        });
        Ok(id)
    }

    /// Adds an attachment read from a file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, or
    /// [`Error::InvalidAttachment`] as for [`add`](Self::add).
    pub fn add_file(
        &mut self,
        path: impl AsRef<Path>,
        mime_type: impl Into<String>,
        filename: impl Into<Vec<u8>>,
        inline: bool,
    ) -> Result<AttachmentId> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| {
            warn!(path = %path.display(), error = %e, "Failed to read attachment file");
            Error::Io(e)
        })?;
        self.add(data, mime_type, filename, inline)
    }

    /// Removes an attachment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AttachmentNotFound`] if there is no such attachment.
    pub fn remove(&mut self, id: AttachmentId) -> Result<Attachment> {
        match self.attachments.iter().position(|a| a.id == id) {
            Some(index) => Ok(self.attachments.remove(index)),
            None => {
                warn!(%id, "Attachment not found");
                Err(Error::AttachmentNotFound(id))
            }
        }
    }

    /// Gets an attachment by identifier.
    #[must_use]
    pub fn get(&self, id: AttachmentId) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.id == id)
    }

    /// Returns the attachments in insertion order.
    #[must_use]
    pub fn list(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Returns an iterator over the attachments in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Attachment> {
        self.attachments.iter()
    }

    /// Returns the number of attachments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attachments.len()
    }

    /// Returns true if there are no attachments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }
}

impl fmt::Debug for AttachmentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachmentStore")
            .field("attachments", &self.attachments)
            .field("last_id", &self.last_id)
            .finish_non_exhaustive()
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
    use crate::token::UniqueTokens;

    fn store() -> AttachmentStore {
        AttachmentStore::new(Arc::new(UniqueTokens::with_seed(1)))
    }

    #[test]
    fn test_add_assigns_sequential_ids() {
        let mut store = store();
        let a = store.add(b"one".to_vec(), "text/plain", "a.txt", false).unwrap();
        let b = store.add(b"two".to_vec(), "text/plain", "b.txt", false).unwrap();
        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_content_id_only_when_inline() {
        let mut store = store();
        let plain = store.add(b"x".to_vec(), "image/png", "a.png", false).unwrap();
        let inline = store.add(b"x".to_vec(), "image/png", "b.png", true).unwrap();

        assert_eq!(store.get(plain).unwrap().content_id(), None);
        let cid = store.get(inline).unwrap().content_id().unwrap();
        assert_eq!(cid, "cid-000000000000000100000000");
    }

    #[test]
    fn test_invalid_attachment_rejected() {
        let mut store = store();
        let cases: [(&[u8], &str, &str); 3] = [
            (b"", "image/png", "a.png"),
            (b"x", "", "a.png"),
            (b"x", "image/png", ""),
        ];
        for (data, mime, name) in cases {
            let err = store.add(data.to_vec(), mime, name, true).unwrap_err();
            assert!(matches!(err, Error::InvalidAttachment(_)));
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_failed_add_does_not_consume_id() {
        let mut store = store();
        let _ = store.add(Vec::new(), "text/plain", "a.txt", false);
        let id = store.add(b"x".to_vec(), "text/plain", "a.txt", false).unwrap();
        assert_eq!(id.get(), 1);
    }

    #[test]
    fn test_mime_type_line_break_rejected() {
        let mut store = store();
        let result = store.add(b"x".to_vec(), "text/plain\nBcc: x@y", "a.txt", false);
        assert!(result.is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove() {
        let mut store = store();
        let a = store.add(b"one".to_vec(), "text/plain", "a.txt", false).unwrap();
        let removed = store.remove(a).unwrap();
        assert_eq!(removed.data(), b"one");
        assert!(matches!(store.remove(a), Err(Error::AttachmentNotFound(id)) if id == a));
    }

    #[test]
    fn test_ids_not_reused_after_removal() {
        let mut store = store();
        let a = store.add(b"one".to_vec(), "text/plain", "a.txt", false).unwrap();
        store.remove(a).unwrap();
        let b = store.add(b"two".to_vec(), "text/plain", "b.txt", false).unwrap();
        assert_eq!(b.get(), 2);
    }

    #[test]
    fn test_insertion_order() {
        let mut store = store();
        store.add(b"1".to_vec(), "text/plain", "z.txt", false).unwrap();
        store.add(b"2".to_vec(), "text/plain", "a.txt", false).unwrap();
        let names: Vec<&[u8]> = store.iter().map(Attachment::filename).collect();
        assert_eq!(names, vec![b"z.txt".as_slice(), b"a.txt".as_slice()]);
    }

    #[test]
    fn test_is_image() {
        let mut store = store();
        let png = store.add(b"x".to_vec(), "IMAGE/PNG", "a.png", false).unwrap();
        let pdf = store.add(b"x".to_vec(), "application/pdf", "a.pdf", false).unwrap();
        assert!(store.get(png).unwrap().is_image());
        assert!(!store.get(pdf).unwrap().is_image());
    }

    #[test]
    fn test_add_file_missing() {
        let mut store = store();
        let err = store
            .add_file(
                "/nonexistent/mpmail/attachment.bin",
                "application/octet-stream",
                "a.bin",
                false,
            )
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_file_empty() {
        let name = format!("mpmail-attachment-empty-{}.bin", std::process::id());
        let path = std::env::temp_dir().join(name);
        std::fs::write(&path, b"").unwrap();

        let mut store = store();
        let err = store
            .add_file(&path, "application/octet-stream", "empty.bin", false)
            .unwrap_err();
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(err, Error::InvalidAttachment(_)));
        assert!(store.is_empty());

        let id = store.add(b"x".to_vec(), "text/plain", "a.txt", false).unwrap();
        assert_eq!(id.get(), 1);
    }

    #[test]
    fn test_add_file() {
        let path =
            std::env::temp_dir().join(format!("mpmail-attachment-{}.txt", std::process::id()));
        std::fs::write(&path, b"file contents").unwrap();

        let mut store = store();
        let id = store.add_file(&path, "text/plain", "notes.txt", false).unwrap();
        assert_eq!(store.get(id).unwrap().data(), b"file contents");

        std::fs::remove_file(&path).unwrap();
    }
}
