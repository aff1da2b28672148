//! Error types for message composition.

use std::io;

use crate::attachment::AttachmentId;

/// Result type alias for composition operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Composition error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The message has no recipient.
    #[error("Send failed, TO is empty")]
    EmptyRecipient,

    /// Attachment is missing its payload, MIME type, or filename.
    #[error("Invalid attachment: {0}")]
    InvalidAttachment(String),

    /// Custom header is not in `Name: value` form.
    #[error("Invalid header \"{0}\"")]
    InvalidHeaderSyntax(String),

    /// No custom header with the given name.
    #[error("Header \"{0}\" not found")]
    HeaderNotFound(String),

    /// No attachment with the given identifier.
    #[error("Attachment {0} not found")]
    AttachmentNotFound(AttachmentId),

    /// The declared charset has no known conversion to UTF-8.
    #[error("Unsupported charset: {0}")]
    UnsupportedCharset(String),

    /// Reading an attachment file failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
