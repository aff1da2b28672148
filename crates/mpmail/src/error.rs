//! Error types for the mailer.

use thiserror::Error;

/// Errors that can occur while sending.
#[derive(Debug, Error)]
pub enum Error {
    /// Composition failed.
    #[error("Compose error: {0}")]
    Mime(#[from] mpmail_mime::Error),

    /// Configuration could not be parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
