//! Mailer configuration.

use serde::Deserialize;

use mpmail_mime::ComposeOptions;
use mpmail_mime::compose::DEFAULT_X_MAILER;

use crate::error::Result;

/// Mailer configuration.
///
/// Can be deserialized from JSON; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MailerConfig {
    /// Value of the `X-Mailer` header.
    pub x_mailer: String,
    /// Return [`EmptyRecipient`](mpmail_mime::Error::EmptyRecipient) as an
    /// error instead of logging it and reporting the message as not sent.
    pub fail_on_empty_recipient: bool,
}

impl MailerConfig {
    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> MailerConfigBuilder {
        MailerConfigBuilder::new()
    }

    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or has wrongly typed fields.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Returns the composition options derived from this configuration.
    #[must_use]
    pub fn compose_options(&self) -> ComposeOptions {
        ComposeOptions {
            x_mailer: self.x_mailer.clone(),
        }
    }
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            x_mailer: DEFAULT_X_MAILER.to_string(),
            fail_on_empty_recipient: false,
        }
    }
}

/// Builder for mailer configuration.
#[derive(Debug, Clone, Default)]
pub struct MailerConfigBuilder {
    config: MailerConfig,
}

impl MailerConfigBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `X-Mailer` header value.
    #[must_use]
    pub fn x_mailer(mut self, x_mailer: impl Into<String>) -> Self {
        self.config.x_mailer = x_mailer.into();
        self
    }

    /// Sets whether a missing recipient is returned as an error.
    #[must_use]
    pub const fn fail_on_empty_recipient(mut self, fail: bool) -> Self {
        self.config.fail_on_empty_recipient = fail;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> MailerConfig {
        self.config
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

    #[test]
    fn test_defaults() {
        let config = MailerConfig::default();
        assert!(config.x_mailer.starts_with("mpmail/"));
        assert!(!config.fail_on_empty_recipient);
    }

    #[test]
    fn test_builder() {
        let config = MailerConfig::builder()
            .x_mailer("newsletter/1.0")
            .fail_on_empty_recipient(true)
            .build();
        assert_eq!(config.x_mailer, "newsletter/1.0");
        assert!(config.fail_on_empty_recipient);
        assert_eq!(config.compose_options().x_mailer, "newsletter/1.0");
    }

    #[test]
    fn test_from_json_partial() {
        let config = MailerConfig::from_json(r#"{"fail_on_empty_recipient": true}"#).unwrap();
        assert!(config.fail_on_empty_recipient);
        assert_eq!(config.x_mailer, DEFAULT_X_MAILER);
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(MailerConfig::from_json(r#"{"x_mailer": 5}"#).is_err());
    }
}
