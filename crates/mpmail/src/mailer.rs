//! Composing and sending messages.

use tracing::{info, warn};

use mpmail_mime::{ComposedMessage, EncodingRsRecoder, Message, Recode, compose};

use crate::config::MailerConfig;
use crate::error::Result;
use crate::sender::Sender;

/// Composes messages and hands them to a [`Sender`].
pub struct Mailer<S> {
    config: MailerConfig,
    sender: S,
    recoder: Box<dyn Recode>,
}

impl<S: Sender> Mailer<S> {
    /// Creates a mailer with the default configuration.
    #[must_use]
    pub fn new(sender: S) -> Self {
        Self::with_config(sender, MailerConfig::default())
    }

    /// Creates a mailer with the given configuration.
    #[must_use]
    pub fn with_config(sender: S, config: MailerConfig) -> Self {
        Self {
            config,
            sender,
            recoder: Box::new(EncodingRsRecoder),
        }
    }

    /// Replaces the charset converter used for non-UTF-8 messages.
    #[must_use]
    pub fn with_recoder(mut self, recoder: impl Recode + 'static) -> Self {
        self.recoder = Box::new(recoder);
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &MailerConfig {
        &self.config
    }

    /// Returns the sender.
    #[must_use]
    pub const fn sender(&self) -> &S {
        &self.sender
    }

    /// Composes a message without sending it.
    ///
    /// # Errors
    ///
    /// Returns an error if the message has no recipient or its charset is
    /// not supported.
    pub fn compose(&self, message: &Message) -> mpmail_mime::Result<ComposedMessage> {
        compose(
            message,
            &self.config.compose_options(),
            self.recoder.as_ref(),
        )
    }

    /// Composes a message and hands it to the sender.
    ///
    /// Returns whether the sender accepted the message. A message without
    /// recipient is logged and reported as not sent, unless
    /// [`MailerConfig::fail_on_empty_recipient`] is set.
    ///
    /// # Errors
    ///
    /// Returns an error if composition fails. Nothing is sent in that case.
    pub fn send(&self, message: &Message) -> Result<bool> {
        let composed = match self.compose(message) {
            Ok(composed) => composed,
            Err(mpmail_mime::Error::EmptyRecipient) if !self.config.fail_on_empty_recipient => {
                warn!("Send failed, TO is empty");
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };

        let accepted = self.sender.send(
            &composed.to,
            &composed.subject,
            &composed.body,
            &composed.header_block(),
        );

        if accepted {
            info!(to = %composed.to, layout = ?composed.layout, "Message sent");
        } else {
            warn!(to = %composed.to, "Sender did not accept message");
        }
        Ok(accepted)
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for Mailer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailer")
            .field("config", &self.config)
            .field("sender", &self.sender)
            .finish_non_exhaustive()
    }
}
