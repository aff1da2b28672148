//! # mpmail
//!
//! Multipart email sending on top of [`mpmail_mime`].
//!
//! This crate provides:
//! - [`Mailer`]: composes a [`Message`] and hands it to a transport
//! - [`Sender`]: the transport interface, implemented for closures and by
//!   [`SendmailSender`] for local submission
//! - [`MailerConfig`]: `X-Mailer` value and empty-recipient policy
//!
//! ```ignore
//! use mpmail::{Mailer, Message, SendmailSender};
//!
//! let mut message = Message::new();
//! message
//!     .from("Shop <shop@example.com>")
//!     .to("customer@example.com")
//!     .subject("Your order")
//!     .text("Thanks for your order.");
//!
//! let mailer = Mailer::new(SendmailSender::default());
//! if !mailer.send(&message)? {
//!     eprintln!("not sent");
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
mod error;
pub mod mailer;
pub mod sender;

pub use config::{MailerConfig, MailerConfigBuilder};
pub use error::{Error, Result};
pub use mailer::Mailer;
pub use sender::{SendmailSender, Sender};

pub use mpmail_mime as mime;
pub use mpmail_mime::{AttachmentId, ComposedMessage, Message};
