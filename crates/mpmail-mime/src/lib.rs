//! # mpmail-mime
//!
//! Multipart email composition: builds RFC 2045 message bodies and header
//! blocks from plain text, HTML, attachments and inline images.
//!
//! ## Features
//!
//! - **Structure planning**: single-part, mixed, alternative and related
//!   layouts chosen from the message content
//! - **Inline images**: HTML `src="..."` and CSS `url(...)` references to
//!   attached images are rewritten to `cid:` URLs
//! - **Header encoding**: RFC 2047 encoding of display names, subject and
//!   attachment filenames
//! - **Charsets**: bodies keep their declared charset, header values are
//!   converted to UTF-8
//!
//! ## Quick Start
//!
//! ```ignore
//! use mpmail_mime::{ComposeOptions, EncodingRsRecoder, Message, compose};
//!
//! let mut message = Message::new();
//! message
//!     .from("Sender <sender@example.com>")
//!     .to("Alice <alice@example.com>, bob@example.com")
//!     .subject("Quarterly report")
//!     .text("Plain text version")
//!     .html(r#"<p>HTML version</p><img src="chart.png">"#);
//!
//! message.add_attachment(chart_png, "image/png", "chart.png", true)?;
//!
//! let composed = compose(&message, &ComposeOptions::default(), &EncodingRsRecoder)?;
//! // multipart/related with the chart referenced as cid:...
//! println!("{}", composed.header_block());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod error;
mod header;
mod message;

pub mod address;
pub mod attachment;
pub mod charset;
pub mod cid;
pub mod compose;
pub mod encoding;
pub mod structure;
pub mod token;

pub use address::{Address, encode_address, encode_address_list};
pub use attachment::{Attachment, AttachmentId, AttachmentStore};
pub use charset::{EncodingRsRecoder, Recode};
pub use compose::{ComposeOptions, ComposedMessage, compose};
pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::Headers;
pub use message::Message;
pub use structure::{BodyParts, Layout, Plan};
pub use token::{TokenSource, UniqueTokens};
