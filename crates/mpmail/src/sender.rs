//! Hand-off of composed messages to a transport.

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::{debug, warn};

/// Transport accepting a composed message.
pub trait Sender {
    /// Sends a message.
    ///
    /// `headers` is the `\n`-joined header block without `To` and `Subject`.
    /// Returns true if the transport accepted the message.
    fn send(&self, to: &str, subject: &str, body: &[u8], headers: &str) -> bool;
}

impl<F> Sender for F
where
    F: Fn(&str, &str, &[u8], &str) -> bool,
{
    fn send(&self, to: &str, subject: &str, body: &[u8], headers: &str) -> bool {
        self(to, subject, body, headers)
    }
}

/// Default path of the local submission program.
pub const DEFAULT_SENDMAIL: &str = "/usr/sbin/sendmail";

/// Submits messages through a local `sendmail`-compatible program.
///
/// The complete message is written to the program's standard input; with the
/// default `-t -i` arguments recipients are read from the `To` header.
#[derive(Debug, Clone)]
pub struct SendmailSender {
    program: PathBuf,
    args: Vec<OsString>,
}

impl SendmailSender {
    /// Creates a sender running `program -t -i`.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: vec!["-t".into(), "-i".into()],
        }
    }

    /// Replaces the program arguments.
    #[must_use]
    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for SendmailSender {
    fn default() -> Self {
        Self::new(DEFAULT_SENDMAIL)
    }
}

impl Sender for SendmailSender {
    fn send(&self, to: &str, subject: &str, body: &[u8], headers: &str) -> bool {
        let mut message = format!("To: {to}\nSubject: {subject}\n{headers}\n\n").into_bytes();
        message.extend_from_slice(body);

        let mut child = match Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                warn!(program = %self.program.display(), error = %e, "Failed to start sendmail");
                return false;
            }
        };

        // Dropping stdin after the write signals end of message
        let written = child
            .stdin
            .take()
            .map(|mut stdin| stdin.write_all(&message));

        match (written, child.wait()) {
            (Some(Ok(())), Ok(status)) if status.success() => {
                debug!(
                    program = %self.program.display(),
                    bytes = message.len(),
                    "Message submitted"
                );
                true
            }
            (Some(Err(e)), _) => {
                warn!(program = %self.program.display(), error = %e, "Failed to write message");
                false
            }
            (_, Ok(status)) => {
                warn!(program = %self.program.display(), %status, "Sendmail rejected message");
                false
            }
            (_, Err(e)) => {
                warn!(program = %self.program.display(), error = %e, "Failed to wait for sendmail");
                false
            }
        }
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
    fn test_closure_sender() {
        let sender = |to: &str, _subject: &str, _body: &[u8], _headers: &str| to == "a@b";
        assert!(sender.send("a@b", "s", b"", ""));
        assert!(!sender.send("c@d", "s", b"", ""));
    }

    #[test]
    fn test_default_program() {
        let sender = SendmailSender::default();
        assert_eq!(sender.program, PathBuf::from(DEFAULT_SENDMAIL));
        assert_eq!(
            sender.args,
            vec![OsString::from("-t"), OsString::from("-i")]
        );
    }

    #[test]
    fn test_missing_program() {
        let sender = SendmailSender::new("/nonexistent/mpmail-sendmail");
        assert!(!sender.send("a@b", "s", b"body", "From: x@y"));
    }

    #[cfg(unix)]
    #[test]
    fn test_program_accepts() {
        let sender = SendmailSender::new("cat").args(Vec::<String>::new());
        assert!(sender.send("a@b", "s", b"body\n", "From: x@y"));
    }

    #[cfg(unix)]
    #[test]
    fn test_program_rejects() {
        let sender = SendmailSender::new("sh").args(["-c", "cat >/dev/null; exit 75"]);
        assert!(!sender.send("a@b", "s", b"body\n", "From: x@y"));
    }
}
