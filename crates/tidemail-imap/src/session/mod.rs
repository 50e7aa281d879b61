//! The command/response engine.
//!
//! A [`Session`] owns one [`Transport`] and runs one tagged command at a
//! time: write `TAG COMMAND`, collect untagged lines until `TAG OK|NO|BAD`,
//! then hand the lines to the command's parser. Every command method takes
//! `&mut self`, so a second command cannot start while one is in flight.
//!
//! ```text
//! Idle ─ send ─→ CommandSent ─→ ReadingUntagged* ─→ Terminated(OK|NO|BAD) ─→ Idle
//! ```

#![allow(clippy::missing_errors_doc)]

mod auth;
mod mailbox;
mod message;

use tracing::{debug, info, trace};

use crate::command::{Command, TagGenerator};
use crate::connection::{Config, FramedTransport, ImapStream, MAX_LITERAL_SIZE, Transport};
use crate::parser::response::{
    self, Completion, Status, is_ready_greeting, is_tagged_completion, line_text,
    literal_length, parse_completion,
};
use crate::{Error, Result};

/// Untagged lines and completion text of a command that ended in OK.
#[derive(Debug, Default)]
pub(crate) struct Response {
    /// Logical lines, literals spliced in.
    pub lines: Vec<Vec<u8>>,
    /// Text of the tagged OK line.
    pub text: String,
}

/// An IMAP session over a transport.
pub struct Session<T> {
    transport: T,
    tags: TagGenerator,
    last_tag: Option<String>,
    last_error: String,
}

impl<T> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("tags", &self.tags)
            .field("last_tag", &self.last_tag)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

impl Session<FramedTransport<ImapStream>> {
    /// Connects to the server in `config` and reads its greeting.
    pub async fn connect(config: &Config) -> Result<Self> {
        let stream = crate::connection::connect(config).await?;
        let transport = FramedTransport::with_config(stream, config);
        let mut session = Self::with_tags(transport, TagGenerator::new(config.tag_prefix.clone()));
        session.read_greeting().await?;
        info!(host = %config.host, port = config.port, "connected");
        Ok(session)
    }
}

impl<T: Transport> Session<T> {
    /// Wraps a transport whose greeting has already been consumed.
    pub fn new(transport: T) -> Self {
        Self::with_tags(transport, TagGenerator::default())
    }

    /// Wraps a transport using the given tag generator.
    pub const fn with_tags(transport: T, tags: TagGenerator) -> Self {
        Self {
            transport,
            tags,
            last_tag: None,
            last_error: String::new(),
        }
    }

    /// Wraps a freshly opened transport and reads the server greeting.
    pub async fn from_transport(transport: T) -> Result<Self> {
        let mut session = Self::new(transport);
        session.read_greeting().await?;
        Ok(session)
    }

    /// Reads the `* OK` / `* PREAUTH` greeting.
    async fn read_greeting(&mut self) -> Result<()> {
        let result = match self.read_response().await {
            Ok(line) if is_ready_greeting(&line) => Ok(()),
            Ok(line) => Err(Error::Protocol(format!(
                "unexpected greeting: {}",
                line_text(&line)
            ))),
            Err(error) => Err(error),
        };
        self.record(result)
    }

    /// Tag of the most recently sent command.
    #[must_use]
    pub fn last_tag(&self) -> Option<&str> {
        self.last_tag.as_deref()
    }

    /// Last protocol error text, or the transport's error text if no
    /// protocol error was recorded.
    #[must_use]
    pub fn error_string(&self) -> &str {
        if self.last_error.is_empty() {
            self.transport.error_string()
        } else {
            &self.last_error
        }
    }

    /// Returns true while the transport is usable.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Closes the transport without sending LOGOUT.
    pub async fn disconnect(&mut self) {
        self.transport.disconnect().await;
    }

    /// Borrows the transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends CAPABILITY and returns the advertised capability names.
    pub async fn capability(&mut self) -> Result<Vec<String>> {
        let response = self.execute(&Command::Capability).await?;
        Ok(response
            .lines
            .iter()
            .filter_map(|line| response::parse_capability(line))
            .flatten()
            .collect())
    }

    /// Sends LOGOUT and closes the transport.
    pub async fn logout(&mut self) -> Result<()> {
        let result = self.execute(&Command::Logout).await.map(drop);
        self.transport.disconnect().await;
        info!("logged out");
        result
    }

    /// Sends EXPUNGE and returns the expunged sequence numbers in server
    /// order.
    pub async fn expunge(&mut self) -> Result<Vec<u32>> {
        let response = self.execute(&Command::Expunge).await?;
        Ok(response
            .lines
            .iter()
            .filter_map(|line| response::parse_expunge(line))
            .collect())
    }

    /// Runs one command to completion, requiring an OK.
    ///
    /// Failures are recorded for [`Session::error_string`].
    pub(crate) async fn execute(&mut self, command: &Command) -> Result<Response> {
        let result = self.run(command).await;
        self.record(result)
    }

    async fn run(&mut self, command: &Command) -> Result<Response> {
        let tag = self.send_command(command).await?;
        let (lines, completion) = self.read_until_tagged(&tag).await?;
        let text = check(completion)?;
        Ok(Response { lines, text })
    }

    /// Writes `TAG COMMAND\r\n` and returns the tag.
    ///
    /// A command whose arguments fail [`Command::validate`] is not written
    /// and consumes no tag.
    pub(crate) async fn send_command(&mut self, command: &Command) -> Result<String> {
        command.validate()?;
        let tag = self.tags.next();
        debug!(tag = %tag, command = command.name(), "sending command");
        self.transport.write(&command.serialize(&tag)).await?;
        self.last_tag = Some(tag.clone());
        Ok(tag)
    }

    /// Writes one continuation line. The payload is never logged.
    pub(crate) async fn send_data_line(&mut self, data: &str) -> Result<()> {
        debug!(bytes = data.len(), "sending continuation data");
        let mut line = Vec::with_capacity(data.len() + 2);
        line.extend_from_slice(data.as_bytes());
        line.extend_from_slice(b"\r\n");
        self.transport.write(&line).await
    }

    /// Reads one logical line, splicing in every `{N}` literal it announces.
    ///
    /// Literal bytes arrive as ordinary lines; they are counted off against
    /// the announced length so a line ending inside a literal is never taken
    /// for the end of the response.
    pub(crate) async fn read_response(&mut self) -> Result<Vec<u8>> {
        let mut response = Vec::new();
        let mut pending = 0usize;

        loop {
            let line = self.transport.read_line().await?;
            trace!(line = %String::from_utf8_lossy(&line).trim_end(), "received");
            response.extend_from_slice(&line);

            if pending >= line.len() {
                pending -= line.len();
                continue;
            }

            match literal_length(&line[pending..]) {
                Some(length) if length > MAX_LITERAL_SIZE => {
                    return Err(Error::Protocol(format!(
                        "literal too large: {length} bytes (max {MAX_LITERAL_SIZE})"
                    )));
                }
                Some(length) => pending = length,
                None => return Ok(response),
            }
        }
    }

    /// Collects logical lines until the completion for `tag`.
    ///
    /// A completion carrying a different tag ends the command with
    /// [`Error::Protocol`] instead of waiting for a line that will not come.
    pub(crate) async fn read_until_tagged(
        &mut self,
        tag: &str,
    ) -> Result<(Vec<Vec<u8>>, Completion)> {
        let mut lines = Vec::new();

        loop {
            let line = self.read_response().await?;
            if let Some(completion) = parse_completion(&line, tag) {
                debug!(tag, status = ?completion.status, "command completed");
                return Ok((lines, completion));
            }
            if is_tagged_completion(&line) {
                return Err(Error::Protocol(format!(
                    "unexpected tagged response: {}",
                    line_text(&line)
                )));
            }
            lines.push(line);
        }
    }

    /// Reads to the completion for `tag` and requires an OK.
    pub(crate) async fn finish(&mut self, tag: &str) -> Result<Response> {
        let (lines, completion) = self.read_until_tagged(tag).await?;
        let text = check(completion)?;
        Ok(Response { lines, text })
    }

    /// Records a failed result for [`Session::error_string`].
    ///
    /// Transport failures clear the protocol error so the transport's own
    /// text is reported.
    pub(crate) fn record<R>(&mut self, result: Result<R>) -> Result<R> {
        if let Err(error) = &result {
            if error.is_transport() {
                self.last_error.clear();
            } else {
                self.last_error = match error {
                    Error::No(text) | Error::Bad(text) | Error::Auth(text) => text.clone(),
                    other => other.to_string(),
                };
            }
            debug!(%error, "command failed");
        }
        result
    }
}

/// Maps a completion to its text, or to [`Error::No`]/[`Error::Bad`].
fn check(completion: Completion) -> Result<String> {
    match completion.status {
        Status::Ok => Ok(completion.text),
        Status::No => Err(Error::No(completion.text)),
        Status::Bad => Err(Error::Bad(completion.text)),
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
    use tokio_test::io::Builder;

    fn session(mock: tokio_test::io::Mock) -> Session<FramedTransport<tokio_test::io::Mock>> {
        Session::with_tags(FramedTransport::new(mock), TagGenerator::new("A"))
    }

    #[tokio::test]
    async fn test_greeting() {
        let mock = Builder::new().read(b"* OK IMAP4rev1 ready\r\n").build();
        let session = Session::from_transport(FramedTransport::new(mock)).await.unwrap();
        assert!(session.is_connected());
        assert!(session.last_tag().is_none());
    }

    #[tokio::test]
    async fn test_bad_greeting() {
        let mock = Builder::new().read(b"* BYE busy\r\n").build();
        let error = Session::from_transport(FramedTransport::new(mock)).await.unwrap_err();
        assert!(matches!(error, Error::Protocol(_)));
    }

    #[tokio::test]
    async fn test_read_response_splices_literal() {
        let mock = Builder::new()
            .read(b"* 1 FETCH (BODY[1] {12}\r\n")
            .read(b"line1\r\nA0 OK")
            .read(b")\r\n")
            .build();
        let mut session = session(mock);

        let line = session.read_response().await.unwrap();
        assert_eq!(line, b"* 1 FETCH (BODY[1] {12}\r\nline1\r\nA0 OK)\r\n");
    }

    #[tokio::test]
    async fn test_read_response_two_literals() {
        let mock = Builder::new()
            .read(b"* 2 FETCH (A {2}\r\nxy B {3}\r\n")
            .read(b"a\r\n C)\r\n")
            .build();
        let mut session = session(mock);

        let line = session.read_response().await.unwrap();
        assert_eq!(line, b"* 2 FETCH (A {2}\r\nxy B {3}\r\na\r\n C)\r\n");
    }

    #[tokio::test]
    async fn test_literal_too_large() {
        let header = format!("* 1 FETCH (BODY {{{}}}\r\n", MAX_LITERAL_SIZE + 1);
        let mock = Builder::new().read(header.as_bytes()).build();
        let mut session = session(mock);

        let error = session.read_response().await.unwrap_err();
        assert!(error.to_string().contains("literal too large"));
    }

    #[tokio::test]
    async fn test_capability() {
        let mock = Builder::new()
            .write(b"A0000 CAPABILITY\r\n")
            .read(b"* CAPABILITY IMAP4rev1 AUTH=PLAIN\r\n")
            .read(b"A0000 OK done\r\n")
            .build();
        let mut session = session(mock);

        let caps = session.capability().await.unwrap();
        assert_eq!(caps, vec!["IMAP4rev1", "AUTH=PLAIN"]);
        assert_eq!(session.last_tag(), Some("A0000"));
    }

    #[tokio::test]
    async fn test_no_records_error_text() {
        let mock = Builder::new()
            .write(b"A0000 EXPUNGE\r\n")
            .read(b"A0000 NO [READ-ONLY] mailbox is read-only\r\n")
            .build();
        let mut session = session(mock);

        let error = session.expunge().await.unwrap_err();
        assert!(matches!(error, Error::No(_)));
        assert_eq!(session.error_string(), "[READ-ONLY] mailbox is read-only");
    }

    #[tokio::test]
    async fn test_foreign_tag_fails_command() {
        let mock = Builder::new()
            .write(b"A0000 EXPUNGE\r\n")
            .read(b"* 3 EXPUNGE\r\n")
            .read(b"Z9 OK stale\r\n")
            .build();
        let mut session = session(mock);

        let error = session.expunge().await.unwrap_err();
        assert!(matches!(error, Error::Protocol(_)));
        assert!(session.error_string().contains("Z9 OK stale"));
    }

    #[tokio::test]
    async fn test_expunge_ids() {
        let mock = Builder::new()
            .write(b"A0000 EXPUNGE\r\n")
            .read(b"* 3 EXPUNGE\r\n* 3 EXPUNGE\r\n* 5 EXPUNGE\r\n")
            .read(b"A0000 OK EXPUNGE completed\r\n")
            .build();
        let mut session = session(mock);

        assert_eq!(session.expunge().await.unwrap(), vec![3, 3, 5]);
    }

    #[tokio::test]
    async fn test_transport_error_reported() {
        let mock = Builder::new().write(b"A0000 CAPABILITY\r\n").build();
        let mut session = session(mock);

        let error = session.capability().await.unwrap_err();
        assert!(matches!(error, Error::Closed));
        assert_eq!(session.error_string(), "Connection closed");
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn test_line_break_in_argument_is_not_sent() {
        let mock = Builder::new().build();
        let mut session = session(mock);

        let error = session.create_mailbox("Work\r\nA9 DELETE INBOX").await.unwrap_err();
        assert!(matches!(error, Error::InvalidArgument(_)));
        assert!(session.last_tag().is_none());
        assert_eq!(
            session.error_string(),
            "Invalid argument: CREATE argument contains CR, LF or NUL"
        );
        assert!(session.is_connected());
    }

    #[tokio::test]
    async fn test_logout_disconnects() {
        let mock = Builder::new()
            .write(b"A0000 LOGOUT\r\n")
            .read(b"* BYE see you\r\nA0000 OK LOGOUT completed\r\n")
            .build();
        let mut session = session(mock);

        session.logout().await.unwrap();
        assert!(!session.is_connected());
    }
}
