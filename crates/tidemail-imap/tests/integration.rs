//! Integration tests for the IMAP session.
//!
//! These tests drive a [`Session`] through a scripted transport that
//! records every write, so command wire format and the absence of writes
//! can both be checked without a server.

use std::collections::VecDeque;

use chrono::Datelike;
use tidemail_imap::{Error, Flag, LoginType, Message, Result, SequenceSet, Session, TagGenerator, Transport};

/// Transport replaying canned server lines.
///
/// `{tag}` in a scripted line is replaced by the tag of the most recent
/// command written.
#[derive(Debug, Default)]
struct ScriptedTransport {
    script: VecDeque<String>,
    writes: Vec<String>,
    tag: String,
    closed: bool,
    error: String,
}

impl ScriptedTransport {
    fn new(script: &str) -> Self {
        Self {
            script: script.split_inclusive('\n').map(str::to_string).collect(),
            ..Self::default()
        }
    }

    fn writes(&self) -> Vec<&str> {
        self.writes.iter().map(String::as_str).collect()
    }
}

impl Transport for ScriptedTransport {
    async fn read_line(&mut self) -> Result<Vec<u8>> {
        match self.script.pop_front() {
            Some(line) => Ok(line.replace("{tag}", &self.tag).into_bytes()),
            None => {
                self.closed = true;
                self.error = "Connection closed".to_string();
                Err(Error::Closed)
            }
        }
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let text = String::from_utf8_lossy(data).into_owned();
        // Continuation data (SASL payloads) carries no space.
        if let Some((tag, _)) = text.split_once(' ') {
            self.tag = tag.to_string();
        }
        self.writes.push(text);
        Ok(())
    }

    async fn disconnect(&mut self) {
        self.closed = true;
    }

    fn is_connected(&self) -> bool {
        !self.closed
    }

    fn error_string(&self) -> &str {
        &self.error
    }
}

/// Routes engine logs to the test output; `RUST_LOG=tidemail_imap=trace`
/// shows every line exchanged.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn session(script: &str) -> Session<ScriptedTransport> {
    init_tracing();
    Session::with_tags(ScriptedTransport::new(script), TagGenerator::new("T"))
}

#[tokio::test]
async fn test_greeting_then_capability() {
    let transport = ScriptedTransport::new(concat!(
        "* OK [CAPABILITY IMAP4rev1] ready\r\n",
        "* CAPABILITY IMAP4rev1 AUTH=CRAM-MD5 IDLE\r\n",
        "{tag} OK CAPABILITY completed\r\n",
    ));
    let mut session = Session::from_transport(transport).await.unwrap();

    let caps = session.capability().await.unwrap();
    assert!(caps.iter().any(|cap| cap == "AUTH=CRAM-MD5"));
    assert!(session.last_tag().unwrap().starts_with("THIMAP"));
}

#[tokio::test]
async fn test_empty_search_writes_nothing() {
    let mut session = session("");

    assert!(session.search("").await.unwrap().is_empty());
    assert!(session.transport().writes().is_empty());
}

#[tokio::test]
async fn test_search_in_server_order() {
    let mut session = session("* SEARCH 2 84 882\r\n{tag} OK SEARCH completed\r\n");

    let ids = session.search("FLAGGED SINCE 1-Feb-1994").await.unwrap();
    assert_eq!(ids, vec![2, 84, 882]);
    assert_eq!(
        session.transport().writes(),
        vec!["T0000 SEARCH FLAGGED SINCE 1-Feb-1994\r\n"]
    );
}

#[tokio::test]
async fn test_set_seen_stores_by_uid() {
    let mut session = session(concat!(
        "* 7 FETCH (UID 42)\r\n",
        "{tag} OK FETCH completed\r\n",
        "* 7 FETCH (FLAGS (\\Seen) UID 42)\r\n",
        "{tag} OK STORE completed\r\n",
    ));

    session.set_flag(7, Flag::Seen, true).await.unwrap();
    assert_eq!(
        session.transport().writes(),
        vec!["T0000 FETCH 7 UID\r\n", "T0001 UID STORE 42 +flags (\\Seen)\r\n"]
    );
}

#[tokio::test]
async fn test_store_rejected() {
    let mut session = session(concat!(
        "* 7 FETCH (UID 42)\r\n",
        "{tag} OK FETCH completed\r\n",
        "{tag} NO [READ-ONLY] mailbox is read-only\r\n",
    ));

    let error = session.set_deleted(7, true).await.unwrap_err();
    assert!(matches!(error, Error::No(_)));
    assert_eq!(session.error_string(), "[READ-ONLY] mailbox is read-only");
}

#[tokio::test]
async fn test_select_then_fetch_envelopes() {
    let mut session = session(concat!(
        "* 2 EXISTS\r\n",
        "* 0 RECENT\r\n",
        "* FLAGS (\\Answered \\Flagged \\Deleted \\Seen \\Draft)\r\n",
        "{tag} OK [READ-WRITE] SELECT completed\r\n",
        "* 1 FETCH (FLAGS (\\Seen) RFC822.SIZE 512 ENVELOPE (\"01-Jan-2024 10:00:00 +0000\" \"Hello\" ((\"A\" NIL \"a\" \"x.com\")) NIL NIL ((\"A\" NIL \"a\" \"x.com\")) NIL NIL NIL NIL))\r\n",
        "* 2 FETCH (FLAGS () RFC822.SIZE 64 ENVELOPE (NIL \"=?UTF-8?Q?Caf=C3=A9?=\" NIL NIL NIL NIL NIL NIL NIL \"<id@x.com>\"))\r\n",
        "{tag} OK FETCH completed\r\n",
    ));

    let mut inbox = session.select("INBOX").await.unwrap();
    assert!(inbox.read_write);
    assert_eq!(inbox.exists, 2);

    assert_eq!(session.fetch_mailbox(&mut inbox).await.unwrap(), 2);
    assert_eq!(
        session.transport().writes(),
        vec!["T0000 SELECT INBOX\r\n", "T0001 FETCH 1:* ALL\r\n"]
    );

    let first = inbox.find_by_id(1).unwrap();
    assert!(first.flags.is_seen());
    assert_eq!(first.size, 512);
    assert_eq!(first.subject, "Hello");
    assert_eq!(first.from.as_ref().unwrap().address(), "a@x.com");
    assert_eq!(first.to[0].display_name(), Some("A"));
    assert_eq!(first.sent.unwrap().year(), 2024);

    let second = inbox.find_by_id(2).unwrap();
    assert_eq!(second.subject, "Café");
    assert_eq!(second.message_id.as_deref(), Some("id@x.com"));
    assert!(second.from.is_none());
}

#[tokio::test]
async fn test_fetch_by_sequence_set() {
    let mut session = session("* 5 FETCH (UID 50)\r\n{tag} OK done\r\n");
    let mut inbox = tidemail_imap::Mailbox::inbox();

    let added = session
        .fetch(&mut inbox, &SequenceSet::RangeFrom(5))
        .await
        .unwrap();
    assert_eq!(added, 1);
    assert_eq!(session.transport().writes(), vec!["T0000 FETCH 5:* ALL\r\n"]);
}

#[tokio::test]
async fn test_login_variants() {
    let mut plain = session("{tag} OK LOGIN completed\r\n");
    plain.login("tim", "pw", LoginType::Plain).await.unwrap();
    assert_eq!(plain.transport().writes(), vec!["T0000 LOGIN tim pw\r\n"]);

    let mut sasl = session(concat!(
        "+ VXNlcm5hbWU6\r\n",
        "+ UGFzc3dvcmQ6\r\n",
        "{tag} OK AUTHENTICATE completed\r\n",
    ));
    sasl.login("tim", "pw", LoginType::Authenticate).await.unwrap();
    assert_eq!(
        sasl.transport().writes(),
        vec!["T0000 AUTHENTICATE LOGIN\r\n", "dGlt\r\n", "cHc=\r\n"]
    );

    let mut cram = session(concat!(
        "+ PDE4OTYuNjk3MTcwOTUyQHBvc3RvZmZpY2UucmVzdG9uLm1jaS5uZXQ+\r\n",
        "{tag} OK CRAM authentication successful\r\n",
    ));
    cram.login("tim", "tanstaaftanstaaf", LoginType::CramMd5)
        .await
        .unwrap();
    assert_eq!(
        cram.transport().writes()[1],
        "dGltIGI5MTNhNjAyYzdlZGE3YTQ5NWI0ZTZlNzMzNGQzODkw\r\n"
    );
}

#[tokio::test]
async fn test_arguments_with_line_breaks_write_nothing() {
    let mut session = session("");

    let error = session
        .login("u", "pw\r\nT9 LOGOUT", LoginType::Plain)
        .await
        .unwrap_err();
    assert!(matches!(error, Error::InvalidArgument(_)));

    let error = session
        .search_subject("x\r\nT9 DELETE INBOX")
        .await
        .unwrap_err();
    assert!(matches!(error, Error::InvalidArgument(_)));

    assert!(session.select("INBOX\n").await.is_err());
    assert!(session.transport().writes().is_empty());
    assert!(session.is_connected());
}

#[tokio::test]
async fn test_login_failure_is_auth_error() {
    let mut session = session("{tag} NO [AUTHENTICATIONFAILED] Invalid credentials\r\n");

    let error = session.login("tim", "bad", LoginType::Plain).await.unwrap_err();
    assert!(matches!(error, Error::Auth(_)));
    assert_eq!(
        session.error_string(),
        "[AUTHENTICATIONFAILED] Invalid credentials"
    );
}

#[tokio::test]
async fn test_body_part_out_of_range_writes_nothing() {
    let mut session = session("");
    let mut message = Message::with_id(3);

    let error = session.fetch_body_part(&mut message, 0).await.unwrap_err();
    assert!(matches!(error, Error::InvalidArgument(_)));
    assert!(session.transport().writes().is_empty());
}

#[tokio::test]
async fn test_body_part_base64_literal() {
    let mut session = session(concat!(
        "* 3 FETCH (BODYSTRUCTURE (\"TEXT\" \"PLAIN\" (\"CHARSET\" \"UTF-8\") NIL NIL \"BASE64\" 20 2))\r\n",
        "{tag} OK FETCH completed\r\n",
        "* 3 FETCH (BODY[1] {20}\r\n",
        "SGVsbG8s\r\n",
        "IHdvcmxk\r\n",
        ")\r\n",
        "{tag} OK FETCH completed\r\n",
    ));
    let mut message = Message::with_id(3);

    session.fetch_body_structure(&mut message).await.unwrap();
    assert_eq!(message.text_part_index(), Some(0));

    session.fetch_body_part(&mut message, 0).await.unwrap();
    assert_eq!(
        session.transport().writes(),
        vec!["T0000 FETCH 3 BODYSTRUCTURE\r\n", "T0001 FETCH 3 BODY[1]\r\n"]
    );
    let part = message.text_part().unwrap();
    assert_eq!(part.decoded_data().unwrap(), b"Hello, world");
}

#[tokio::test]
async fn test_transport_failure_reports_transport_text() {
    let mut session = session("");

    let error = session.expunge().await.unwrap_err();
    assert!(matches!(error, Error::Closed));
    assert_eq!(session.error_string(), "Connection closed");
    assert!(!session.is_connected());
}
