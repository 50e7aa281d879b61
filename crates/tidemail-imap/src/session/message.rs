//! FETCH, STORE, and SEARCH commands.

use chrono::NaiveDate;
use tidemail_mime::{join_lines, split_lines, strip_fetch_framing};
use tracing::warn;

use super::{Response, Session};
use crate::command::{Command, FetchItems, SearchCriteria, SequenceSet, StoreAction};
use crate::connection::Transport;
use crate::parser::body_structure::{default_part, parse_body_structure};
use crate::parser::fetch::{FetchResponse, is_fetch, parse_fetch};
use crate::parser::response::parse_search;
use crate::types::{Flag, Mailbox, Message};
use crate::{Error, Result};

impl<T: Transport> Session<T> {
    /// Fetches envelopes and flags for `sequence`, appending the messages to
    /// `mailbox` in server order. Returns how many were added.
    pub async fn fetch(&mut self, mailbox: &mut Mailbox, sequence: &SequenceSet) -> Result<usize> {
        let response = self.fetch_items(sequence.clone(), FetchItems::All).await?;

        let mut added = 0;
        for fetched in fetch_responses(&response) {
            mailbox.add_message(fetched.to_message());
            added += 1;
        }
        Ok(added)
    }

    /// Fetches messages `begin..=end`.
    pub async fn fetch_range(&mut self, mailbox: &mut Mailbox, begin: u32, end: u32) -> Result<usize> {
        self.fetch(mailbox, &SequenceSet::Range(begin, end)).await
    }

    /// Fetches the listed messages. An empty list sends nothing.
    pub async fn fetch_ids(&mut self, mailbox: &mut Mailbox, ids: &[u32]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.fetch(mailbox, &SequenceSet::List(ids.to_vec())).await
    }

    /// Fetches every message of a selected mailbox.
    ///
    /// A mailbox reporting no messages sends nothing, since `1:*` is
    /// rejected by some servers when the mailbox is empty.
    pub async fn fetch_mailbox(&mut self, mailbox: &mut Mailbox) -> Result<usize> {
        if mailbox.exists == 0 {
            return Ok(0);
        }
        self.fetch(mailbox, &SequenceSet::ALL).await
    }

    /// Fetches the envelope and flags of one message.
    pub async fn fetch_headers(&mut self, id: u32) -> Result<Message> {
        let response = self.fetch_items(SequenceSet::Single(id), FetchItems::All).await?;
        let message = fetch_responses(&response)
            .find(|fetched| fetched.id == id)
            .map(|fetched| fetched.to_message());
        self.require(message, id)
    }

    /// Resolves a sequence number to its UID.
    pub async fn fetch_uid(&mut self, id: u32) -> Result<u32> {
        let response = self.fetch_items(SequenceSet::Single(id), FetchItems::Uid).await?;
        let uid = fetch_responses(&response)
            .filter(|fetched| fetched.id == id)
            .find_map(|fetched| fetched.uid());
        self.require(uid, id)
    }

    /// Fetches the MIME structure of `message` and replaces its body parts.
    ///
    /// An unparseable structure leaves one TEXT/PLAIN part numbered `"1"`.
    pub async fn fetch_body_structure(&mut self, message: &mut Message) -> Result<()> {
        let id = self.message_id(message)?;
        let response = self
            .fetch_items(SequenceSet::Single(id), FetchItems::BodyStructure)
            .await?;

        let parts = fetch_responses(&response)
            .filter(|fetched| fetched.id == id)
            .find_map(|fetched| fetched.get("BODYSTRUCTURE").map(parse_body_structure))
            .unwrap_or_else(|| {
                warn!(id, "no BODYSTRUCTURE in response");
                vec![default_part()]
            });

        message.set_body_parts(parts);
        Ok(())
    }

    /// Fetches the content of body part `index` into its raw data.
    ///
    /// Lines are joined per the part's transfer encoding; use
    /// [`BodyPart::decoded_data`](crate::BodyPart::decoded_data) for the
    /// decoded bytes. An index past the part list fails with
    /// [`Error::InvalidArgument`] without contacting the server.
    pub async fn fetch_body_part(&mut self, message: &mut Message, index: usize) -> Result<()> {
        let Some(part) = message.body_part_at(index) else {
            let error = Error::InvalidArgument(format!(
                "body part {index} out of range ({} parts)",
                message.body_parts().len()
            ));
            return self.record(Err(error));
        };
        let section = part.part_number().to_string();
        let encoding = part.transfer_encoding();
        let id = self.message_id(message)?;

        let response = self
            .fetch_items(SequenceSet::Single(id), FetchItems::Body(section.clone()))
            .await?;

        let parsed = response
            .lines
            .iter()
            .filter(|line| is_fetch(line))
            .find_map(|line| parse_fetch(line).ok())
            .map(|fetched| fetched.body_section(&section).map(<[u8]>::to_vec));

        let raw = match parsed {
            Some(Some(literal)) => join_lines(split_lines(&literal), encoding),
            Some(None) => Vec::new(),
            None => {
                warn!(id, section = %section, "falling back to raw FETCH lines");
                let lines = response.lines.iter().flat_map(|line| split_lines(line).skip(1));
                strip_fetch_framing(&join_lines(lines, encoding)).to_vec()
            }
        };

        if let Some(part) = message.body_part_at_mut(index) {
            part.set_raw_data(raw);
        }
        Ok(())
    }

    /// Sets or clears one flag on message `id`, addressed by its UID.
    ///
    /// Succeeds only when the server answers with the updated FETCH data
    /// and an OK.
    pub async fn set_flag(&mut self, id: u32, flag: Flag, value: bool) -> Result<()> {
        let uid = self.fetch_uid(id).await?;
        let response = self
            .execute(&Command::UidStore {
                uid,
                action: StoreAction::set(flag, value),
            })
            .await?;

        if response.lines.is_empty() {
            let error = Error::Protocol(format!("UID STORE {uid} returned no data"));
            return self.record(Err(error));
        }
        Ok(())
    }

    /// Sets or clears `\Seen`.
    pub async fn set_seen(&mut self, id: u32, value: bool) -> Result<()> {
        self.set_flag(id, Flag::Seen, value).await
    }

    /// Sets or clears `\Draft`.
    pub async fn set_draft(&mut self, id: u32, value: bool) -> Result<()> {
        self.set_flag(id, Flag::Draft, value).await
    }

    /// Sets or clears `\Recent`. Most servers refuse this one.
    pub async fn set_recent(&mut self, id: u32, value: bool) -> Result<()> {
        self.set_flag(id, Flag::Recent, value).await
    }

    /// Sets or clears `\Flagged`.
    pub async fn set_flagged(&mut self, id: u32, value: bool) -> Result<()> {
        self.set_flag(id, Flag::Flagged, value).await
    }

    /// Sets or clears `\Deleted`.
    pub async fn set_deleted(&mut self, id: u32, value: bool) -> Result<()> {
        self.set_flag(id, Flag::Deleted, value).await
    }

    /// Sets or clears `\Answered`.
    pub async fn set_answered(&mut self, id: u32, value: bool) -> Result<()> {
        self.set_flag(id, Flag::Answered, value).await
    }

    /// Runs SEARCH with raw criteria text, returning ids in server order.
    ///
    /// Blank criteria return an empty list without sending a command.
    pub async fn search(&mut self, criteria: &str) -> Result<Vec<u32>> {
        let criteria = criteria.trim();
        if criteria.is_empty() {
            return Ok(Vec::new());
        }
        self.search_criteria(&SearchCriteria::Raw(criteria.to_string()))
            .await
    }

    /// Runs SEARCH with typed criteria.
    pub async fn search_criteria(&mut self, criteria: &SearchCriteria) -> Result<Vec<u32>> {
        if matches!(criteria, SearchCriteria::Raw(raw) if raw.trim().is_empty()) {
            return Ok(Vec::new());
        }
        let response = self
            .execute(&Command::Search {
                criteria: criteria.clone(),
            })
            .await?;
        Ok(response
            .lines
            .iter()
            .filter_map(|line| parse_search(line))
            .flatten()
            .collect())
    }

    /// Messages addressed to `text`.
    pub async fn search_to(&mut self, text: &str) -> Result<Vec<u32>> {
        self.search_criteria(&SearchCriteria::To(text.to_string())).await
    }

    /// Messages with `text` in Cc.
    pub async fn search_cc(&mut self, text: &str) -> Result<Vec<u32>> {
        self.search_criteria(&SearchCriteria::Cc(text.to_string())).await
    }

    /// Messages with `text` in Bcc.
    pub async fn search_bcc(&mut self, text: &str) -> Result<Vec<u32>> {
        self.search_criteria(&SearchCriteria::Bcc(text.to_string())).await
    }

    /// Messages from `text`.
    pub async fn search_from(&mut self, text: &str) -> Result<Vec<u32>> {
        self.search_criteria(&SearchCriteria::From(text.to_string())).await
    }

    /// Messages with `text` in headers or body.
    pub async fn search_text(&mut self, text: &str) -> Result<Vec<u32>> {
        self.search_criteria(&SearchCriteria::Text(text.to_string())).await
    }

    /// Messages with `text` in the body.
    pub async fn search_body(&mut self, text: &str) -> Result<Vec<u32>> {
        self.search_criteria(&SearchCriteria::Body(text.to_string())).await
    }

    /// Messages with `text` in the subject.
    pub async fn search_subject(&mut self, text: &str) -> Result<Vec<u32>> {
        self.search_criteria(&SearchCriteria::Subject(text.to_string())).await
    }

    /// Messages received on or after `date`.
    pub async fn search_since(&mut self, date: NaiveDate) -> Result<Vec<u32>> {
        self.search_criteria(&SearchCriteria::Since(date)).await
    }

    /// Messages sent on `date`.
    pub async fn search_sent_on(&mut self, date: NaiveDate) -> Result<Vec<u32>> {
        self.search_criteria(&SearchCriteria::SentOn(date)).await
    }

    /// Messages sent on or after `date`.
    pub async fn search_sent_since(&mut self, date: NaiveDate) -> Result<Vec<u32>> {
        self.search_criteria(&SearchCriteria::SentSince(date)).await
    }

    /// Messages sent before `date`.
    pub async fn search_sent_before(&mut self, date: NaiveDate) -> Result<Vec<u32>> {
        self.search_criteria(&SearchCriteria::SentBefore(date)).await
    }

    /// Messages larger than `size` bytes.
    pub async fn search_larger(&mut self, size: u32) -> Result<Vec<u32>> {
        self.search_criteria(&SearchCriteria::Larger(size)).await
    }

    /// Messages smaller than `size` bytes.
    pub async fn search_smaller(&mut self, size: u32) -> Result<Vec<u32>> {
        self.search_criteria(&SearchCriteria::Smaller(size)).await
    }

    /// Draft messages.
    pub async fn search_draft(&mut self) -> Result<Vec<u32>> {
        self.search_criteria(&SearchCriteria::Draft).await
    }

    /// Recent messages.
    pub async fn search_recent(&mut self) -> Result<Vec<u32>> {
        self.search_criteria(&SearchCriteria::Recent).await
    }

    /// Unseen messages.
    pub async fn search_unseen(&mut self) -> Result<Vec<u32>> {
        self.search_criteria(&SearchCriteria::Unseen).await
    }

    /// Messages marked deleted.
    pub async fn search_deleted(&mut self) -> Result<Vec<u32>> {
        self.search_criteria(&SearchCriteria::Deleted).await
    }

    /// Answered messages.
    pub async fn search_answered(&mut self) -> Result<Vec<u32>> {
        self.search_criteria(&SearchCriteria::Answered).await
    }

    /// Unanswered messages.
    pub async fn search_unanswered(&mut self) -> Result<Vec<u32>> {
        self.search_criteria(&SearchCriteria::Unanswered).await
    }

    /// Messages both recent and unseen.
    pub async fn search_recent_unseen(&mut self) -> Result<Vec<u32>> {
        self.search_criteria(&SearchCriteria::RecentUnseen).await
    }

    async fn fetch_items(&mut self, sequence: SequenceSet, items: FetchItems) -> Result<Response> {
        self.execute(&Command::Fetch { sequence, items }).await
    }

    fn message_id(&mut self, message: &Message) -> Result<u32> {
        let id = message
            .id
            .ok_or_else(|| Error::InvalidArgument("message has no sequence number".to_string()));
        self.record(id)
    }

    fn require<R>(&mut self, value: Option<R>, id: u32) -> Result<R> {
        let value = value.ok_or_else(|| Error::Protocol(format!("no FETCH data for message {id}")));
        self.record(value)
    }
}

/// FETCH responses among a command's untagged lines.
///
/// Other untagged data (`EXISTS`, `RECENT`) is skipped; malformed FETCH
/// lines are logged and skipped.
fn fetch_responses(response: &Response) -> impl Iterator<Item = FetchResponse> + '_ {
    response
        .lines
        .iter()
        .filter(|line| is_fetch(line))
        .filter_map(|line| match parse_fetch(line) {
            Ok(fetched) => Some(fetched),
            Err(error) => {
                warn!(%error, "skipping unparseable FETCH response");
                None
            }
        })
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
    use crate::command::TagGenerator;
    use crate::connection::FramedTransport;
    use tidemail_mime::TransferEncoding;
    use tokio_test::io::Builder;

    fn session(mock: tokio_test::io::Mock) -> Session<FramedTransport<tokio_test::io::Mock>> {
        Session::with_tags(FramedTransport::new(mock), TagGenerator::new("A"))
    }

    const ALTERNATIVE: &[u8] = b"* 4 FETCH (BODYSTRUCTURE ((\"TEXT\" \"PLAIN\" (\"CHARSET\" \"UTF-8\") NIL NIL \"BASE64\" 12 1)(\"TEXT\" \"HTML\" NIL NIL NIL \"QUOTED-PRINTABLE\" 30 2) \"ALTERNATIVE\"))\r\n";

    async fn message_with_parts(session: &mut Session<FramedTransport<tokio_test::io::Mock>>) -> Message {
        let mut message = Message::with_id(4);
        session.fetch_body_structure(&mut message).await.unwrap();
        message
    }

    #[tokio::test]
    async fn test_fetch_appends_in_server_order() {
        let mock = Builder::new()
            .write(b"A0000 FETCH 1:2 ALL\r\n")
            .read(b"* 2 FETCH (FLAGS () RFC822.SIZE 20)\r\n")
            .read(b"* 3 EXISTS\r\n")
            .read(b"* 1 FETCH (FLAGS (\\Seen) RFC822.SIZE 10)\r\n")
            .read(b"A0000 OK FETCH completed\r\n")
            .build();
        let mut session = session(mock);
        let mut mailbox = Mailbox::inbox();

        let added = session.fetch_range(&mut mailbox, 1, 2).await.unwrap();
        assert_eq!(added, 2);
        let ids: Vec<_> = mailbox.messages().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![Some(2), Some(1)]);
        assert!(mailbox.find_by_id(1).unwrap().flags.is_seen());
    }

    #[tokio::test]
    async fn test_fetch_ids_empty_sends_nothing() {
        let mock = Builder::new().build();
        let mut session = session(mock);
        let mut mailbox = Mailbox::inbox();

        assert_eq!(session.fetch_ids(&mut mailbox, &[]).await.unwrap(), 0);
        assert_eq!(session.fetch_mailbox(&mut mailbox).await.unwrap(), 0);
        assert!(session.last_tag().is_none());
    }

    #[tokio::test]
    async fn test_fetch_ids_list() {
        let mock = Builder::new()
            .write(b"A0000 FETCH 3,9 ALL\r\n")
            .read(b"* 3 FETCH (UID 30)\r\n* 9 FETCH (UID 90)\r\nA0000 OK done\r\n")
            .build();
        let mut session = session(mock);
        let mut mailbox = Mailbox::inbox();

        session.fetch_ids(&mut mailbox, &[3, 9]).await.unwrap();
        assert_eq!(mailbox.find_by_id(9).unwrap().uid, Some(90));
    }

    #[tokio::test]
    async fn test_fetch_uid() {
        let mock = Builder::new()
            .write(b"A0000 FETCH 5 UID\r\n")
            .read(b"* 5 FETCH (UID 4827)\r\nA0000 OK done\r\n")
            .write(b"A0001 FETCH 6 UID\r\n")
            .read(b"A0001 OK done\r\n")
            .build();
        let mut session = session(mock);

        assert_eq!(session.fetch_uid(5).await.unwrap(), 4827);
        assert!(matches!(session.fetch_uid(6).await, Err(Error::Protocol(_))));
        assert_eq!(session.error_string(), "Protocol error: no FETCH data for message 6");
    }

    #[tokio::test]
    async fn test_fetch_headers() {
        let mock = Builder::new()
            .write(b"A0000 FETCH 7 ALL\r\n")
            .read(b"* 7 FETCH (ENVELOPE (NIL \"Status\" NIL NIL NIL NIL NIL NIL NIL \"<m@x>\"))\r\n")
            .read(b"A0000 OK done\r\n")
            .build();
        let mut session = session(mock);

        let message = session.fetch_headers(7).await.unwrap();
        assert_eq!(message.subject, "Status");
        assert_eq!(message.message_id.as_deref(), Some("m@x"));
    }

    #[tokio::test]
    async fn test_fetch_body_structure() {
        let mock = Builder::new()
            .write(b"A0000 FETCH 4 BODYSTRUCTURE\r\n")
            .read(ALTERNATIVE)
            .read(b"A0000 OK done\r\n")
            .build();
        let mut session = session(mock);

        let message = message_with_parts(&mut session).await;
        assert_eq!(message.body_parts().len(), 2);
        assert!(message.has_text_part());
        assert!(message.has_html_part());
    }

    #[tokio::test]
    async fn test_body_structure_missing_gets_default() {
        let mock = Builder::new()
            .write(b"A0000 FETCH 4 BODYSTRUCTURE\r\n")
            .read(b"A0000 OK done\r\n")
            .build();
        let mut session = session(mock);

        let message = message_with_parts(&mut session).await;
        assert_eq!(message.body_parts().len(), 1);
        assert_eq!(message.body_parts()[0].part_number(), "1");
    }

    #[tokio::test]
    async fn test_fetch_body_part_base64_literal() {
        let mock = Builder::new()
            .write(b"A0000 FETCH 4 BODYSTRUCTURE\r\n")
            .read(ALTERNATIVE)
            .read(b"A0000 OK done\r\n")
            .write(b"A0001 FETCH 4 BODY[1]\r\n")
            .read(b"* 4 FETCH (BODY[1] {20}\r\n")
            .read(b"SGVsbG8s\r\nIHdvcmxk\r\n)\r\n")
            .read(b"A0001 OK done\r\n")
            .build();
        let mut session = session(mock);
        let mut message = message_with_parts(&mut session).await;

        session.fetch_body_part(&mut message, 0).await.unwrap();
        let part = message.text_part().unwrap();
        assert_eq!(part.transfer_encoding(), TransferEncoding::Base64);
        assert_eq!(part.raw_data().unwrap(), b"SGVsbG8sIHdvcmxk");
        assert_eq!(part.decoded_text().unwrap(), "Hello, world");
    }

    #[tokio::test]
    async fn test_fetch_body_part_quoted_printable() {
        let mock = Builder::new()
            .write(b"A0000 FETCH 4 BODYSTRUCTURE\r\n")
            .read(ALTERNATIVE)
            .read(b"A0000 OK done\r\n")
            .write(b"A0001 FETCH 4 BODY[2]\r\n")
            .read(b"* 4 FETCH (BODY[2] {19}\r\n<p>caf=C3=\r\n=A9</p>)\r\n")
            .read(b"A0001 OK done\r\n")
            .build();
        let mut session = session(mock);
        let mut message = message_with_parts(&mut session).await;

        session.fetch_body_part(&mut message, 1).await.unwrap();
        let html = message.html_part().unwrap();
        assert_eq!(html.decoded_text().unwrap().trim_end(), "<p>café</p>");
    }

    #[tokio::test]
    async fn test_fetch_body_part_out_of_range() {
        let mock = Builder::new().build();
        let mut session = session(mock);
        let mut message = Message::with_id(4);

        let error = session.fetch_body_part(&mut message, 3).await.unwrap_err();
        assert!(matches!(error, Error::InvalidArgument(_)));
        assert!(session.last_tag().is_none());
        assert!(session.error_string().contains("out of range"));
    }

    #[tokio::test]
    async fn test_set_seen() {
        let mock = Builder::new()
            .write(b"A0000 FETCH 12 UID\r\n")
            .read(b"* 12 FETCH (UID 42)\r\nA0000 OK done\r\n")
            .write(b"A0001 UID STORE 42 +flags (\\Seen)\r\n")
            .read(b"* 12 FETCH (FLAGS (\\Seen) UID 42)\r\nA0001 OK STORE completed\r\n")
            .build();
        let mut session = session(mock);

        session.set_seen(12, true).await.unwrap();
    }

    #[tokio::test]
    async fn test_clear_flag_needs_data_line() {
        let mock = Builder::new()
            .write(b"A0000 FETCH 12 UID\r\n")
            .read(b"* 12 FETCH (UID 42)\r\nA0000 OK done\r\n")
            .write(b"A0001 UID STORE 42 -flags (\\Flagged)\r\n")
            .read(b"A0001 OK STORE completed\r\n")
            .build();
        let mut session = session(mock);

        let error = session.set_flagged(12, false).await.unwrap_err();
        assert!(matches!(error, Error::Protocol(_)));
    }

    #[tokio::test]
    async fn test_search() {
        let mock = Builder::new()
            .write(b"A0000 SEARCH UNSEEN FROM alice\r\n")
            .read(b"* SEARCH 9 2 17\r\nA0000 OK SEARCH completed\r\n")
            .build();
        let mut session = session(mock);

        assert_eq!(session.search(" UNSEEN FROM alice ").await.unwrap(), vec![9, 2, 17]);
    }

    #[tokio::test]
    async fn test_empty_search_sends_nothing() {
        let mock = Builder::new().build();
        let mut session = session(mock);

        assert!(session.search("").await.unwrap().is_empty());
        assert!(session.search("   ").await.unwrap().is_empty());
        assert!(session.last_tag().is_none());
    }

    #[tokio::test]
    async fn test_search_text_with_line_break_is_rejected() {
        let mock = Builder::new().build();
        let mut session = session(mock);

        let error = session
            .search_subject("x\r\nA9 DELETE INBOX")
            .await
            .unwrap_err();
        assert!(matches!(error, Error::InvalidArgument(_)));
        assert!(session.search("UNSEEN\nA9 LOGOUT").await.is_err());
        assert!(session.last_tag().is_none());
    }

    #[tokio::test]
    async fn test_typed_searches() {
        let mock = Builder::new()
            .write(b"A0000 SEARCH SUBJECT \"weekly report\"\r\n")
            .read(b"* SEARCH 4\r\nA0000 OK done\r\n")
            .write(b"A0001 SEARCH SINCE 01-Jan-2024\r\n")
            .read(b"* SEARCH\r\nA0001 OK done\r\n")
            .write(b"A0002 SEARCH RECENT UNSEEN\r\n")
            .read(b"* SEARCH 1 2\r\nA0002 OK done\r\n")
            .write(b"A0003 SEARCH LARGER 1000\r\n")
            .read(b"* SEARCH 8\r\nA0003 OK done\r\n")
            .build();
        let mut session = session(mock);

        assert_eq!(session.search_subject("weekly report").await.unwrap(), vec![4]);
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(session.search_since(day).await.unwrap().is_empty());
        assert_eq!(session.search_recent_unseen().await.unwrap(), vec![1, 2]);
        assert_eq!(session.search_larger(1000).await.unwrap(), vec![8]);
    }
}
