//! A fetched message: envelope, flags, and body parts.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};

use super::{Address, BodyPart, Flags};
use crate::parser::date::parse_offset;

/// How many leading body parts are checked for the text and HTML parts.
const PREFERRED_PART_SCAN: usize = 2;

/// A message built up across FETCH responses.
///
/// Envelope fields and flags come from `FETCH ... ALL`, the body part list
/// from `FETCH ... BODYSTRUCTURE`, and part data from `FETCH ... BODY[n]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Sequence number, `None` for a message not read from a mailbox.
    pub id: Option<u32>,
    /// Unique identifier.
    pub uid: Option<u32>,
    /// Message-ID header, without angle brackets.
    pub message_id: Option<String>,
    /// In-Reply-To message id, without angle brackets.
    pub reference: Option<String>,
    /// RFC822.SIZE.
    pub size: u32,
    /// Decoded subject, empty when absent.
    pub subject: String,
    /// Date header, local to [`Message::time_zone`].
    pub sent: Option<NaiveDateTime>,
    /// INTERNALDATE.
    pub received: Option<NaiveDateTime>,
    /// Offset token that followed the sent date (`+0100`, `NIL`), if any.
    pub time_zone: String,
    /// System flags.
    pub flags: Flags,
    /// First From address.
    pub from: Option<Address>,
    /// First Sender address.
    pub sender: Option<Address>,
    /// First Reply-To address.
    pub reply_to: Option<Address>,
    /// To addresses.
    pub to: Vec<Address>,
    /// Cc addresses.
    pub cc: Vec<Address>,
    /// Bcc addresses.
    pub bcc: Vec<Address>,
    body_parts: Vec<BodyPart>,
    text_part_index: Option<usize>,
    html_part_index: Option<usize>,
}

impl Message {
    /// Creates an empty message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty message for a sequence number.
    #[must_use]
    pub fn with_id(id: u32) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Returns true if the message has no sequence number.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.id.is_none()
    }

    /// Sent date combined with the captured offset.
    ///
    /// `None` unless both the date and a numeric offset (or `GMT`/`UT`) are
    /// known.
    #[must_use]
    pub fn sent_at(&self) -> Option<DateTime<FixedOffset>> {
        let sent = self.sent?;
        let offset = parse_offset(&self.time_zone)?;
        offset.from_local_datetime(&sent).single()
    }

    /// Body parts in BODYSTRUCTURE order.
    #[must_use]
    pub fn body_parts(&self) -> &[BodyPart] {
        &self.body_parts
    }

    /// Body part at `index`.
    #[must_use]
    pub fn body_part_at(&self, index: usize) -> Option<&BodyPart> {
        self.body_parts.get(index)
    }

    pub(crate) fn body_part_at_mut(&mut self, index: usize) -> Option<&mut BodyPart> {
        self.body_parts.get_mut(index)
    }

    /// Replaces the body parts and recomputes the text/HTML part indices.
    pub fn set_body_parts(&mut self, parts: Vec<BodyPart>) {
        self.body_parts = parts;
        self.text_part_index = None;
        self.html_part_index = None;

        for (index, part) in self.body_parts.iter().take(PREFERRED_PART_SCAN).enumerate() {
            if part.is_content_type("text", "plain") {
                self.text_part_index = Some(index);
            } else if part.is_content_type("text", "html") {
                self.html_part_index = Some(index);
            }
        }
    }

    /// Index of the TEXT/PLAIN part among the first two parts.
    #[must_use]
    pub const fn text_part_index(&self) -> Option<usize> {
        self.text_part_index
    }

    /// Index of the TEXT/HTML part among the first two parts.
    #[must_use]
    pub const fn html_part_index(&self) -> Option<usize> {
        self.html_part_index
    }

    /// The TEXT/PLAIN part, if one was found.
    #[must_use]
    pub fn text_part(&self) -> Option<&BodyPart> {
        self.text_part_index.and_then(|i| self.body_parts.get(i))
    }

    /// The TEXT/HTML part, if one was found.
    #[must_use]
    pub fn html_part(&self) -> Option<&BodyPart> {
        self.html_part_index.and_then(|i| self.body_parts.get(i))
    }

    /// Returns true if a TEXT/PLAIN part was found.
    #[must_use]
    pub const fn has_text_part(&self) -> bool {
        self.text_part_index.is_some()
    }

    /// Returns true if a TEXT/HTML part was found.
    #[must_use]
    pub const fn has_html_part(&self) -> bool {
        self.html_part_index.is_some()
    }

    /// Parts that carry a file name.
    pub fn attachments(&self) -> impl Iterator<Item = &BodyPart> {
        self.body_parts.iter().filter(|part| part.is_attachment())
    }
}
