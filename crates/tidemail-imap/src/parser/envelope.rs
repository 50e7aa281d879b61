//! ENVELOPE parsing.
//!
//! The envelope is a fixed ten-slot list:
//! `(date subject from sender reply-to to cc bcc in-reply-to message-id)`.
//! A slot with an unexpected shape keeps its default so the rest of the
//! message stays usable.

use tidemail_mime::encoding::decode_header;
use tracing::warn;

use super::cursor::Value;
use super::date::{parse_date, split_time_zone};
use crate::types::{Address, Message, UNKNOWN_PART};

const ADDRESS_SLOTS: [&str; 6] = ["from", "sender", "reply-to", "to", "cc", "bcc"];

/// Fills the envelope fields of `message` from a parsed ENVELOPE list.
pub fn apply_envelope(message: &mut Message, envelope: &Value) {
    let Some(slots) = envelope.as_list() else {
        warn!(id = ?message.id, "ENVELOPE is not a list");
        return;
    };

    if let Some(date) = slots.first().and_then(Value::as_text) {
        let (_, zone) = split_time_zone(&date);
        message.time_zone = zone.to_string();
        message.sent = parse_date(&date);
        if message.sent.is_none() {
            warn!(id = ?message.id, date = %date, "unparseable envelope date");
        }
    }

    message.subject = slots
        .get(1)
        .and_then(Value::as_text)
        .map(|subject| decode_header(&subject))
        .unwrap_or_default();

    let mut lists = ADDRESS_SLOTS
        .iter()
        .enumerate()
        .map(|(offset, slot)| match slots.get(2 + offset) {
            Some(value) => parse_address_list(value, slot),
            None => Vec::new(),
        });

    message.from = lists.next().and_then(first);
    message.sender = lists.next().and_then(first);
    message.reply_to = lists.next().and_then(first);
    message.to = lists.next().unwrap_or_default();
    message.cc = lists.next().unwrap_or_default();
    message.bcc = lists.next().unwrap_or_default();

    message.reference = slots.get(8).and_then(message_id);
    message.message_id = slots.get(9).and_then(message_id);
}

/// Parses one address-list slot: `NIL` or a list of 4-tuples.
#[must_use]
pub fn parse_address_list(value: &Value, slot: &str) -> Vec<Address> {
    if value.is_nil() {
        return Vec::new();
    }
    match value.as_list() {
        Some(entries) => entries.iter().filter_map(parse_address).collect(),
        None => {
            warn!(slot, value = ?value, "malformed address list");
            Vec::new()
        }
    }
}

/// Parses one `(display-name smtp-route mailbox host)` tuple.
///
/// A single missing mailbox or host half becomes `"unknown"`. Tuples with
/// both halves missing are RFC 2822 group markers and are skipped.
#[must_use]
pub fn parse_address(value: &Value) -> Option<Address> {
    let Some([name, route, mailbox, host]) = value.as_list() else {
        warn!(value = ?value, "malformed address tuple");
        return None;
    };

    let mailbox = mailbox.as_text();
    let host = host.as_text();
    if mailbox.is_none() && host.is_none() {
        return None;
    }

    let mut address = Address::new(
        mailbox.as_deref().unwrap_or(UNKNOWN_PART),
        host.as_deref().unwrap_or(UNKNOWN_PART),
    );
    if let Some(name) = name.as_text() {
        address = address.with_display_name(decode_header(&name));
    }
    if let Some(route) = route.as_text() {
        address = address.with_smtp_domain(decode_header(&route));
    }
    Some(address)
}

fn first(addresses: Vec<Address>) -> Option<Address> {
    addresses.into_iter().next()
}

fn message_id(value: &Value) -> Option<String> {
    let text = value.as_text()?;
    let id = text.trim().trim_start_matches('<').trim_end_matches('>');
    (!id.is_empty()).then(|| id.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use crate::parser::cursor::Cursor;
    use chrono::Timelike;

    fn value(text: &str) -> Value {
        Cursor::new(text.as_bytes()).parse_value().unwrap()
    }

    fn envelope(text: &str) -> Message {
        let mut message = Message::with_id(1);
        apply_envelope(&mut message, &value(text));
        message
    }

    #[test]
    fn test_full_envelope() {
        let message = envelope(
            r#"("Mon, 1 Jan 2024 10:00:00 +0100" "=?UTF-8?B?SGVsbG8=?=" (("Alice" NIL "alice" "x.com")) (("Alice" NIL "alice" "x.com")) (("Desk" NIL "desk" "x.com") ("Other" NIL "other" "x.com")) (("Bob" NIL "bob" "y.org") (NIL NIL "carol" "y.org")) NIL NIL "<parent@x.com>" "<id@x.com>")"#,
        );

        assert_eq!(message.subject, "Hello");
        assert_eq!(message.time_zone, "+0100");
        assert_eq!(message.sent.unwrap().hour(), 10);
        assert_eq!(message.from.as_ref().unwrap().to_string(), "\"Alice\" <alice@x.com>");
        assert_eq!(message.reply_to.as_ref().unwrap().mailbox(), "desk");
        assert_eq!(message.to.len(), 2);
        assert_eq!(message.to[1].to_string(), "carol@y.org");
        assert!(message.cc.is_empty());
        assert_eq!(message.reference.as_deref(), Some("parent@x.com"));
        assert_eq!(message.message_id.as_deref(), Some("id@x.com"));
    }

    #[test]
    fn test_nil_subject_and_date() {
        let message = envelope("(NIL NIL NIL NIL NIL NIL NIL NIL NIL NIL)");
        assert_eq!(message.subject, "");
        assert!(message.sent.is_none());
        assert!(message.from.is_none());
        assert!(message.message_id.is_none());
    }

    #[test]
    fn test_unknown_address_half() {
        let address = parse_address(&value(r#"(NIL NIL "root" NIL)"#)).unwrap();
        assert_eq!(address.address(), "root@unknown");
    }

    #[test]
    fn test_group_marker_skipped() {
        let list = parse_address_list(
            &value(r#"((NIL NIL "team" NIL) (NIL NIL "a" "x.com") (NIL NIL NIL NIL))"#),
            "to",
        );
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].address(), "team@unknown");
        assert_eq!(list[1].address(), "a@x.com");
    }

    #[test]
    fn test_encoded_display_name() {
        let address = parse_address(&value(r#"("=?ISO-8859-1?Q?J=F6rg?=" NIL "j" "x.de")"#)).unwrap();
        assert_eq!(address.display_name(), Some("Jörg"));
    }

    #[test]
    fn test_malformed_slot_keeps_default() {
        let message = envelope(r#"("01-Jan-2024 10:00:00 +0000" "Hi" "oops" NIL NIL (("A" NIL "a" "x.com")) NIL NIL NIL NIL)"#);
        assert!(message.from.is_none());
        assert_eq!(message.to.len(), 1);
        assert_eq!(message.subject, "Hi");
    }

    #[test]
    fn test_nil_address_list_is_empty() {
        assert!(parse_address_list(&Value::Nil, "cc").is_empty());
        assert!(parse_address_list(&value(r#""oops""#), "cc").is_empty());
    }

    #[test]
    fn test_short_envelope() {
        let message = envelope(r#"("01-Jan-2024 10:00:00 +0000" "Hi")"#);
        assert_eq!(message.subject, "Hi");
        assert!(message.to.is_empty());
    }
}
