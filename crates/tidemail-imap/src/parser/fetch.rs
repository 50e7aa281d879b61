//! FETCH response parsing.

use tracing::warn;

use super::body_structure::parse_body_structure;
use super::cursor::{Cursor, Value};
use super::date::parse_date;
use super::envelope::apply_envelope;
use super::response::flags_from_values;
use crate::types::Message;
use crate::{Error, Result};

/// One untagged `* n FETCH (...)` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// Message sequence number.
    pub id: u32,
    /// Item name (upper-cased) and value pairs, in server order.
    pub items: Vec<(String, Value)>,
}

impl FetchResponse {
    /// Value of the named item, ignoring case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.items
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    /// `UID` item, if present.
    #[must_use]
    pub fn uid(&self) -> Option<u32> {
        self.get("UID").and_then(Value::as_number)
    }

    /// Content of `BODY[section]`, ignoring any `<origin>` suffix.
    ///
    /// `None` when the section is absent or `NIL`.
    #[must_use]
    pub fn body_section(&self, section: &str) -> Option<&[u8]> {
        let wanted = format!("BODY[{section}]");
        self.items
            .iter()
            .find(|(key, _)| {
                key.split('<')
                    .next()
                    .is_some_and(|key| key.eq_ignore_ascii_case(&wanted))
            })
            .and_then(|(_, value)| value.as_bytes())
    }

    /// Builds a message from the items this response carries.
    ///
    /// Items that are absent leave their field at its default.
    #[must_use]
    pub fn to_message(&self) -> Message {
        let mut message = Message::with_id(self.id);

        for (key, value) in &self.items {
            match key.as_str() {
                "FLAGS" => {
                    message.flags = value.as_list().map(flags_from_values).unwrap_or_default();
                }
                "UID" => message.uid = value.as_number(),
                "RFC822.SIZE" => message.size = value.as_number().unwrap_or_default(),
                "INTERNALDATE" => message.received = value.as_text().and_then(|d| parse_date(&d)),
                "ENVELOPE" => apply_envelope(&mut message, value),
                "BODYSTRUCTURE" => message.set_body_parts(parse_body_structure(value)),
                _ => {}
            }
        }

        message
    }
}

/// Parses `* n FETCH (name value ...)`.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the line is not a FETCH response or a value in
/// it cannot be read.
pub fn parse_fetch(line: &[u8]) -> Result<FetchResponse> {
    let mut cursor = Cursor::new(line);
    cursor.expect("* ")?;
    let id = cursor.parse_number()?;
    cursor.expect(" FETCH ")?;

    let list = cursor.parse_paren_list()?;
    let mut values = list.into_iter();
    let mut items = Vec::new();

    while let Some(name) = values.next() {
        let Value::Atom(name) = name else {
            return Err(Error::Parse {
                position: cursor.position(),
                message: format!("Expected FETCH item name, got {name:?}"),
            });
        };
        let value = values.next().unwrap_or(Value::Nil);
        items.push((name.to_ascii_uppercase(), value));
    }

    Ok(FetchResponse { id, items })
}

/// Returns true for a line shaped like `* n FETCH ...`.
#[must_use]
pub fn is_fetch(line: &[u8]) -> bool {
    let mut cursor = Cursor::new(line);
    cursor.try_expect("* ") && cursor.parse_number().is_ok() && cursor.try_expect(" FETCH")
}

/// Parses a FETCH line into a message, or `None` with a warning.
#[must_use]
pub fn parse_message(line: &[u8]) -> Option<Message> {
    match parse_fetch(line) {
        Ok(response) => Some(response.to_message()),
        Err(error) => {
            warn!(%error, "skipping unparseable FETCH response");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use crate::types::{Flag, Flags};
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_envelope_scenario() {
        let line = br#"* 12 FETCH (FLAGS (\Seen) RFC822.SIZE 512 ENVELOPE ("01-Jan-2024 10:00:00 +0000" "Hello" (("A" NIL "a" "x.com")) NIL NIL (("A" NIL "a" "x.com")) NIL NIL NIL NIL))"#;
        let message = parse_message(line).unwrap();

        assert_eq!(message.id, Some(12));
        assert_eq!(message.flags, Flags::from(Flag::Seen));
        assert_eq!(message.size, 512);
        assert_eq!(message.subject, "Hello");
        assert_eq!(message.from.as_ref().unwrap().address(), "a@x.com");
        assert_eq!(message.to.len(), 1);
        assert_eq!(message.to[0].address(), "a@x.com");
        assert_eq!(message.time_zone, "+0000");
        assert_eq!(message.sent.unwrap().year(), 2024);
    }

    #[test]
    fn test_internaldate_and_uid() {
        let line = b"* 3 FETCH (UID 77 INTERNALDATE \"17-Jul-1996 02:44:25 -0700\" FLAGS ())\r\n";
        let message = parse_message(line).unwrap();
        assert_eq!(message.uid, Some(77));
        assert_eq!(message.received.unwrap().hour(), 2);
        assert!(message.flags.is_empty());
        assert!(message.sent.is_none());
    }

    #[test]
    fn test_subject_literal() {
        let line = b"* 4 FETCH (ENVELOPE (NIL {11}\r\nHi (there)) NIL NIL NIL NIL NIL NIL NIL NIL))\r\n";
        let message = parse_message(line).unwrap();
        assert_eq!(message.subject, "Hi (there))");
    }

    #[test]
    fn test_body_section() {
        let response = parse_fetch(b"* 5 FETCH (UID 9 BODY[1.2]<0> {5}\r\nhello)\r\n").unwrap();
        assert_eq!(response.uid(), Some(9));
        assert_eq!(response.body_section("1.2"), Some(&b"hello"[..]));
        assert!(response.body_section("1").is_none());

        let nil = parse_fetch(b"* 5 FETCH (BODY[1] NIL)\r\n").unwrap();
        assert!(nil.body_section("1").is_none());
    }

    #[test]
    fn test_bodystructure_item() {
        let line = br#"* 6 FETCH (BODYSTRUCTURE (("TEXT" "PLAIN" NIL NIL NIL "7BIT" 10 1)("TEXT" "HTML" NIL NIL NIL "7BIT" 20 2) "ALTERNATIVE"))"#;
        let message = parse_message(line).unwrap();
        assert_eq!(message.body_parts().len(), 2);
        assert_eq!(message.text_part_index(), Some(0));
        assert_eq!(message.html_part_index(), Some(1));
    }

    #[test]
    fn test_not_a_fetch() {
        assert!(is_fetch(b"* 1 fetch (UID 3)\r\n"));
        assert!(!is_fetch(b"* 3 EXISTS\r\n"));
        assert!(parse_fetch(b"* 3 EXISTS\r\n").is_err());
        assert!(parse_message(b"* SEARCH 1 2\r\n").is_none());
    }
}
