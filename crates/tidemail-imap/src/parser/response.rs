//! Line-level response parsing.
//!
//! Classifies logical lines (tagged completion, untagged data, continuation
//! request) and extracts the untagged data each command needs.

use super::cursor::{Cursor, Value};
use crate::types::{Flags, ListEntry, MailboxAttribute};

/// Completion status of a tagged response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command succeeded.
    Ok,
    /// Command failed.
    No,
    /// Command was malformed.
    Bad,
}

/// A tagged completion line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Status word.
    pub status: Status,
    /// Text after the status word, response code included.
    pub text: String,
}

impl Completion {
    /// Returns true for OK.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

/// Parses `<tag> OK|NO|BAD text` for the given tag, ignoring case.
///
/// Returns `None` for any line that is not the completion of `tag`.
#[must_use]
pub fn parse_completion(line: &[u8], tag: &str) -> Option<Completion> {
    let mut cursor = Cursor::new(line);
    cursor.expect(tag).ok()?;
    cursor.expect(" ").ok()?;
    parse_status(&mut cursor)
}

/// Returns true for a line that looks like any command's completion.
///
/// Used to spot tagged responses that belong to a different tag.
#[must_use]
pub fn is_tagged_completion(line: &[u8]) -> bool {
    if is_untagged(line) || is_continuation(line) {
        return false;
    }
    let mut cursor = Cursor::new(line);
    cursor.parse_atom().is_ok() && cursor.try_expect(" ") && parse_status(&mut cursor).is_some()
}

fn parse_status(cursor: &mut Cursor<'_>) -> Option<Completion> {
    let status = if cursor.try_expect("OK") {
        Status::Ok
    } else if cursor.try_expect("NO") {
        Status::No
    } else if cursor.try_expect("BAD") {
        Status::Bad
    } else {
        return None;
    };

    if !matches!(cursor.peek(), None | Some(b' ' | b'\r' | b'\n')) {
        return None;
    }
    Some(Completion {
        status,
        text: line_text(cursor.remaining()),
    })
}

/// Returns true for an untagged (`*`) line.
#[must_use]
pub fn is_untagged(line: &[u8]) -> bool {
    line.starts_with(b"*")
}

/// Returns true for a continuation request (`+`).
#[must_use]
pub fn is_continuation(line: &[u8]) -> bool {
    line.starts_with(b"+")
}

/// Payload of a continuation request, without `+`, spaces, or CRLF.
#[must_use]
pub fn continuation_text(line: &[u8]) -> &[u8] {
    let text = line.strip_prefix(b"+").unwrap_or(line);
    text.trim_ascii()
}

/// Byte count of the `{N}` literal announced at the end of a line.
#[must_use]
pub fn literal_length(line: &[u8]) -> Option<usize> {
    let line = line.trim_ascii_end();
    let body = line.strip_suffix(b"}")?;
    let open = body.iter().rposition(|&b| b == b'{')?;
    let digits = &body[open + 1..];
    let digits = digits.strip_suffix(b"+").unwrap_or(digits);
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

/// Parses a server greeting; true if the server is ready (`OK`/`PREAUTH`).
#[must_use]
pub fn is_ready_greeting(line: &[u8]) -> bool {
    let mut cursor = Cursor::new(line);
    cursor.try_expect("* ") && (cursor.try_expect("OK") || cursor.try_expect("PREAUTH"))
}

/// Data from one untagged SELECT/EXAMINE line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectData {
    /// `* n EXISTS`.
    Exists(u32),
    /// `* n RECENT`.
    Recent(u32),
    /// `* FLAGS (...)`.
    Flags(Flags),
    /// `* OK [UNSEEN n]`.
    Unseen(u32),
    /// Anything else.
    Other,
}

/// Parses one untagged line of a SELECT/EXAMINE response.
#[must_use]
pub fn parse_select_data(line: &[u8]) -> SelectData {
    let mut cursor = Cursor::new(line);
    if cursor.expect("* ").is_err() {
        return SelectData::Other;
    }

    if cursor.try_expect("FLAGS ") {
        return match cursor.parse_paren_list() {
            Ok(items) => SelectData::Flags(flags_from_values(&items)),
            Err(_) => SelectData::Other,
        };
    }

    if cursor.try_expect("OK [UNSEEN ") {
        return cursor
            .parse_number()
            .map_or(SelectData::Other, SelectData::Unseen);
    }

    let Ok(count) = cursor.parse_number() else {
        return SelectData::Other;
    };
    if cursor.try_expect(" EXISTS") {
        SelectData::Exists(count)
    } else if cursor.try_expect(" RECENT") {
        SelectData::Recent(count)
    } else {
        SelectData::Other
    }
}

/// Parses `* SEARCH n n n` into ids in server order.
#[must_use]
pub fn parse_search(line: &[u8]) -> Option<Vec<u32>> {
    let mut cursor = Cursor::new(line);
    cursor.expect("* SEARCH").ok()?;
    let rest = String::from_utf8_lossy(cursor.remaining());
    Some(
        rest.split_ascii_whitespace()
            .filter_map(|id| id.parse().ok())
            .collect(),
    )
}

/// Parses `* n EXPUNGE`.
#[must_use]
pub fn parse_expunge(line: &[u8]) -> Option<u32> {
    let mut cursor = Cursor::new(line);
    cursor.expect("* ").ok()?;
    let id = cursor.parse_number().ok()?;
    cursor.expect(" EXPUNGE").ok()?;
    Some(id)
}

/// Parses `* CAPABILITY ...` into capability names.
#[must_use]
pub fn parse_capability(line: &[u8]) -> Option<Vec<String>> {
    let mut cursor = Cursor::new(line);
    cursor.expect("* CAPABILITY").ok()?;
    let rest = String::from_utf8_lossy(cursor.remaining());
    Some(rest.split_ascii_whitespace().map(str::to_string).collect())
}

/// Parses `* LIST (attributes) "delimiter" name`.
#[must_use]
pub fn parse_list(line: &[u8]) -> Option<ListEntry> {
    let mut cursor = Cursor::new(line);
    cursor.expect("* LIST ").ok()?;

    let attributes = cursor
        .parse_paren_list()
        .ok()?
        .iter()
        .filter_map(Value::as_text)
        .map(|attr| MailboxAttribute::parse(&attr))
        .collect();

    cursor.skip_spaces();
    let delimiter = cursor
        .parse_quoted_or_nil()
        .ok()?
        .and_then(|d| d.first().map(|&b| char::from(b)));

    cursor.skip_spaces();
    let name = cursor.parse_value().ok()?.as_text()?.into_owned();

    Some(ListEntry {
        attributes,
        delimiter,
        name,
    })
}

/// Builds a flag set from the atoms of a parsed flag list.
#[must_use]
pub fn flags_from_values(items: &[Value]) -> Flags {
    items
        .iter()
        .filter_map(Value::as_text)
        .filter_map(|flag| crate::types::Flag::parse(&flag))
        .collect()
}

/// Text of a line with the line ending and surrounding spaces removed.
#[must_use]
pub fn line_text(line: &[u8]) -> String {
    String::from_utf8_lossy(line.trim_ascii()).into_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use crate::types::Flag;

    #[test]
    fn test_completion_for_tag() {
        let done = parse_completion(b"A0001 OK [READ-WRITE] SELECT completed\r\n", "A0001").unwrap();
        assert!(done.is_ok());
        assert_eq!(done.text, "[READ-WRITE] SELECT completed");

        let failed = parse_completion(b"a0001 no Mailbox doesn't exist\r\n", "A0001").unwrap();
        assert_eq!(failed.status, Status::No);
        assert_eq!(failed.text, "Mailbox doesn't exist");
    }

    #[test]
    fn test_completion_other_tag_or_data() {
        assert!(parse_completion(b"A0002 OK done\r\n", "A0001").is_none());
        assert!(parse_completion(b"* OK [UNSEEN 3]\r\n", "A0001").is_none());
        assert!(parse_completion(b"A0001 OKAY\r\n", "A0001").is_none());
        assert!(parse_completion(b"A00011 OK\r\n", "A0001").is_none());
    }

    #[test]
    fn test_tagged_completion_detection() {
        assert!(is_tagged_completion(b"X9 BAD unknown\r\n"));
        assert!(!is_tagged_completion(b"* 3 EXISTS\r\n"));
        assert!(!is_tagged_completion(b"+ go ahead\r\n"));
        assert!(!is_tagged_completion(b"random text\r\n"));
    }

    #[test]
    fn test_literal_length() {
        assert_eq!(literal_length(b"* 1 FETCH (BODY[1] {42}\r\n"), Some(42));
        assert_eq!(literal_length(b"A1 APPEND x {7+}\r\n"), Some(7));
        assert_eq!(literal_length(b"* OK done\r\n"), None);
        assert_eq!(literal_length(b"* weird {}\r\n"), None);
    }

    #[test]
    fn test_continuation_text() {
        assert_eq!(continuation_text(b"+ PDE4OTYu\r\n"), b"PDE4OTYu");
        assert_eq!(continuation_text(b"+\r\n"), b"");
    }

    #[test]
    fn test_greeting() {
        assert!(is_ready_greeting(b"* OK IMAP4rev1 ready\r\n"));
        assert!(is_ready_greeting(b"* PREAUTH welcome\r\n"));
        assert!(!is_ready_greeting(b"* BYE go away\r\n"));
    }

    #[test]
    fn test_select_data() {
        assert_eq!(parse_select_data(b"* 172 EXISTS\r\n"), SelectData::Exists(172));
        assert_eq!(parse_select_data(b"* 1 RECENT\r\n"), SelectData::Recent(1));
        assert_eq!(
            parse_select_data(b"* OK [UNSEEN 12] Message 12 is first unseen\r\n"),
            SelectData::Unseen(12)
        );
        let SelectData::Flags(flags) =
            parse_select_data(b"* FLAGS (\\Answered \\Flagged \\Deleted \\Seen \\Draft)\r\n")
        else {
            panic!("expected flags");
        };
        assert!(flags.contains(Flag::Draft));
        assert_eq!(flags.len(), 5);
        assert_eq!(
            parse_select_data(b"* OK [PERMANENTFLAGS (\\Deleted \\*)]\r\n"),
            SelectData::Other
        );
    }

    #[test]
    fn test_search() {
        assert_eq!(parse_search(b"* SEARCH 2 84 882\r\n"), Some(vec![2, 84, 882]));
        assert_eq!(parse_search(b"* SEARCH\r\n"), Some(vec![]));
        assert_eq!(parse_search(b"* 3 EXISTS\r\n"), None);
    }

    #[test]
    fn test_expunge() {
        assert_eq!(parse_expunge(b"* 8 EXPUNGE\r\n"), Some(8));
        assert_eq!(parse_expunge(b"* 8 EXISTS\r\n"), None);
    }

    #[test]
    fn test_capability() {
        let caps = parse_capability(b"* CAPABILITY IMAP4rev1 AUTH=CRAM-MD5\r\n").unwrap();
        assert_eq!(caps, vec!["IMAP4rev1", "AUTH=CRAM-MD5"]);
    }

    #[test]
    fn test_list() {
        let entry = parse_list(b"* LIST (\\HasNoChildren) \"/\" \"Sent Items\"\r\n").unwrap();
        assert_eq!(entry.name, "Sent Items");
        assert_eq!(entry.delimiter, Some('/'));
        assert_eq!(entry.attributes, vec![MailboxAttribute::HasNoChildren]);

        let atom = parse_list(b"* LIST () NIL INBOX\r\n").unwrap();
        assert_eq!(atom.name, "INBOX");
        assert_eq!(atom.delimiter, None);
    }
}
