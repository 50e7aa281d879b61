//! Command serialization helpers.

use crate::parser::date::format_date;

use super::types::{FetchItems, SearchCriteria, StoreAction};

/// Writes an astring (atom or quoted string).
pub fn write_astring(buf: &mut Vec<u8>, s: &str) {
    if s.is_empty() || s.bytes().any(needs_quoting) {
        buf.push(b'"');
        for b in s.bytes() {
            if b == b'"' || b == b'\\' {
                buf.push(b'\\');
            }
            buf.push(b);
        }
        buf.push(b'"');
    } else {
        buf.extend_from_slice(s.as_bytes());
    }
}

/// Returns true if the byte needs quoting.
const fn needs_quoting(b: u8) -> bool {
    matches!(b, b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*') || b < 0x20 || b >= 0x7F
}

/// Writes FETCH items.
pub fn write_fetch_items(buf: &mut Vec<u8>, items: &FetchItems) {
    match items {
        FetchItems::All => buf.extend_from_slice(b"ALL"),
        FetchItems::Uid => buf.extend_from_slice(b"UID"),
        FetchItems::BodyStructure => buf.extend_from_slice(b"BODYSTRUCTURE"),
        FetchItems::Body(section) => {
            buf.extend_from_slice(b"BODY[");
            buf.extend_from_slice(section.as_bytes());
            buf.push(b']');
        }
    }
}

/// Writes STORE action.
pub fn write_store_action(buf: &mut Vec<u8>, action: &StoreAction) {
    let (prefix, flag) = match action {
        StoreAction::AddFlag(flag) => ("+flags", flag),
        StoreAction::RemoveFlag(flag) => ("-flags", flag),
    };
    buf.extend_from_slice(prefix.as_bytes());
    buf.extend_from_slice(b" (");
    buf.extend_from_slice(flag.as_str().as_bytes());
    buf.push(b')');
}

/// Writes SEARCH criteria.
pub fn write_search_criteria(buf: &mut Vec<u8>, criteria: &SearchCriteria) {
    let (key, text) = match criteria {
        SearchCriteria::To(s) => ("TO ", s),
        SearchCriteria::Cc(s) => ("CC ", s),
        SearchCriteria::Bcc(s) => ("BCC ", s),
        SearchCriteria::From(s) => ("FROM ", s),
        SearchCriteria::Text(s) => ("TEXT ", s),
        SearchCriteria::Body(s) => ("BODY ", s),
        SearchCriteria::Subject(s) => ("SUBJECT ", s),
        SearchCriteria::Since(date) => return write_dated(buf, "SINCE ", date),
        SearchCriteria::SentOn(date) => return write_dated(buf, "SENTON ", date),
        SearchCriteria::SentSince(date) => return write_dated(buf, "SENTSINCE ", date),
        SearchCriteria::SentBefore(date) => return write_dated(buf, "SENTBEFORE ", date),
        SearchCriteria::Larger(size) => {
            buf.extend_from_slice(format!("LARGER {size}").as_bytes());
            return;
        }
        SearchCriteria::Smaller(size) => {
            buf.extend_from_slice(format!("SMALLER {size}").as_bytes());
            return;
        }
        SearchCriteria::Draft => return buf.extend_from_slice(b"DRAFT"),
        SearchCriteria::Recent => return buf.extend_from_slice(b"RECENT"),
        SearchCriteria::Unseen => return buf.extend_from_slice(b"UNSEEN"),
        SearchCriteria::Deleted => return buf.extend_from_slice(b"DELETED"),
        SearchCriteria::Answered => return buf.extend_from_slice(b"ANSWERED"),
        SearchCriteria::Unanswered => return buf.extend_from_slice(b"UNANSWERED"),
        SearchCriteria::RecentUnseen => return buf.extend_from_slice(b"RECENT UNSEEN"),
        SearchCriteria::Raw(s) => return buf.extend_from_slice(s.trim().as_bytes()),
    };
    buf.extend_from_slice(key.as_bytes());
    write_astring(buf, text);
}

fn write_dated(buf: &mut Vec<u8>, key: &str, date: &chrono::NaiveDate) {
    buf.extend_from_slice(key.as_bytes());
    buf.extend_from_slice(format_date(*date).as_bytes());
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use crate::types::Flag;

    fn astring(s: &str) -> String {
        let mut buf = Vec::new();
        write_astring(&mut buf, s);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_astring_atom() {
        assert_eq!(astring("INBOX"), "INBOX");
    }

    #[test]
    fn test_astring_quoted() {
        assert_eq!(astring(""), "\"\"");
        assert_eq!(astring("Sent Items"), "\"Sent Items\"");
        assert_eq!(astring("a\"b\\c"), "\"a\\\"b\\\\c\"");
        assert_eq!(astring("*"), "\"*\"");
        assert_eq!(astring("Caf\u{e9}"), "\"Caf\u{e9}\"");
    }

    #[test]
    fn test_store_action() {
        let mut buf = Vec::new();
        write_store_action(&mut buf, &StoreAction::RemoveFlag(Flag::Flagged));
        assert_eq!(buf, b"-flags (\\Flagged)");
    }

    #[test]
    fn test_fetch_body_section() {
        let mut buf = Vec::new();
        write_fetch_items(&mut buf, &FetchItems::Body("2.1".to_string()));
        assert_eq!(buf, b"BODY[2.1]");
    }
}
