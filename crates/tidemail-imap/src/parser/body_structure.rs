//! BODYSTRUCTURE parsing into a flat list of numbered leaf parts.
//!
//! Multipart nodes are flattened: their children get the parent's number as
//! a dotted prefix (`"2.1"`, `"2.2"`). Only leaves become [`BodyPart`]s.

use tidemail_mime::encoding::decode_header;
use tidemail_mime::{ContentType, TransferEncoding};
use tracing::warn;

use super::cursor::Value;
use crate::types::BodyPart;

/// Fields every leaf carries: type, subtype, params, id, description,
/// encoding, size.
const LEAF_FIELDS: usize = 7;

/// Parses a BODYSTRUCTURE value into its leaf parts.
///
/// Never returns an empty list: when nothing is parseable a single TEXT/PLAIN
/// part numbered `"1"` stands in for the whole message.
#[must_use]
pub fn parse_body_structure(structure: &Value) -> Vec<BodyPart> {
    let mut parts = Vec::new();

    match structure.as_list() {
        Some(items) => collect(items, "", &mut parts),
        None => warn!(value = ?structure, "BODYSTRUCTURE is not a list"),
    }

    if parts.is_empty() {
        parts.push(default_part());
    }
    parts
}

/// The stand-in part used when a message has no parseable structure.
#[must_use]
pub fn default_part() -> BodyPart {
    BodyPart::new("1", ContentType::text_plain())
}

fn collect(items: &[Value], prefix: &str, parts: &mut Vec<BodyPart>) {
    if !is_multipart(items) {
        parts.extend(parse_leaf(items, format!("{prefix}1")));
        return;
    }

    // Children come first; the multipart subtype and extension data follow.
    for (index, child) in items.iter().take_while(|item| item.is_list()).enumerate() {
        let number = format!("{prefix}{}", index + 1);
        let Some(child) = child.as_list() else {
            continue;
        };
        if is_multipart(child) {
            collect(child, &format!("{number}."), parts);
        } else {
            parts.extend(parse_leaf(child, number));
        }
    }
}

fn is_multipart(items: &[Value]) -> bool {
    items.first().is_some_and(Value::is_list)
}

fn parse_leaf(items: &[Value], number: String) -> Option<BodyPart> {
    if items.len() < LEAF_FIELDS {
        warn!(part = %number, fields = items.len(), "dropping body part with too few fields");
        return None;
    }

    let (Some(main_type), Some(sub_type), Some(size)) =
        (items[0].as_text(), items[1].as_text(), items[6].as_number())
    else {
        warn!(part = %number, "dropping body part with malformed type or size");
        return None;
    };

    let mut content_type = ContentType::new(main_type, sub_type);
    for (key, value) in pairs(&items[2]) {
        let value = if key.eq_ignore_ascii_case("NAME") {
            decode_header(&value)
        } else {
            value
        };
        content_type = content_type.with_parameter(key, value);
    }

    let mut part = BodyPart::new(number, content_type);
    part.content_id = text(&items[3]);
    part.description = text(&items[4]).map(|d| decode_header(&d));
    part.transfer_encoding = items[5]
        .as_text()
        .map_or(TransferEncoding::Unknown, |enc| TransferEncoding::parse(&enc));
    part.size = size;

    let tail = &items[LEAF_FIELDS..];
    let extension = match tail {
        // TEXT/*: line count first.
        [Value::Number(lines), rest @ ..] => {
            part.lines = Some(*lines);
            rest
        }
        // MESSAGE/RFC822: envelope, nested body, line count.
        [Value::List(_), Value::List(_), lines, rest @ ..] => {
            part.lines = lines.as_number();
            rest
        }
        rest => rest,
    };

    if let Some(md5) = extension.first() {
        part.md5 = text(md5);
    }
    if let Some(disposition) = extension.get(1).and_then(Value::as_list) {
        part.disposition = disposition.first().and_then(text);
        part.disposition_file_name = disposition.get(1).and_then(|params| {
            pairs(params)
                .find(|(key, _)| key.eq_ignore_ascii_case("FILENAME"))
                .map(|(_, name)| decode_header(&name))
        });
    }
    if let Some(language) = extension.get(2) {
        part.language = language_text(language);
    }

    Some(part)
}

/// Key/value pairs of a parameter list; `NIL` yields nothing.
fn pairs(value: &Value) -> impl Iterator<Item = (String, String)> + '_ {
    value
        .as_list()
        .unwrap_or_default()
        .chunks_exact(2)
        .filter_map(|pair| Some((text(&pair[0])?, text(&pair[1])?)))
}

fn text(value: &Value) -> Option<String> {
    value.as_text().map(|t| t.into_owned())
}

fn language_text(value: &Value) -> Option<String> {
    match value {
        Value::List(tags) => {
            let tags: Vec<String> = tags.iter().filter_map(text).collect();
            (!tags.is_empty()).then(|| tags.join(", "))
        }
        other => text(other),
    }
}
