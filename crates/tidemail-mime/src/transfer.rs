//! Content-Transfer-Encoding handling for fetched body parts.

use std::fmt;

use crate::encoding::{decode_base64, decode_quoted_printable};
use crate::error::Result;

/// Platform line separator used when re-joining body lines.
#[cfg(windows)]
pub const NEWLINE: &str = "\r\n";
/// Platform line separator used when re-joining body lines.
#[cfg(not(windows))]
pub const NEWLINE: &str = "\n";

/// Content transfer encoding of a body part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransferEncoding {
    /// No transfer encoding (`BINARY`).
    None,
    /// Unrecognised token.
    #[default]
    Unknown,
    /// 7-bit text (`7BIT`).
    Utf7,
    /// 8-bit text (`8BIT`).
    Utf8,
    /// Base64 (`BASE64`).
    Base64,
    /// Quoted-Printable (`QUOTED-PRINTABLE`).
    QuotedPrintable,
}

impl TransferEncoding {
    /// Parses a transfer-encoding token, case-insensitively.
    ///
    /// Surrounding whitespace and quotes are ignored. Anything that is not
    /// exactly one of the known tokens maps to [`TransferEncoding::Unknown`].
    #[must_use]
    pub fn parse(token: &str) -> Self {
        let token = token.trim().trim_matches('"').to_ascii_uppercase();
        match token.as_str() {
            "7BIT" => Self::Utf7,
            "8BIT" => Self::Utf8,
            "BASE64" => Self::Base64,
            "BINARY" => Self::None,
            "QUOTED-PRINTABLE" => Self::QuotedPrintable,
            _ => Self::Unknown,
        }
    }

    /// Returns the wire token for this encoding.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "BINARY",
            Self::Unknown => "UNKNOWN",
            Self::Utf7 => "7BIT",
            Self::Utf8 => "8BIT",
            Self::Base64 => "BASE64",
            Self::QuotedPrintable => "QUOTED-PRINTABLE",
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Re-joins raw body lines according to the transfer encoding.
///
/// Line terminators are stripped from every line first. Base64 lines are
/// concatenated. Quoted-printable lines ending in a soft break (`=`) are
/// joined to the next line without a separator, other lines get [`NEWLINE`].
/// Every other encoding joins lines with [`NEWLINE`].
#[must_use]
pub fn join_lines<I>(lines: I, encoding: TransferEncoding) -> Vec<u8>
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    let mut joined = Vec::new();

    for line in lines {
        let line = trim_line_ending(line.as_ref());
        match encoding {
            TransferEncoding::Base64 => joined.extend_from_slice(line),
            TransferEncoding::QuotedPrintable => match line.split_last() {
                Some((b'=', head)) => joined.extend_from_slice(head),
                _ => {
                    joined.extend_from_slice(line);
                    joined.extend_from_slice(NEWLINE.as_bytes());
                }
            },
            _ => {
                joined.extend_from_slice(line);
                joined.extend_from_slice(NEWLINE.as_bytes());
            }
        }
    }

    joined
}

/// Splits data into lines, keeping each line's terminator.
pub fn split_lines(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    data.split_inclusive(|&b| b == b'\n')
}

/// Removes the FETCH response's closing parenthesis from line-collected data.
///
/// Only a trailing `)` that has no matching `(` in the data is removed, so
/// content that legitimately ends in a balanced parenthesis is kept.
#[must_use]
pub fn strip_fetch_framing(data: &[u8]) -> &[u8] {
    let trimmed = data.trim_ascii_end();
    let Some((b')', head)) = trimmed.split_last() else {
        return data;
    };

    let opened = trimmed.iter().filter(|&&b| b == b'(').count();
    let closed = trimmed.iter().filter(|&&b| b == b')').count();
    if closed > opened {
        head.trim_ascii_end()
    } else {
        data
    }
}

/// Decodes joined body data to its final bytes.
///
/// Base64 and quoted-printable content are decoded, every other encoding is
/// returned unchanged.
///
/// # Errors
///
/// Returns an error if base64 content is malformed.
pub fn decode_body(data: &[u8], encoding: TransferEncoding) -> Result<Vec<u8>> {
    match encoding {
        TransferEncoding::Base64 => decode_base64(&String::from_utf8_lossy(data)),
        TransferEncoding::QuotedPrintable => Ok(decode_quoted_printable(data)),
        _ => Ok(data.to_vec()),
    }
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_tokens() {
        assert_eq!(TransferEncoding::parse("BASE64"), TransferEncoding::Base64);
        assert_eq!(TransferEncoding::parse("7BIT"), TransferEncoding::Utf7);
        assert_eq!(TransferEncoding::parse("8bit"), TransferEncoding::Utf8);
        assert_eq!(TransferEncoding::parse("binary"), TransferEncoding::None);
        assert_eq!(
            TransferEncoding::parse("\"Quoted-Printable\""),
            TransferEncoding::QuotedPrintable
        );
    }

    #[test]
    fn test_parse_unknown_tokens() {
        assert_eq!(TransferEncoding::parse("X-UUENCODE"), TransferEncoding::Unknown);
        assert_eq!(TransferEncoding::parse("8BITMIME"), TransferEncoding::Unknown);
        assert_eq!(TransferEncoding::parse(""), TransferEncoding::Unknown);
    }

    #[test]
    fn test_join_base64_lines() {
        let lines = ["SGVsbG8s\r\n", "IFdvcmxkIQ==\r\n"];
        assert_eq!(
            join_lines(lines, TransferEncoding::Base64),
            b"SGVsbG8sIFdvcmxkIQ=="
        );
    }

    #[test]
    fn test_join_quoted_printable_soft_breaks() {
        let lines = ["long =\r\n", "line\r\n", "next (1)\r\n"];
        let expected = format!("long line{NEWLINE}next (1){NEWLINE}");
        assert_eq!(
            join_lines(lines, TransferEncoding::QuotedPrintable),
            expected.as_bytes()
        );
    }

    #[test]
    fn test_join_plain_lines() {
        let expected = format!("one{NEWLINE}two{NEWLINE}");
        assert_eq!(
            join_lines(split_lines(b"one\r\ntwo\r\n"), TransferEncoding::Utf7),
            expected.as_bytes()
        );
    }

    #[test]
    fn test_split_lines_keeps_unterminated_tail() {
        let lines: Vec<&[u8]> = split_lines(b"a\r\nb").collect();
        assert_eq!(lines, vec![&b"a\r\n"[..], &b"b"[..]]);
    }

    #[test]
    fn test_strip_fetch_framing() {
        assert_eq!(strip_fetch_framing(b"hello\n)\n"), b"hello");
        assert_eq!(strip_fetch_framing(b"(balanced)"), b"(balanced)");
        assert_eq!(strip_fetch_framing(b"no paren"), b"no paren");
    }

    #[test]
    fn test_decode_body_base64() {
        let joined = join_lines(split_lines(b"SGVsbG8s\r\nIFdvcmxkIQ==\r\n"), TransferEncoding::Base64);
        let decoded = decode_body(&joined, TransferEncoding::Base64).unwrap();
        assert_eq!(decoded, b"Hello, World!");
    }

    #[test]
    fn test_decode_body_quoted_printable() {
        let joined = join_lines(
            split_lines(b"Caf=C3=A9 =\r\nau lait\r\n"),
            TransferEncoding::QuotedPrintable,
        );
        let decoded = decode_body(&joined, TransferEncoding::QuotedPrintable).unwrap();
        let expected = format!("Café au lait{NEWLINE}");
        assert_eq!(decoded, expected.as_bytes());
    }

    #[test]
    fn test_decode_body_plain_unchanged() {
        let decoded = decode_body(b"as is=20", TransferEncoding::Utf8).unwrap();
        assert_eq!(decoded, b"as is=20");
    }

    #[test]
    fn test_decode_body_bad_base64() {
        assert!(decode_body(b"@@@", TransferEncoding::Base64).is_err());
    }
}
