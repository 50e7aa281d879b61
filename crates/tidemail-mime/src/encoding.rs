//! MIME encoding and decoding utilities.
//!
//! Supports Base64, Quoted-Printable, and RFC 2047 encoded-word headers.

use crate::error::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes Base64 data.
///
/// Whitespace (including line breaks between encoded lines) is ignored.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    if data.bytes().any(|b| b.is_ascii_whitespace()) {
        let cleaned: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        return STANDARD.decode(cleaned).map_err(Into::into);
    }
    STANDARD.decode(data).map_err(Into::into)
}

/// Decodes Quoted-Printable data (RFC 2045).
///
/// Soft line breaks (`=` at end of line) are removed and `=XX` escapes are
/// turned back into bytes. A malformed escape is kept literally.
#[must_use]
pub fn decode_quoted_printable(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];
        if byte != b'=' {
            result.push(byte);
            i += 1;
            continue;
        }

        // Soft line break
        match data.get(i + 1..) {
            Some([b'\r', b'\n', ..]) => {
                i += 3;
                continue;
            }
            Some([b'\n', ..]) => {
                i += 2;
                continue;
            }
            _ => {}
        }

        match (
            data.get(i + 1).copied().and_then(hex_value),
            data.get(i + 2).copied().and_then(hex_value),
        ) {
            (Some(high), Some(low)) => {
                result.push((high << 4) | low);
                i += 3;
            }
            _ => {
                result.push(b'=');
                i += 1;
            }
        }
    }

    result
}

const fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Converts bytes in the named charset to a string.
///
/// UTF-8 and US-ASCII are decoded as UTF-8, ISO-8859-1 maps each byte to the
/// code point of the same value. Unknown charsets fall back to lossy UTF-8.
#[must_use]
pub fn decode_charset(bytes: &[u8], charset: &str) -> String {
    let charset = charset.trim().to_ascii_lowercase();
    match charset.as_str() {
        "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" | "l1" => {
            bytes.iter().map(|&b| char::from(b)).collect()
        }
        "utf-8" | "utf8" | "us-ascii" | "ascii" => String::from_utf8_lossy(bytes).into_owned(),
        other => {
            tracing::trace!(charset = other, "unsupported charset, decoding as UTF-8");
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

/// Decodes every RFC 2047 encoded word (`=?charset?B|Q?data?=`) in a header.
///
/// Text outside encoded words is kept as is, and whitespace that only
/// separates two adjacent encoded words is dropped. Input without any valid
/// encoded word is returned unchanged.
#[must_use]
pub fn decode_header(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut rest = text;
    let mut found = false;
    let mut after_word = false;

    while let Some(start) = rest.find("=?") {
        let (gap, candidate) = rest.split_at(start);
        if let Some((decoded, consumed)) = parse_encoded_word(candidate) {
            if !(after_word && gap.chars().all(char::is_whitespace)) {
                output.push_str(gap);
            }
            output.push_str(&decoded);
            rest = &candidate[consumed..];
            found = true;
            after_word = true;
        } else {
            output.push_str(gap);
            output.push_str("=?");
            rest = &candidate[2..];
            after_word = false;
        }
    }

    if !found {
        return text.to_string();
    }
    output.push_str(rest);
    output
}

/// Parses one encoded word at the start of `input`.
///
/// Returns the decoded text and the number of bytes consumed.
fn parse_encoded_word(input: &str) -> Option<(String, usize)> {
    let body = input.strip_prefix("=?")?;
    let (charset, body) = body.split_once('?')?;
    let (encoding, body) = body.split_once('?')?;
    let end = body.find("?=")?;
    let data = &body[..end];
    let consumed = input.len() - body.len() + end + 2;

    if charset.is_empty() || encoding.len() != 1 || data.is_empty() || data.contains('?') {
        return None;
    }
    if charset.contains(char::is_whitespace) || data.contains(char::is_whitespace) {
        return None;
    }

    let bytes = if encoding.eq_ignore_ascii_case("b") {
        decode_base64(data).ok()?
    } else {
        decode_quoted_printable(data.replace('_', " ").as_bytes())
    };

    // RFC 2231 language suffix: charset*lang
    let charset = charset.split('*').next().unwrap_or(charset);
    Some((decode_charset(&bytes, charset), consumed))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_base64_encode_decode() {
        let data = b"Hello, World!";
        let encoded = encode_base64(data);
        assert_eq!(encoded, "SGVsbG8sIFdvcmxkIQ==");

        let decoded = decode_base64(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_base64_decode_ignores_line_breaks() {
        let decoded = decode_base64("SGVsbG8s\r\nIFdvcmxkIQ==\r\n").unwrap();
        assert_eq!(decoded, b"Hello, World!");
    }

    #[test]
    fn test_base64_decode_invalid() {
        assert!(decode_base64("not base64!!").is_err());
    }

    #[test]
    fn test_quoted_printable_decode() {
        assert_eq!(decode_quoted_printable(b"Hello, World!"), b"Hello, World!");
        assert_eq!(
            decode_quoted_printable(b"H=C3=A9llo"),
            "Héllo".as_bytes()
        );
    }

    #[test]
    fn test_quoted_printable_soft_line_break() {
        assert_eq!(decode_quoted_printable(b"Hello=\r\nWorld"), b"HelloWorld");
        assert_eq!(decode_quoted_printable(b"Hello=\nWorld"), b"HelloWorld");
    }

    #[test]
    fn test_quoted_printable_malformed_escape_kept() {
        assert_eq!(decode_quoted_printable(b"a=ZZb"), b"a=ZZb");
        assert_eq!(decode_quoted_printable(b"end="), b"end=");
    }

    #[test]
    fn test_decode_charset_latin1() {
        assert_eq!(decode_charset(&[0x48, 0xE9], "ISO-8859-1"), "Hé");
    }

    #[test]
    fn test_decode_charset_unknown_falls_back() {
        assert_eq!(decode_charset(b"plain", "x-unknown"), "plain");
    }

    #[test]
    fn test_decode_header_plain() {
        assert_eq!(decode_header("Hello"), "Hello");
    }

    #[test]
    fn test_decode_header_base64() {
        assert_eq!(decode_header("=?utf-8?B?SMOpbGxv?="), "Héllo");
    }

    #[test]
    fn test_decode_header_q() {
        assert_eq!(decode_header("=?UTF-8?Q?Caf=C3=A9_au_lait?="), "Café au lait");
    }

    #[test]
    fn test_decode_header_mixed_text() {
        assert_eq!(
            decode_header("Re: =?ISO-8859-1?Q?Caf=E9?= tomorrow"),
            "Re: Café tomorrow"
        );
    }

    #[test]
    fn test_decode_header_adjacent_words_join() {
        assert_eq!(
            decode_header("=?utf-8?Q?Hello_?= =?utf-8?Q?World?="),
            "Hello World"
        );
    }

    #[test]
    fn test_decode_header_incomplete_word_unchanged() {
        assert_eq!(decode_header("=?utf-8?Q?broken"), "=?utf-8?Q?broken");
        assert_eq!(decode_header("a =? b"), "a =? b");
    }

    #[test]
    fn test_decode_header_bad_base64_passes_through() {
        assert_eq!(decode_header("x =?utf-8?B?***?= y"), "x =?utf-8?B?***?= y");
    }

    #[test]
    fn test_decode_header_language_suffix() {
        assert_eq!(decode_header("=?utf-8*en?Q?Hi?="), "Hi");
    }

    proptest! {
        #[test]
        fn prop_plain_text_unchanged(s in "[a-zA-Z0-9 ,.:;!()<>@-]*") {
            prop_assert_eq!(decode_header(&s), s);
        }

        #[test]
        fn prop_base64_word_decodes_to_original(s in "\\PC*") {
            let word = format!("=?UTF-8?B?{}?=", encode_base64(s.as_bytes()));
            if s.is_empty() {
                prop_assert_eq!(decode_header(&word), word);
            } else {
                prop_assert_eq!(decode_header(&word), s);
            }
        }
    }
}
