//! A single MIME leaf of a message's BODYSTRUCTURE.

use tidemail_mime::encoding::decode_charset;
use tidemail_mime::{ContentType, TransferEncoding, decode_body};

use crate::error::Result;

/// One MIME leaf part, numbered with its dotted IMAP section (`"1"`, `"2.1"`).
///
/// Structural fields come from BODYSTRUCTURE and never change; only the raw
/// data is filled in later by [`Session::fetch_body_part`].
///
/// [`Session::fetch_body_part`]: crate::Session::fetch_body_part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyPart {
    pub(crate) part_number: String,
    pub(crate) content_type: ContentType,
    pub(crate) content_id: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) transfer_encoding: TransferEncoding,
    pub(crate) size: u32,
    pub(crate) lines: Option<u32>,
    pub(crate) md5: Option<String>,
    pub(crate) disposition: Option<String>,
    pub(crate) disposition_file_name: Option<String>,
    pub(crate) language: Option<String>,
    pub(crate) raw_data: Option<Vec<u8>>,
}

impl BodyPart {
    /// Creates a part with no optional fields set.
    #[must_use]
    pub fn new(part_number: impl Into<String>, content_type: ContentType) -> Self {
        Self {
            part_number: part_number.into(),
            content_type,
            content_id: None,
            description: None,
            transfer_encoding: TransferEncoding::Unknown,
            size: 0,
            lines: None,
            md5: None,
            disposition: None,
            disposition_file_name: None,
            language: None,
            raw_data: None,
        }
    }

    /// Dotted section number used in `BODY[...]`.
    #[must_use]
    pub fn part_number(&self) -> &str {
        &self.part_number
    }

    /// Content type with its parameters.
    #[must_use]
    pub const fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    /// `type/subtype` as sent by the server.
    #[must_use]
    pub fn mime_type(&self) -> String {
        self.content_type.mime_type()
    }

    /// Checks the content type, ignoring case.
    #[must_use]
    pub fn is_content_type(&self, main_type: &str, sub_type: &str) -> bool {
        self.content_type.matches(main_type, sub_type)
    }

    /// Charset parameter, if any.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.content_type.charset()
    }

    /// Attachment file name from the `NAME` parameter or the disposition.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.content_type
            .name()
            .or(self.disposition_file_name.as_deref())
            .filter(|name| !name.is_empty())
    }

    /// A part is an attachment when it carries a non-empty file name.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.file_name().is_some()
    }

    /// Content-ID.
    #[must_use]
    pub fn content_id(&self) -> Option<&str> {
        self.content_id.as_deref()
    }

    /// Content-Description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Content-Transfer-Encoding.
    #[must_use]
    pub const fn transfer_encoding(&self) -> TransferEncoding {
        self.transfer_encoding
    }

    /// Encoded size in bytes.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Line count, for text parts.
    #[must_use]
    pub const fn lines(&self) -> Option<u32> {
        self.lines
    }

    /// Content-MD5.
    #[must_use]
    pub fn md5(&self) -> Option<&str> {
        self.md5.as_deref()
    }

    /// Disposition type, such as `attachment` or `inline`.
    #[must_use]
    pub fn disposition(&self) -> Option<&str> {
        self.disposition.as_deref()
    }

    /// Content-Language.
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Body data as joined from the wire, before decoding.
    ///
    /// `None` until the part has been fetched.
    #[must_use]
    pub fn raw_data(&self) -> Option<&[u8]> {
        self.raw_data.as_deref()
    }

    /// Returns true once the body data has been fetched.
    #[must_use]
    pub const fn is_fetched(&self) -> bool {
        self.raw_data.is_some()
    }

    pub(crate) fn set_raw_data(&mut self, data: Vec<u8>) {
        self.raw_data = Some(data);
    }

    /// Decodes the raw data according to the transfer encoding.
    ///
    /// Returns an empty buffer when the part has not been fetched.
    ///
    /// # Errors
    ///
    /// Returns an error if base64 content is malformed.
    pub fn decoded_data(&self) -> Result<Vec<u8>> {
        match &self.raw_data {
            Some(raw) => Ok(decode_body(raw, self.transfer_encoding)?),
            None => Ok(Vec::new()),
        }
    }

    /// Decodes the data and converts it to text using the part's charset.
    ///
    /// # Errors
    ///
    /// Returns an error if base64 content is malformed.
    pub fn decoded_text(&self) -> Result<String> {
        let data = self.decoded_data()?;
        Ok(decode_charset(&data, self.charset().unwrap_or("utf-8")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    fn part(encoding: TransferEncoding, charset: &str) -> BodyPart {
        let mut part = BodyPart::new(
            "1",
            ContentType::new("TEXT", "PLAIN").with_parameter("CHARSET", charset),
        );
        part.transfer_encoding = encoding;
        part
    }

    #[test]
    fn test_unfetched_part_decodes_empty() {
        let part = part(TransferEncoding::Base64, "utf-8");
        assert!(!part.is_fetched());
        assert!(part.decoded_data().unwrap().is_empty());
    }

    #[test]
    fn test_base64_part_decodes() {
        let mut part = part(TransferEncoding::Base64, "utf-8");
        part.set_raw_data(b"SGVsbG8sIFdvcmxkIQ==".to_vec());
        assert_eq!(part.decoded_text().unwrap(), "Hello, World!");
    }

    #[test]
    fn test_quoted_printable_latin1_part() {
        let mut part = part(TransferEncoding::QuotedPrintable, "ISO-8859-1");
        part.set_raw_data(b"Caf=E9".to_vec());
        assert_eq!(part.decoded_text().unwrap(), "Café");
    }

    #[test]
    fn test_attachment_from_disposition() {
        let mut part = BodyPart::new("2", ContentType::new("APPLICATION", "PDF"));
        assert!(!part.is_attachment());

        part.disposition = Some("attachment".to_string());
        part.disposition_file_name = Some("report.pdf".to_string());
        assert!(part.is_attachment());
        assert_eq!(part.file_name(), Some("report.pdf"));
    }

    #[test]
    fn test_empty_name_is_not_attachment() {
        let part = BodyPart::new(
            "2",
            ContentType::new("APPLICATION", "PDF").with_parameter("NAME", ""),
        );
        assert!(!part.is_attachment());
    }

    #[test]
    fn test_content_type_comparison() {
        let part = part(TransferEncoding::Utf7, "us-ascii");
        assert!(part.is_content_type("text", "plain"));
        assert_eq!(part.mime_type(), "TEXT/PLAIN");
    }
}
