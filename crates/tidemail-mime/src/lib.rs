//! # tidemail-mime
//!
//! Decoding helpers for message data fetched over IMAP.
//!
//! ## Features
//!
//! - **Encoded words**: RFC 2047 `=?charset?B|Q?...?=` header decoding
//! - **Transfer encodings**: Base64 and Quoted-Printable body decoding
//! - **Content types**: `type/subtype` with parameters
//!
//! ## Quick Start
//!
//! ```
//! use tidemail_mime::encoding::decode_header;
//! use tidemail_mime::{TransferEncoding, decode_body};
//!
//! assert_eq!(decode_header("=?UTF-8?Q?Caf=C3=A9?="), "Café");
//!
//! let encoding = TransferEncoding::parse("BASE64");
//! let body = decode_body(b"SGVsbG8=", encoding).unwrap();
//! assert_eq!(body, b"Hello");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod error;
mod transfer;

pub mod encoding;

pub use content_type::ContentType;
pub use error::{Error, Result};
pub use transfer::{
    NEWLINE, TransferEncoding, decode_body, join_lines, split_lines, strip_fetch_framing,
};
