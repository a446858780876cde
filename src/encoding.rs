//! Text encoding resolution and decoding for the input XML file.
//!
//! `encoding_rs` knows encodings by WHATWG label only, so this module keeps
//! the Windows code page number next to each encoding for the `encodings`
//! listing.

use crate::error::{Error, Result};
use encoding_rs::Encoding;
use std::borrow::Cow;

/// A known text encoding with its Windows code page identifier.
#[derive(Debug, Clone, Copy)]
pub struct EncodingInfo {
    /// Code page identifier (e.g., 65001 for UTF-8)
    pub code_page: u16,
    /// The encoding itself
    pub encoding: &'static Encoding,
    /// Listed name when it differs from the decoder's
    alias: Option<&'static str>,
}

impl EncodingInfo {
    /// Listed encoding name (e.g., "windows-1252", "us-ascii").
    pub fn name(&self) -> &'static str {
        self.alias.unwrap_or_else(|| self.encoding.name())
    }
}

/// List every encoding that can be used to read the input file,
/// ordered by code page.
pub fn list_encodings() -> Vec<EncodingInfo> {
    let table: [(u16, &'static Encoding); 38] = [
        (866, encoding_rs::IBM866),
        (874, encoding_rs::WINDOWS_874),
        (932, encoding_rs::SHIFT_JIS),
        (936, encoding_rs::GBK),
        (950, encoding_rs::BIG5),
        (1200, encoding_rs::UTF_16LE),
        (1201, encoding_rs::UTF_16BE),
        (1250, encoding_rs::WINDOWS_1250),
        (1251, encoding_rs::WINDOWS_1251),
        (1252, encoding_rs::WINDOWS_1252),
        (1253, encoding_rs::WINDOWS_1253),
        (1254, encoding_rs::WINDOWS_1254),
        (1255, encoding_rs::WINDOWS_1255),
        (1256, encoding_rs::WINDOWS_1256),
        (1257, encoding_rs::WINDOWS_1257),
        (1258, encoding_rs::WINDOWS_1258),
        (10000, encoding_rs::MACINTOSH),
        (10007, encoding_rs::X_MAC_CYRILLIC),
        (20866, encoding_rs::KOI8_R),
        (21866, encoding_rs::KOI8_U),
        (28592, encoding_rs::ISO_8859_2),
        (28593, encoding_rs::ISO_8859_3),
        (28594, encoding_rs::ISO_8859_4),
        (28595, encoding_rs::ISO_8859_5),
        (28596, encoding_rs::ISO_8859_6),
        (28597, encoding_rs::ISO_8859_7),
        (28598, encoding_rs::ISO_8859_8),
        (28600, encoding_rs::ISO_8859_10),
        (28603, encoding_rs::ISO_8859_13),
        (28604, encoding_rs::ISO_8859_14),
        (28605, encoding_rs::ISO_8859_15),
        (28606, encoding_rs::ISO_8859_16),
        (38598, encoding_rs::ISO_8859_8_I),
        (50220, encoding_rs::ISO_2022_JP),
        (51932, encoding_rs::EUC_JP),
        (51949, encoding_rs::EUC_KR),
        (54936, encoding_rs::GB18030),
        (65001, encoding_rs::UTF_8),
    ];

    // Decoded by a superset encoding_rs ships under another name.
    let aliases: [(u16, &'static str, &'static Encoding); 2] = [
        (20127, "us-ascii", encoding_rs::WINDOWS_1252),
        (28591, "iso-8859-1", encoding_rs::WINDOWS_1252),
    ];

    let mut list: Vec<EncodingInfo> = table
        .into_iter()
        .map(|(code_page, encoding)| EncodingInfo {
            code_page,
            encoding,
            alias: None,
        })
        .chain(aliases.into_iter().map(|(code_page, name, encoding)| EncodingInfo {
            code_page,
            encoding,
            alias: Some(name),
        }))
        .collect();
    list.sort_by_key(|info| info.code_page);
    list
}

/// Resolve a user-supplied encoding name.
///
/// "utf8" and "utf-8" (any case) always mean UTF-8. Other names are matched
/// case-insensitively against [`list_encodings`] first, then against the
/// WHATWG label table (so "latin1" or "cp1252" work too).
pub fn resolve_encoding(name: &str) -> Result<&'static Encoding> {
    let trimmed = name.trim();
    match trimmed.to_lowercase().as_str() {
        "utf8" | "utf-8" => return Ok(encoding_rs::UTF_8),
        _ => {}
    }

    if let Some(info) = list_encodings()
        .into_iter()
        .find(|info| info.name().eq_ignore_ascii_case(trimmed))
    {
        return Ok(info.encoding);
    }

    match Encoding::for_label(trimmed.as_bytes()) {
        Some(encoding) if encoding != encoding_rs::REPLACEMENT => Ok(encoding),
        _ => Err(Error::Encoding(format!("unknown encoding '{}'", name))),
    }
}

/// Decoded input text.
#[derive(Debug)]
pub struct DecodedText<'a> {
    /// The decoded text
    pub text: Cow<'a, str>,
    /// The encoding actually used (a byte order mark wins over the requested one)
    pub encoding: &'static Encoding,
    /// Whether malformed sequences were replaced with U+FFFD
    pub had_errors: bool,
}

/// Decode raw bytes with the given encoding.
///
/// A UTF-8 or UTF-16 byte order mark overrides `encoding` and is stripped.
pub fn decode<'a>(bytes: &'a [u8], encoding: &'static Encoding) -> DecodedText<'a> {
    let (text, used, had_errors) = encoding.decode(bytes);
    DecodedText {
        text,
        encoding: used,
        had_errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_aliases() {
        let a = resolve_encoding("utf8").unwrap();
        let b = resolve_encoding("UTF-8").unwrap();
        let c = resolve_encoding("utf-8").unwrap();
        assert_eq!(a, encoding_rs::UTF_8);
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_table_lookup_is_case_insensitive() {
        assert_eq!(
            resolve_encoding("WINDOWS-1252").unwrap(),
            encoding_rs::WINDOWS_1252
        );
        assert_eq!(
            resolve_encoding("iso-8859-2").unwrap(),
            encoding_rs::ISO_8859_2
        );
        assert_eq!(resolve_encoding("shift_jis").unwrap(), encoding_rs::SHIFT_JIS);
    }

    #[test]
    fn test_label_fallback() {
        assert_eq!(resolve_encoding("latin1").unwrap(), encoding_rs::WINDOWS_1252);
        assert_eq!(resolve_encoding("utf-16").unwrap(), encoding_rs::UTF_16LE);
    }

    #[test]
    fn test_unknown_encoding() {
        assert!(matches!(
            resolve_encoding("klingon-1"),
            Err(Error::Encoding(_))
        ));
        // WHATWG maps this label to the replacement decoder
        assert!(resolve_encoding("iso-2022-kr").is_err());
    }

    #[test]
    fn test_list_encodings_sorted_and_unique() {
        let list = list_encodings();
        assert!(list.windows(2).all(|w| w[0].code_page < w[1].code_page));
        assert!(list.iter().any(|e| e.code_page == 65001 && e.name() == "UTF-8"));
    }

    #[test]
    fn test_ascii_and_latin1_are_listed() {
        let list = list_encodings();
        let ascii = list.iter().find(|e| e.code_page == 20127).unwrap();
        assert_eq!(ascii.name(), "us-ascii");
        let latin1 = list.iter().find(|e| e.code_page == 28591).unwrap();
        assert_eq!(latin1.name(), "iso-8859-1");

        assert_eq!(resolve_encoding("US-ASCII").unwrap(), encoding_rs::WINDOWS_1252);
        assert_eq!(resolve_encoding("iso-8859-1").unwrap(), encoding_rs::WINDOWS_1252);
    }

    #[test]
    fn test_decode_borrows_input() {
        let bytes = b"<a>plain</a>".to_vec();
        let decoded = decode(&bytes, encoding_rs::UTF_8);
        assert!(matches!(decoded.text, Cow::Borrowed(_)));
    }

    #[test]
    fn test_decode_windows_1252() {
        let decoded = decode(b"<a>caf\xE9</a>", encoding_rs::WINDOWS_1252);
        assert_eq!(decoded.text, "<a>café</a>");
        assert!(!decoded.had_errors);
    }

    #[test]
    fn test_decode_bom_overrides_requested_encoding() {
        let decoded = decode(b"\xFF\xFE<\0a\0/\0>\0", encoding_rs::WINDOWS_1252);
        assert_eq!(decoded.text, "<a/>");
        assert_eq!(decoded.encoding, encoding_rs::UTF_16LE);
    }

    #[test]
    fn test_decode_reports_malformed_input() {
        let decoded = decode(b"<a>\xFF</a>", encoding_rs::UTF_8);
        assert!(decoded.had_errors);
        assert_eq!(decoded.text, "<a>\u{FFFD}</a>");
    }
}
