//! Plain text with best-effort encoding detection

use crate::error::Result;

use super::{Converter, Extracted};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Decode bytes as text: BOM-marked UTF-8/UTF-16, else UTF-8 with replacement
///
/// Never fails. Lossy decoding is reported as a warning.
pub fn decode_text(data: &[u8]) -> Extracted {
    if let Some(rest) = data.strip_prefix(UTF8_BOM) {
        return decode_utf8(rest);
    }
    if let Some(rest) = data.strip_prefix(UTF16_LE_BOM) {
        return decode_utf16(rest, u16::from_le_bytes);
    }
    if let Some(rest) = data.strip_prefix(UTF16_BE_BOM) {
        return decode_utf16(rest, u16::from_be_bytes);
    }
    decode_utf8(data)
}

fn decode_utf8(data: &[u8]) -> Extracted {
    match std::str::from_utf8(data) {
        Ok(text) => Extracted::text(text),
        Err(_) => Extracted {
            text: String::from_utf8_lossy(data).into_owned(),
            warnings: vec!["Invalid UTF-8 sequences were replaced".to_string()],
        },
    }
}

fn decode_utf16(data: &[u8], to_unit: fn([u8; 2]) -> u16) -> Extracted {
    let units = data.chunks_exact(2).map(|pair| to_unit([pair[0], pair[1]]));
    let mut lossy = data.len() % 2 != 0;
    let text: String = char::decode_utf16(units)
        .map(|c| {
            c.unwrap_or_else(|_| {
                lossy = true;
                char::REPLACEMENT_CHARACTER
            })
        })
        .collect();

    let mut extracted = Extracted::text(text);
    if lossy {
        extracted
            .warnings
            .push("Invalid UTF-16 sequences were replaced".to_string());
    }
    extracted
}

/// Plain text files, also the fallback for unknown extensions
#[derive(Debug, Clone, Default)]
pub struct TextConverter;

impl Converter for TextConverter {
    fn name(&self) -> &str {
        "TEXT"
    }

    fn extensions(&self) -> &[&'static str] {
        &["txt", "log"]
    }

    fn convert(&self, data: &[u8]) -> Result<Extracted> {
        Ok(decode_text(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_utf8() {
        let extracted = decode_text("naïve café".as_bytes());
        assert_eq!(extracted.text, "naïve café");
        assert!(extracted.warnings.is_empty());
    }

    #[test]
    fn test_utf8_bom_is_stripped() {
        let extracted = decode_text(b"\xEF\xBB\xBFhello");
        assert_eq!(extracted.text, "hello");
    }

    #[test]
    fn test_utf16_le() {
        let mut data = vec![0xFF, 0xFE];
        for unit in "hé".encode_utf16() {
            data.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_text(&data).text, "hé");
    }

    #[test]
    fn test_utf16_be() {
        let mut data = vec![0xFE, 0xFF];
        for unit in "ok".encode_utf16() {
            data.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode_text(&data).text, "ok");
    }

    #[test]
    fn test_invalid_utf8_is_replaced_with_warning() {
        let extracted = decode_text(b"abc\xFFdef");
        assert_eq!(extracted.text, "abc\u{FFFD}def");
        assert_eq!(extracted.warnings.len(), 1);
    }
}
