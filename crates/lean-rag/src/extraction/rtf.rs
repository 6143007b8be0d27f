//! Best-effort RTF to text
//!
//! Drops header destinations (font and colour tables, `\*` groups), maps
//! `\par` and `\tab`, decodes `\'hh` escapes as Latin-1 and removes the
//! remaining control words and group braces.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Result;

use super::{decode_text, Converter, Extracted};

const DESTINATIONS: [&str; 6] = [
    "\\*",
    "\\fonttbl",
    "\\colortbl",
    "\\stylesheet",
    "\\info",
    "\\pict",
];

const PARAGRAPH: &str = "\u{2028}";
const PARAGRAPH_CHAR: char = '\u{2028}';

/// RTF converter
#[derive(Debug, Clone, Default)]
pub struct RtfConverter;

/// Remainder of `s` after the group opened at `s[0]`
fn skip_group(s: &str) -> &str {
    let bytes = s.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return &s[i + 1..];
                }
            }
            _ => {}
        }
        i += 1;
    }
    ""
}

fn drop_destinations(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('{') {
        out.push_str(&rest[..pos]);
        let inner = &rest[pos + 1..];
        if DESTINATIONS.iter().any(|d| inner.starts_with(d)) {
            rest = skip_group(&rest[pos..]);
        } else {
            out.push('{');
            rest = inner;
        }
    }
    out.push_str(rest);
    out
}

static PARAGRAPH_MARK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\(?:par|line)\b(?: |\r?\n)?").expect("Invalid regex"));
static TAB_MARK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\tab\b(?: |\r?\n)?").expect("Invalid regex"));
static HEX_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\'([0-9a-fA-F]{2})").expect("Invalid regex"));
static CONTROL_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\[a-zA-Z]+-?\d*(?: |\r?\n)?").expect("Invalid regex"));

/// Convert an RTF document to plain text
pub fn rtf_to_text(raw: &str) -> String {
    let body = drop_destinations(raw);

    // Raw line breaks are insignificant in RTF; paragraph marks use a sentinel until the end
    let body = PARAGRAPH_MARK.replace_all(&body, PARAGRAPH);
    let body = TAB_MARK.replace_all(&body, "\t");
    let body = HEX_ESCAPE.replace_all(&body, |caps: &regex::Captures| {
        u8::from_str_radix(&caps[1], 16)
            .map(|b| char::from(b).to_string())
            .unwrap_or_default()
    });
    let body = CONTROL_WORD.replace_all(&body, "");

    let mut text = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    text.push(escaped);
                }
            }
            '{' | '}' | '\r' | '\n' => {}
            PARAGRAPH_CHAR => text.push('\n'),
            _ => text.push(c),
        }
    }

    text.lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

impl Converter for RtfConverter {
    fn name(&self) -> &str {
        "RTF"
    }

    fn extensions(&self) -> &[&'static str] {
        &["rtf"]
    }

    fn convert(&self, data: &[u8]) -> Result<Extracted> {
        let decoded = decode_text(data);
        Ok(Extracted {
            text: rtf_to_text(&decoded.text),
            warnings: decoded.warnings,
        })
    }
}
