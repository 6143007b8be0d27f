//! PDF text extraction
//!
//! `pdf-extract` does the main work. It can hang or panic on unusual fonts,
//! so it runs on its own thread with a deadline and `lopdf` is used as a
//! fallback.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};

use super::{Converter, Extracted};

/// Warning attached when a PDF yields no text at all
pub const NO_TEXT_WARNING: &str = "No text extracted; maybe scanned (needs OCR)";

const EXTRACT_TIMEOUT: Duration = Duration::from_secs(60);

/// PDF converter
#[derive(Debug, Clone, Default)]
pub struct PdfConverter;

impl PdfConverter {
    fn extract_with_timeout(data: &[u8]) -> Result<(String, Vec<String>)> {
        let owned = data.to_vec();
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let _ = tx.send(pdf_extract::extract_text_from_mem(&owned));
        });

        let primary_failure = match rx.recv_timeout(EXTRACT_TIMEOUT) {
            Ok(Ok(text)) => {
                let _ = handle.join();
                return Ok((text, Vec::new()));
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                e.to_string()
            }
            // The worker cannot be killed; it is left to finish on its own
            Err(mpsc::RecvTimeoutError::Timeout) => {
                format!("timed out after {:?}", EXTRACT_TIMEOUT)
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => "extractor panicked".to_string(),
        };

        tracing::warn!("pdf-extract failed ({}), trying lopdf", primary_failure);
        let text = Self::extract_with_lopdf(data)?;
        Ok((
            text,
            vec![format!(
                "pdf-extract failed ({}); used fallback extractor",
                primary_failure
            )],
        ))
    }

    fn extract_with_lopdf(data: &[u8]) -> Result<String> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::file_parse("document.pdf", format!("Failed to load PDF: {}", e)))?;

        let mut pages = Vec::new();
        for page_number in doc.get_pages().keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(text) => pages.push(text),
                Err(e) => tracing::debug!("No text for page {}: {}", page_number, e),
            }
        }
        Ok(pages.join("\n\n"))
    }
}

/// Drop NUL characters and blank lines left behind by the extractors
fn clean(text: &str) -> String {
    text.replace('\0', "")
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

impl Converter for PdfConverter {
    fn name(&self) -> &str {
        "PDF"
    }

    fn extensions(&self) -> &[&'static str] {
        &["pdf"]
    }

    fn convert(&self, data: &[u8]) -> Result<Extracted> {
        let (raw, mut warnings) = Self::extract_with_timeout(data)?;
        let text = clean(&raw);
        if text.trim().is_empty() {
            warnings.push(NO_TEXT_WARNING.to_string());
        }
        Ok(Extracted { text, warnings })
    }
}
