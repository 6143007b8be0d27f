//! Extension to converter registry

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;

use super::tabular::{CsvConverter, JsonConverter};
use super::{rtf::RtfConverter, Converter, Extracted, TextConverter};

#[cfg(feature = "html")]
use super::markup::HtmlConverter;
#[cfg(feature = "markdown")]
use super::markup::MarkdownConverter;
#[cfg(feature = "docx")]
use super::office::DocxConverter;
#[cfg(feature = "pptx")]
use super::office::PptxConverter;
#[cfg(feature = "xlsx")]
use super::office::SpreadsheetConverter;
#[cfg(feature = "pdf")]
use super::pdf::PdfConverter;
#[cfg(not(all(
    feature = "pdf",
    feature = "docx",
    feature = "pptx",
    feature = "xlsx",
    feature = "html",
    feature = "markdown"
)))]
use super::UnavailableConverter;

/// Registry of converters keyed by lower-case extension
pub struct ExtractorRegistry {
    converters: HashMap<String, Arc<dyn Converter>>,
    fallback: Arc<dyn Converter>,
}

impl ExtractorRegistry {
    /// Empty registry; every file goes to the plain-text fallback
    pub fn new() -> Self {
        Self {
            converters: HashMap::new(),
            fallback: Arc::new(TextConverter),
        }
    }

    /// Register a converter for all of its extensions, replacing earlier ones
    pub fn register<C: Converter + 'static>(&mut self, converter: C) {
        let converter: Arc<dyn Converter> = Arc::new(converter);
        for ext in converter.extensions() {
            self.converters.insert(ext.to_string(), converter.clone());
        }
    }

    /// Registered extensions, sorted
    pub fn extensions(&self) -> Vec<&str> {
        let mut extensions: Vec<&str> = self.converters.keys().map(String::as_str).collect();
        extensions.sort_unstable();
        extensions
    }

    /// Converter for `path`, chosen by case-insensitive extension
    pub fn converter_for(&self, path: &Path) -> &dyn Converter {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .and_then(|ext| self.converters.get(&ext))
            .unwrap_or(&self.fallback)
            .as_ref()
    }

    /// Convert bytes already read from `path`
    ///
    /// Converter errors and panics both become warnings on an empty result.
    pub fn convert(&self, path: &Path, data: &[u8]) -> Extracted {
        let converter = self.converter_for(path);
        match panic::catch_unwind(AssertUnwindSafe(|| converter.convert(data))) {
            Ok(Ok(extracted)) => extracted,
            Ok(Err(e)) => {
                tracing::debug!("{} converter failed on {}: {}", converter.name(), path.display(), e);
                Extracted::warning(format!("{} error: {}", converter.name(), e))
            }
            Err(payload) => {
                let detail = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_default();
                tracing::warn!(
                    "{} converter panicked on {}: {}",
                    converter.name(),
                    path.display(),
                    detail
                );
                Extracted::warning(format!("{} error: converter panicked", converter.name()))
            }
        }
    }

    /// Read and convert one file
    ///
    /// Only reading the file can fail; conversion problems are reported as
    /// warnings on an empty result.
    pub fn extract(&self, path: &Path) -> Result<Extracted> {
        let data = std::fs::read(path)?;
        Ok(self.convert(path, &data))
    }
}

impl Default for ExtractorRegistry {
    /// Registry with every converter this build supports
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(TextConverter);
        registry.register(CsvConverter);
        registry.register(JsonConverter);
        registry.register(RtfConverter);

        #[cfg(feature = "markdown")]
        registry.register(MarkdownConverter);
        #[cfg(not(feature = "markdown"))]
        registry.register(UnavailableConverter::new("Markdown", &["md", "markdown"]));

        #[cfg(feature = "html")]
        registry.register(HtmlConverter);
        #[cfg(not(feature = "html"))]
        registry.register(UnavailableConverter::new("HTML", &["html", "htm"]));

        #[cfg(feature = "pdf")]
        registry.register(PdfConverter);
        #[cfg(not(feature = "pdf"))]
        registry.register(UnavailableConverter::new("PDF", &["pdf"]));

        #[cfg(feature = "docx")]
        registry.register(DocxConverter);
        #[cfg(not(feature = "docx"))]
        registry.register(UnavailableConverter::new("DOCX", &["docx"]));

        #[cfg(feature = "pptx")]
        registry.register(PptxConverter);
        #[cfg(not(feature = "pptx"))]
        registry.register(UnavailableConverter::new("PPTX", &["pptx"]));

        #[cfg(feature = "xlsx")]
        registry.register(SpreadsheetConverter);
        #[cfg(not(feature = "xlsx"))]
        registry.register(UnavailableConverter::new(
            "Spreadsheet",
            &["xlsx", "xlsm", "xls", "ods"],
        ));

        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::path::PathBuf;
    use tempfile::tempdir;

    struct Failing;

    impl Converter for Failing {
        fn name(&self) -> &str {
            "BROKEN"
        }

        fn extensions(&self) -> &[&'static str] {
            &["bin"]
        }

        fn convert(&self, _data: &[u8]) -> Result<Extracted> {
            Err(Error::file_parse("x.bin", "bad magic"))
        }
    }

    struct Panicking;

    impl Converter for Panicking {
        fn name(&self) -> &str {
            "CRASHY"
        }

        fn extensions(&self) -> &[&'static str] {
            &["crash"]
        }

        fn convert(&self, _data: &[u8]) -> Result<Extracted> {
            panic!("index out of bounds in decoder");
        }
    }

    #[test]
    fn test_converter_panic_becomes_warning() {
        let mut registry = ExtractorRegistry::new();
        registry.register(Panicking);

        let extracted = registry.convert(&PathBuf::from("report.crash"), b"\x00");
        assert!(extracted.text.is_empty());
        assert_eq!(extracted.warnings, vec!["CRASHY error: converter panicked".to_string()]);

        // the registry stays usable for the next file
        let next = registry.convert(&PathBuf::from("notes.txt"), b"still here");
        assert_eq!(next.text, "still here");
    }

    #[test]
    fn test_new_registry_uses_text_fallback() {
        let registry = ExtractorRegistry::new();
        assert!(registry.extensions().is_empty());
        assert_eq!(registry.converter_for(Path::new("notes.xyz")).name(), "TEXT");
    }

    #[test]
    fn test_extension_lookup_is_case_insensitive() {
        let registry = ExtractorRegistry::default();
        assert_eq!(registry.converter_for(Path::new("DATA.JSON")).name(), "JSON");
        assert_eq!(registry.converter_for(Path::new("a/b/table.Csv")).name(), "CSV");
        assert_eq!(registry.converter_for(Path::new("README")).name(), "TEXT");
    }

    #[test]
    fn test_converter_failure_becomes_warning() {
        let mut registry = ExtractorRegistry::new();
        registry.register(Failing);

        let extracted = registry.convert(&PathBuf::from("blob.bin"), b"\x00\x01");
        assert!(extracted.text.is_empty());
        assert_eq!(extracted.warnings.len(), 1);
        assert!(extracted.warnings[0].starts_with("BROKEN error:"));
    }

    #[test]
    fn test_extract_reads_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("note.TXT");
        std::fs::write(&path, "torque 40 Nm").unwrap();

        let extracted = ExtractorRegistry::default().extract(&path).unwrap();
        assert_eq!(extracted.text, "torque 40 Nm");
        assert!(extracted.warnings.is_empty());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let result = ExtractorRegistry::default().extract(&dir.path().join("gone.txt"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_extract_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, r#"{"b": 1, "a": [true, null]}"#).unwrap();

        let registry = ExtractorRegistry::default();
        let first = registry.extract(&path).unwrap();
        let second = registry.extract(&path).unwrap();
        assert_eq!(first, second);
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn test_corrupt_pdf_reported_as_warning() {
        let extracted = ExtractorRegistry::default().convert(Path::new("scan.pdf"), b"%PDF-garbage");
        assert!(extracted.text.is_empty());
        assert!(extracted.warnings[0].starts_with("PDF error:"));
    }
}
