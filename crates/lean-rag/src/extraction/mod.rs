//! Document to plain-text extraction
//!
//! Each supported format is handled by a [`Converter`] registered in an
//! [`ExtractorRegistry`] under its file extensions. Converters that fail are
//! contained by the registry: the caller gets empty text plus a warning and
//! the batch carries on.

pub mod batch;
pub mod markup;
pub mod office;
#[cfg(feature = "pdf")]
pub mod pdf;
pub mod registry;
pub mod rtf;
pub mod tabular;
pub mod text;

pub use batch::{BatchExtractor, ExtractPlan, ExtractStats};
pub use registry::ExtractorRegistry;
pub use text::{decode_text, TextConverter};

use crate::error::Result;

/// Text pulled out of one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    /// Plain text, possibly empty
    pub text: String,
    /// Non-fatal problems met while converting
    pub warnings: Vec<String>,
}

impl Extracted {
    /// Text with no warnings
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            warnings: Vec::new(),
        }
    }

    /// Empty text with a single warning
    pub fn warning(warning: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            warnings: vec![warning.into()],
        }
    }
}

/// A format-specific converter
pub trait Converter: Send + Sync {
    /// Short format name used in warnings, e.g. `PDF`
    fn name(&self) -> &str;

    /// Lower-case extensions (without dot) this converter handles
    fn extensions(&self) -> &[&'static str];

    /// Convert raw file bytes to text
    fn convert(&self, data: &[u8]) -> Result<Extracted>;
}

/// Stand-in for a format whose cargo feature is disabled
#[derive(Debug, Clone)]
pub struct UnavailableConverter {
    name: &'static str,
    extensions: &'static [&'static str],
}

impl UnavailableConverter {
    /// Register `extensions` as known but unsupported in this build
    pub const fn new(name: &'static str, extensions: &'static [&'static str]) -> Self {
        Self { name, extensions }
    }
}

impl Converter for UnavailableConverter {
    fn name(&self) -> &str {
        self.name
    }

    fn extensions(&self) -> &[&'static str] {
        self.extensions
    }

    fn convert(&self, _data: &[u8]) -> Result<Extracted> {
        Ok(Extracted::warning(format!(
            "{} support not compiled in",
            self.name
        )))
    }
}
