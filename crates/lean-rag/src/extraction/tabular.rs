//! CSV and JSON converters

use crate::error::{Error, Result};

use super::{decode_text, Converter, Extracted};

/// CSV rows as tab-joined lines; ragged rows are accepted
#[derive(Debug, Clone, Default)]
pub struct CsvConverter;

impl Converter for CsvConverter {
    fn name(&self) -> &str {
        "CSV"
    }

    fn extensions(&self) -> &[&'static str] {
        &["csv"]
    }

    fn convert(&self, data: &[u8]) -> Result<Extracted> {
        let decoded = decode_text(data);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(decoded.text.as_bytes());

        let mut lines = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| Error::file_parse("table.csv", e.to_string()))?;
            lines.push(record.iter().collect::<Vec<_>>().join("\t"));
        }

        Ok(Extracted {
            text: lines.join("\n"),
            warnings: decoded.warnings,
        })
    }
}

/// JSON re-serialised with two-space indentation
#[derive(Debug, Clone, Default)]
pub struct JsonConverter;

impl Converter for JsonConverter {
    fn name(&self) -> &str {
        "JSON"
    }

    fn extensions(&self) -> &[&'static str] {
        &["json"]
    }

    fn convert(&self, data: &[u8]) -> Result<Extracted> {
        let decoded = decode_text(data);
        let value: serde_json::Value = serde_json::from_str(&decoded.text)
            .map_err(|e| Error::file_parse("document.json", e.to_string()))?;
        Ok(Extracted {
            text: serde_json::to_string_pretty(&value)?,
            warnings: decoded.warnings,
        })
    }
}
