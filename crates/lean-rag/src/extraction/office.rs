//! Office formats: DOCX, PPTX and spreadsheets

#[cfg(any(feature = "docx", feature = "pptx", feature = "xlsx"))]
use crate::error::{Error, Result};

#[cfg(any(feature = "docx", feature = "pptx", feature = "xlsx"))]
use super::{Converter, Extracted};

/// Word documents: paragraphs in order, then each table row tab-joined
#[cfg(feature = "docx")]
#[derive(Debug, Clone, Default)]
pub struct DocxConverter;

#[cfg(feature = "docx")]
impl DocxConverter {
    fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
        let mut text = String::new();
        for child in &paragraph.children {
            if let docx_rs::ParagraphChild::Run(run) = child {
                for run_child in &run.children {
                    match run_child {
                        docx_rs::RunChild::Text(t) => text.push_str(&t.text),
                        docx_rs::RunChild::Tab(_) => text.push('\t'),
                        _ => {}
                    }
                }
            }
        }
        text
    }

    fn cell_text(cell: &docx_rs::TableCell) -> String {
        cell.children
            .iter()
            .filter_map(|content| match content {
                docx_rs::TableCellContent::Paragraph(p) => Some(Self::paragraph_text(p)),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(feature = "docx")]
impl Converter for DocxConverter {
    fn name(&self) -> &str {
        "DOCX"
    }

    fn extensions(&self) -> &[&'static str] {
        &["docx"]
    }

    #[allow(irrefutable_let_patterns)]
    fn convert(&self, data: &[u8]) -> Result<Extracted> {
        let doc = docx_rs::read_docx(data)
            .map_err(|e| Error::file_parse("document.docx", e.to_string()))?;

        let mut lines = Vec::new();
        let mut rows = Vec::new();
        for child in &doc.document.children {
            match child {
                docx_rs::DocumentChild::Paragraph(p) => lines.push(Self::paragraph_text(p)),
                docx_rs::DocumentChild::Table(table) => {
                    for table_child in &table.rows {
                        if let docx_rs::TableChild::TableRow(row) = table_child {
                            let cells: Vec<String> = row
                                .cells
                                .iter()
                                .filter_map(|cell| {
                                    if let docx_rs::TableRowChild::TableCell(c) = cell {
                                        Some(Self::cell_text(c))
                                    } else {
                                        None
                                    }
                                })
                                .collect();
                            rows.push(cells.join("\t"));
                        }
                    }
                }
                _ => {}
            }
        }

        lines.extend(rows);
        Ok(Extracted::text(lines.join("\n")))
    }
}

/// PowerPoint decks: text runs of every slide, in slide order
#[cfg(feature = "pptx")]
#[derive(Debug, Clone, Default)]
pub struct PptxConverter;

#[cfg(feature = "pptx")]
impl PptxConverter {
    const SLIDE_PREFIX: &'static str = "ppt/slides/slide";

    fn slide_number(name: &str) -> u32 {
        name.trim_start_matches(Self::SLIDE_PREFIX)
            .trim_end_matches(".xml")
            .parse()
            .unwrap_or(0)
    }

    /// Text of one slide; one line per `<a:p>` paragraph
    pub fn slide_text(xml: &str) -> String {
        use quick_xml::events::Event;
        use quick_xml::Reader;

        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut lines = Vec::new();
        let mut current = String::new();
        let mut in_text = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
                Ok(Event::Text(e)) if in_text => {
                    if let Ok(text) = e.unescape() {
                        current.push_str(&text);
                    }
                }
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"t" => in_text = false,
                    b"p" => {
                        let line = current.trim();
                        if !line.is_empty() {
                            lines.push(line.to_string());
                        }
                        current.clear();
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    tracing::debug!("Stopping at malformed slide XML: {}", e);
                    break;
                }
                _ => {}
            }
        }

        let tail = current.trim();
        if !tail.is_empty() {
            lines.push(tail.to_string());
        }
        lines.join("\n")
    }
}

#[cfg(feature = "pptx")]
impl Converter for PptxConverter {
    fn name(&self) -> &str {
        "PPTX"
    }

    fn extensions(&self) -> &[&'static str] {
        &["pptx"]
    }

    fn convert(&self, data: &[u8]) -> Result<Extracted> {
        use std::io::Read;

        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(data))
            .map_err(|e| Error::file_parse("presentation.pptx", e.to_string()))?;

        let mut slide_names: Vec<String> = archive
            .file_names()
            .filter(|name| name.starts_with(Self::SLIDE_PREFIX) && name.ends_with(".xml"))
            .map(str::to_string)
            .collect();
        slide_names.sort_by_key(|name| Self::slide_number(name));

        let mut slides = Vec::new();
        let mut warnings = Vec::new();
        for name in slide_names {
            let mut xml = String::new();
            let read = archive
                .by_name(&name)
                .map_err(|e| e.to_string())
                .and_then(|mut file| file.read_to_string(&mut xml).map_err(|e| e.to_string()));
            match read {
                Ok(_) => {
                    let text = Self::slide_text(&xml);
                    if !text.is_empty() {
                        slides.push(text);
                    }
                }
                Err(e) => warnings.push(format!("Skipped {}: {}", name, e)),
            }
        }

        Ok(Extracted {
            text: slides.join("\n"),
            warnings,
        })
    }
}

/// Spreadsheets: a `# Sheet: <name>` header, then one tab-joined line per row
#[cfg(feature = "xlsx")]
#[derive(Debug, Clone, Default)]
pub struct SpreadsheetConverter;

#[cfg(feature = "xlsx")]
impl SpreadsheetConverter {
    /// Cell value as text; empty cells become empty strings
    pub fn cell_text(cell: &calamine::Data) -> String {
        match cell {
            calamine::Data::Empty => String::new(),
            calamine::Data::String(s) => s.clone(),
            calamine::Data::Float(f) => f.to_string(),
            calamine::Data::Int(i) => i.to_string(),
            calamine::Data::Bool(b) => b.to_string(),
            calamine::Data::DateTime(dt) => dt.to_string(),
            calamine::Data::DateTimeIso(s) | calamine::Data::DurationIso(s) => s.clone(),
            _ => String::new(),
        }
    }
}

#[cfg(feature = "xlsx")]
impl Converter for SpreadsheetConverter {
    fn name(&self) -> &str {
        "XLSX"
    }

    fn extensions(&self) -> &[&'static str] {
        &["xlsx", "xlsm", "xls", "ods"]
    }

    fn convert(&self, data: &[u8]) -> Result<Extracted> {
        use calamine::Reader;

        let mut workbook = calamine::open_workbook_auto_from_rs(std::io::Cursor::new(data))
            .map_err(|e| Error::file_parse("spreadsheet", e.to_string()))?;

        let mut parts = Vec::new();
        let mut warnings = Vec::new();
        for sheet_name in workbook.sheet_names().to_vec() {
            parts.push(format!("# Sheet: {}", sheet_name));
            match workbook.worksheet_range(&sheet_name) {
                Ok(range) => {
                    for row in range.rows() {
                        parts.push(row.iter().map(Self::cell_text).collect::<Vec<_>>().join("\t"));
                    }
                }
                Err(e) => warnings.push(format!("Sheet '{}' unreadable: {}", sheet_name, e)),
            }
        }

        Ok(Extracted {
            text: parts.join("\n"),
            warnings,
        })
    }
}
