//! Markdown and HTML converters

#[cfg(any(feature = "markdown", feature = "html"))]
use crate::error::Result;

#[cfg(any(feature = "markdown", feature = "html"))]
use super::{decode_text, Converter, Extracted};

/// Collapse runs of blank lines and trim trailing whitespace per line
#[cfg(any(feature = "markdown", test))]
fn tidy_lines(raw: &str) -> String {
    let mut out = Vec::new();
    let mut blank_run = 0;
    for line in raw.lines().map(str::trim_end) {
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push(line);
    }
    out.join("\n").trim().to_string()
}

/// Markdown rendered to plain text: markup dropped, block structure kept as lines
#[cfg(feature = "markdown")]
#[derive(Debug, Clone, Default)]
pub struct MarkdownConverter;

#[cfg(feature = "markdown")]
impl MarkdownConverter {
    /// Render markdown source to plain text
    pub fn render(source: &str) -> String {
        use pulldown_cmark::{Event, Options, Parser, TagEnd};

        let mut text = String::with_capacity(source.len());
        for event in Parser::new_ext(source, Options::ENABLE_TABLES) {
            match event {
                Event::Text(t) | Event::Code(t) => text.push_str(&t),
                Event::SoftBreak | Event::HardBreak | Event::Rule => text.push('\n'),
                Event::End(TagEnd::TableCell) => text.push('\t'),
                Event::End(
                    TagEnd::Paragraph
                    | TagEnd::Heading(_)
                    | TagEnd::Item
                    | TagEnd::CodeBlock
                    | TagEnd::TableHead
                    | TagEnd::TableRow,
                ) => text.push('\n'),
                _ => {}
            }
        }
        tidy_lines(&text)
    }
}

#[cfg(feature = "markdown")]
impl Converter for MarkdownConverter {
    fn name(&self) -> &str {
        "MD"
    }

    fn extensions(&self) -> &[&'static str] {
        &["md", "markdown"]
    }

    fn convert(&self, data: &[u8]) -> Result<Extracted> {
        let decoded = decode_text(data);
        Ok(Extracted {
            text: Self::render(&decoded.text),
            warnings: decoded.warnings,
        })
    }
}

/// HTML visible text, one text node per line; script and style content dropped
#[cfg(feature = "html")]
#[derive(Debug, Clone, Default)]
pub struct HtmlConverter;

#[cfg(feature = "html")]
impl HtmlConverter {
    const HIDDEN: [&'static str; 3] = ["script", "style", "noscript"];

    /// Extract visible text from an HTML document
    pub fn render(html: &str) -> String {
        let document = scraper::Html::parse_document(html);

        document
            .root_element()
            .descendants()
            .filter_map(|node| {
                let text = node.value().as_text()?;
                let hidden = node.ancestors().any(|ancestor| {
                    ancestor
                        .value()
                        .as_element()
                        .map_or(false, |el| Self::HIDDEN.contains(&el.name()))
                });
                let trimmed = text.trim();
                (!hidden && !trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(feature = "html")]
impl Converter for HtmlConverter {
    fn name(&self) -> &str {
        "HTML"
    }

    fn extensions(&self) -> &[&'static str] {
        &["html", "htm"]
    }

    fn convert(&self, data: &[u8]) -> Result<Extracted> {
        let decoded = decode_text(data);
        Ok(Extracted {
            text: Self::render(&decoded.text),
            warnings: decoded.warnings,
        })
    }
}
