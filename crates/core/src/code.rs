//! Extraction of code cells: source, comment title, images and tables.

use crate::title::clean_title;
use crate::traits::TableParser;
use crate::types::{ImageRef, Table};
use serde_json::Value;

/// Output types that carry rich MIME bundles.
const RICH_OUTPUT_TYPES: &[&str] = &["display_data", "execute_result"];

/// Image MIME type mined from rich outputs.
pub const IMAGE_MIME: &str = "image/png";

/// HTML MIME type mined for tables.
pub const HTML_MIME: &str = "text/html";

/// Comment marker used when a notebook does not declare its language.
pub const DEFAULT_COMMENT_MARKER: &str = "#";

/// Result of extracting one code cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedCode {
    /// Title from the first comment line, if any.
    pub title: Option<String>,

    /// Trimmed source text.
    pub code: String,

    /// Images in output order.
    pub images: Vec<ImageRef>,

    /// Table mined from HTML output.
    pub table: Option<Table>,

    /// All outputs, verbatim.
    pub raw_outputs: Vec<Value>,
}

/// Pick the line-comment marker for a notebook language.
pub fn comment_marker_for(language: Option<&str>) -> &'static str {
    let Some(language) = language else {
        return DEFAULT_COMMENT_MARKER;
    };

    match language.to_ascii_lowercase().as_str() {
        "rust" | "c" | "c++" | "cpp" | "java" | "javascript" | "typescript" | "go" | "scala"
        | "kotlin" | "swift" | "csharp" | "c#" | "f#" => "//",
        "sql" | "haskell" | "lua" => "--",
        _ => DEFAULT_COMMENT_MARKER,
    }
}

/// Extract a code cell's slide fields from its source and outputs.
///
/// `table_parser` is consulted for every output carrying HTML with a
/// `<table`; a later successfully parsed table replaces an earlier one.
/// Parse failures leave the table absent.
pub fn parse_code(
    source: &str,
    outputs: &[Value],
    comment_marker: &str,
    table_parser: &dyn TableParser,
) -> ParsedCode {
    let mut parsed = ParsedCode {
        title: find_comment_title(source, comment_marker),
        code: source.trim().to_string(),
        raw_outputs: outputs.to_vec(),
        ..Default::default()
    };

    for output in outputs {
        let output_type = output.get("output_type").and_then(Value::as_str);
        let data = output.get("data");

        if output_type.is_some_and(|t| RICH_OUTPUT_TYPES.contains(&t)) {
            if let Some(image) = data.and_then(|d| d.get(IMAGE_MIME)).and_then(multiline_text) {
                let payload: String = image.chars().filter(|c| !c.is_whitespace()).collect();
                if !payload.is_empty() {
                    parsed.images.push(ImageRef::new(IMAGE_MIME, payload));
                }
            }
        }

        if let Some(html) = data.and_then(|d| d.get(HTML_MIME)).and_then(multiline_text) {
            if html.contains("<table") {
                match table_parser.parse_first_table(&html).and_then(Table::from_rows) {
                    Some(table) => parsed.table = Some(table),
                    None => log::debug!("HTML output contained no usable table"),
                }
            }
        }
    }

    parsed
}

/// First comment line, cleaned into a title.
fn find_comment_title(source: &str, comment_marker: &str) -> Option<String> {
    let line = source
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with(comment_marker))?;

    let title = clean_title(line.trim_start_matches(comment_marker));
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

/// Read an nbformat multiline string (a string or an array of strings).
pub fn multiline_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(parts) => Some(parts.iter().filter_map(Value::as_str).collect()),
        _ => None,
    }
}
