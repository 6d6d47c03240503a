//! Turning raw notebook cells into cell records.

use crate::code::{comment_marker_for, parse_code, DEFAULT_COMMENT_MARKER};
use crate::markdown::parse_markdown;
use crate::record::CellRecord;
use crate::traits::TableParser;
use crate::types::{CellKind, Notebook, RawCell};

/// Parses raw cells into cell records, one record per cell.
pub struct CellExtractor<'a> {
    /// HTML table capability used for code outputs.
    table_parser: &'a dyn TableParser,

    /// Line-comment marker used to find code-cell titles.
    comment_marker: String,
}

impl<'a> CellExtractor<'a> {
    /// Create an extractor using `#` comments.
    pub fn new(table_parser: &'a dyn TableParser) -> Self {
        Self {
            table_parser,
            comment_marker: DEFAULT_COMMENT_MARKER.to_string(),
        }
    }

    /// Create an extractor whose comment marker follows the notebook language.
    pub fn for_notebook(notebook: &Notebook, table_parser: &'a dyn TableParser) -> Self {
        Self::new(table_parser).with_comment_marker(comment_marker_for(notebook.language()))
    }

    /// Use a custom line-comment marker for code-cell titles.
    pub fn with_comment_marker(mut self, marker: impl Into<String>) -> Self {
        self.comment_marker = marker.into();
        self
    }

    /// Extract every cell of a notebook, in document order.
    pub fn extract_all(&self, cells: &[RawCell]) -> Vec<CellRecord> {
        cells.iter().map(|cell| self.extract_cell(cell)).collect()
    }

    /// Extract one cell.
    pub fn extract_cell(&self, cell: &RawCell) -> CellRecord {
        let mut record = CellRecord::new(cell.kind).with_source_index(cell.index);
        record.metadata = cell.metadata.clone();

        match cell.kind {
            CellKind::Markdown => {
                let parsed = parse_markdown(&cell.source);
                record.title = parsed.title;
                record.bullets = parsed.bullets;
                record.paragraphs = parsed.paragraphs;
                record.metadata.extend(parsed.metadata);
            }
            CellKind::Code => {
                let parsed = parse_code(
                    &cell.source,
                    &cell.outputs,
                    &self.comment_marker,
                    self.table_parser,
                );
                record.title = parsed.title;
                record.code = Some(parsed.code);
                record.images = parsed.images;
                record.table = parsed.table.map(|t| t.with_source_index(Some(cell.index)));
                record.raw_outputs = Some(parsed.raw_outputs);
            }
        }

        log::debug!(
            "Cell {} ({:?}): title={:?}, {} bullets, {} paragraphs, {} images, table={}",
            cell.index,
            cell.kind,
            record.title,
            record.bullets.len(),
            record.paragraphs.len(),
            record.images.len(),
            record.table.is_some()
        );

        record
    }
}
