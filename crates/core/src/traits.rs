//! Narrow interfaces to the collaborators the pipeline drives.
//!
//! The core never touches markup parsers, spreadsheet formats or the deck
//! file format directly; backends implement these traits.

use crate::error::Result;
use crate::layout::{Frame, TableGrid, TextBlock};
use crate::types::{ImageRef, TableRow};
use std::path::Path;

/// Parses the first table out of an HTML fragment.
pub trait TableParser {
    /// Return the rows of the first table in `markup`.
    ///
    /// Implementations return `None` on malformed markup instead of failing;
    /// cell outputs are untrusted.
    fn parse_first_table(&self, markup: &str) -> Option<Vec<TableRow>>;
}

/// Writes column-named rows to a spreadsheet file.
pub trait TableWriter {
    /// Write `rows` under the header `columns` to `path`.
    fn write_table(&self, path: &Path, columns: &[String], rows: &[TableRow]) -> Result<()>;
}

/// A slide deck being built, one slide at a time.
///
/// Every region operation applies to the most recently added slide.
pub trait DeckSurface {
    /// Start a new slide with the given title.
    fn add_slide(&mut self, title: &str) -> Result<()>;

    /// Add a text region.
    fn add_text(&mut self, frame: Frame, block: &TextBlock) -> Result<()>;

    /// Add an image region.
    fn add_image(&mut self, frame: Frame, image: &ImageRef) -> Result<()>;

    /// Add a table region.
    fn add_table(&mut self, frame: Frame, grid: &TableGrid) -> Result<()>;

    /// Attach presenter-only notes.
    fn attach_notes(&mut self, notes: &str) -> Result<()>;

    /// Write the finished deck to `path`.
    fn persist(&mut self, path: &Path) -> Result<()>;
}

/// A table parser that never finds a table.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTableParser;

impl TableParser for NoTableParser {
    fn parse_first_table(&self, _markup: &str) -> Option<Vec<TableRow>> {
        None
    }
}
