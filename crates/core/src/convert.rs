//! End-to-end conversion: records to a persisted deck.

use crate::error::Result;
use crate::grouping::GroupingEngine;
use crate::record::CellRecord;
use crate::render::{OverflowNamer, SlideRenderer};
use crate::traits::{DeckSurface, TableWriter};
use std::path::{Path, PathBuf};

/// What a conversion produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionSummary {
    /// Number of slides rendered.
    pub slide_count: usize,
    /// Path of the written deck.
    pub deck_path: PathBuf,
    /// Overflow side files written, in slide order.
    pub overflow_files: Vec<PathBuf>,
}

/// Groups records into slides, renders them and persists the deck.
pub struct Converter<'a> {
    grouping: GroupingEngine,
    renderer: SlideRenderer,
    table_writer: &'a dyn TableWriter,
}

impl<'a> Converter<'a> {
    /// Create a converter with default grouping and rendering.
    pub fn new(table_writer: &'a dyn TableWriter) -> Self {
        Self {
            grouping: GroupingEngine::new(),
            renderer: SlideRenderer::new(),
            table_writer,
        }
    }

    /// Use a custom grouping engine.
    pub fn with_grouping(mut self, grouping: GroupingEngine) -> Self {
        self.grouping = grouping;
        self
    }

    /// Use a custom renderer.
    pub fn with_renderer(mut self, renderer: SlideRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Group records into slide records without rendering.
    pub fn group(&self, records: &[CellRecord]) -> Vec<CellRecord> {
        self.grouping.group(records)
    }

    /// Convert cell records into a deck at `deck_path`.
    ///
    /// Every input record is validated before anything is drawn, so a
    /// malformed record never leaves a half-built deck behind. Overflow
    /// tables are written alongside the deck.
    pub fn convert(
        &self,
        records: &[CellRecord],
        surface: &mut dyn DeckSurface,
        deck_path: &Path,
    ) -> Result<ConversionSummary> {
        for record in records {
            record.validate()?;
        }

        let slides = self.group(records);
        let output_dir = deck_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut namer = OverflowNamer::new();
        let mut overflow_files = Vec::new();

        for (i, slide) in slides.iter().enumerate() {
            let written = self.renderer.render(
                slide,
                i + 1,
                &mut namer,
                surface,
                self.table_writer,
                output_dir,
            )?;
            overflow_files.extend(written);
        }

        surface.persist(deck_path)?;
        log::info!(
            "Rendered {} slides to {} ({} overflow files)",
            slides.len(),
            deck_path.display(),
            overflow_files.len()
        );

        Ok(ConversionSummary {
            slide_count: slides.len(),
            deck_path: deck_path.to_path_buf(),
            overflow_files,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::extract::CellExtractor;
    use crate::record::TablePolicy;
    use crate::render::tests::{table_rows, MemoryTableWriter, RecordingSurface};
    use crate::traits::{NoTableParser, TableParser};
    use crate::types::{RawCell, TableRow};
    use serde_json::json;

    /// Parses any markup into a fixed number of rows.
    struct RowsParser(usize);

    impl TableParser for RowsParser {
        fn parse_first_table(&self, _markup: &str) -> Option<Vec<TableRow>> {
            Some(table_rows(self.0, 3))
        }
    }

    fn html_output() -> serde_json::Value {
        json!({"output_type": "execute_result", "data": {"text/html": "<table>...</table>"}})
    }

    #[test]
    fn test_single_markdown_cell() {
        let records = CellExtractor::new(&NoTableParser)
            .extract_all(&[RawCell::markdown(0, "# Slide Title\n\nThis is a paragraph.")]);

        let writer = MemoryTableWriter::default();
        let mut surface = RecordingSurface::default();
        let summary = Converter::new(&writer)
            .convert(&records, &mut surface, Path::new("deck.pptx"))
            .unwrap();

        assert_eq!(summary.slide_count, 1);
        assert!(summary.overflow_files.is_empty());
        assert_eq!(surface.saved, Some(PathBuf::from("deck.pptx")));
        assert_eq!(surface.calls[0], "slide:Slide Title");
        assert_eq!(surface.calls[1], "text:Body:This is a paragraph.");
    }

    #[test]
    fn test_intro_with_large_table_inherited() {
        let parser = RowsParser(20);
        let cells = vec![
            RawCell::markdown(0, "# Intro"),
            RawCell::code(1, "df", vec![html_output()]),
        ];
        let records = CellExtractor::new(&parser).extract_all(&cells);

        let writer = MemoryTableWriter::default();
        let mut surface = RecordingSurface::default();
        let converter = Converter::new(&writer)
            .with_grouping(GroupingEngine::new().with_table_policy(TablePolicy::InheritFirst));
        let summary = converter
            .convert(&records, &mut surface, Path::new("out/deck.pptx"))
            .unwrap();

        assert_eq!(summary.slide_count, 1);
        assert_eq!(surface.calls[0], "slide:Intro");
        assert!(surface.calls.contains(&"table:10x3".to_string()));
        assert_eq!(
            summary.overflow_files,
            vec![PathBuf::from("out/cell_1_table_1.xlsx")]
        );
        assert_eq!(writer.written.borrow()[0].1, 20);
    }

    #[test]
    fn test_intro_with_large_table_dropped_by_default() {
        let parser = RowsParser(20);
        let cells = vec![
            RawCell::markdown(0, "# Intro"),
            RawCell::code(1, "df", vec![html_output()]),
        ];
        let records = CellExtractor::new(&parser).extract_all(&cells);

        let writer = MemoryTableWriter::default();
        let mut surface = RecordingSurface::default();
        let summary = Converter::new(&writer)
            .convert(&records, &mut surface, Path::new("deck.pptx"))
            .unwrap();

        assert_eq!(summary.slide_count, 1);
        assert!(summary.overflow_files.is_empty());
        assert!(!surface.calls.iter().any(|c| c.starts_with("table:")));
    }

    #[test]
    fn test_overflow_files_go_next_to_bare_deck_path() {
        let parser = RowsParser(11);
        let records =
            CellExtractor::new(&parser).extract_all(&[RawCell::code(2, "df", vec![html_output()])]);

        let writer = MemoryTableWriter::default();
        let mut surface = RecordingSurface::default();
        let summary = Converter::new(&writer)
            .convert(&records, &mut surface, Path::new("deck.pptx"))
            .unwrap();

        assert_eq!(summary.overflow_files, vec![PathBuf::from("./cell_2_table_1.xlsx")]);
    }

    #[test]
    fn test_notes_from_every_grouped_cell() {
        let cells = vec![
            RawCell::markdown(0, "<!-- notes: first note -->\n# Intro\n\nLead."),
            RawCell::markdown(1, "<!-- notes: second note -->\nMore."),
        ];
        let records = CellExtractor::new(&NoTableParser).extract_all(&cells);

        let writer = MemoryTableWriter::default();
        let mut surface = RecordingSurface::default();
        let summary = Converter::new(&writer)
            .convert(&records, &mut surface, Path::new("deck.pptx"))
            .unwrap();

        assert_eq!(summary.slide_count, 1);
        assert!(surface
            .calls
            .contains(&"notes:Lead.\nMore.\nfirst note\nsecond note".to_string()));
    }

    #[test]
    fn test_malformed_record_rejected_before_drawing() {
        let mut bad = CellRecord::new(crate::types::CellKind::Markdown);
        bad.bullets = vec![String::new()];

        let writer = MemoryTableWriter::default();
        let mut surface = RecordingSurface::default();
        let err = Converter::new(&writer)
            .convert(&[bad], &mut surface, Path::new("deck.pptx"))
            .unwrap_err();

        assert!(matches!(err, Error::InvalidRecord(_)));
        assert!(surface.calls.is_empty());
        assert!(surface.saved.is_none());
    }
}
