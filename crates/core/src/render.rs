//! Slide layout renderer: maps one slide record onto a deck surface.

use crate::error::Result;
use crate::layout::{
    LayoutConfig, OverflowTable, Region, SlidePlan, TableGrid, TextBlock, TextStyle,
};
use crate::record::CellRecord;
use crate::traits::{DeckSurface, TableWriter};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Hands out deterministic, distinct side-file names for overflow tables.
///
/// Names are `cell_<index>_table_<n>.xlsx`, counting `n` from 1 per cell
/// index, or `slide_<number>_table_<n>.xlsx` when no index is known.
#[derive(Debug, Clone, Default)]
pub struct OverflowNamer {
    counters: HashMap<String, usize>,
}

impl OverflowNamer {
    /// Create a namer with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Next file name for a table from `source_index` on slide `slide_number`.
    pub fn next_name(&mut self, source_index: Option<usize>, slide_number: usize) -> String {
        let prefix = match source_index {
            Some(index) => format!("cell_{}", index),
            None => format!("slide_{}", slide_number),
        };
        let counter = self.counters.entry(prefix.clone()).or_insert(0);
        *counter += 1;
        format!("{}_table_{}.xlsx", prefix, counter)
    }
}

/// Renders slide records with a fixed layout.
#[derive(Debug, Clone)]
pub struct SlideRenderer {
    layout: LayoutConfig,
    speaker_notes: bool,
}

impl Default for SlideRenderer {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            speaker_notes: true,
        }
    }
}

impl SlideRenderer {
    /// Create a renderer with the default layout and speaker notes enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom layout.
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    /// Enable or disable presenter notes.
    pub fn with_speaker_notes(mut self, enabled: bool) -> Self {
        self.speaker_notes = enabled;
        self
    }

    /// The layout in use.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Whether presenter notes are attached.
    pub fn speaker_notes(&self) -> bool {
        self.speaker_notes
    }

    /// Lay out one slide record.
    ///
    /// The record is validated first; a malformed record is rejected
    /// rather than coerced.
    pub fn plan(
        &self,
        record: &CellRecord,
        slide_number: usize,
        namer: &mut OverflowNamer,
    ) -> Result<SlidePlan> {
        record.validate()?;

        let layout = &self.layout;
        let mut regions = Vec::new();
        let mut overflow = Vec::new();

        for (i, paragraph) in record.paragraphs.iter().enumerate() {
            let top = layout.content_top + i as f64 * layout.paragraph_step;
            regions.push(Region::Text {
                frame: layout.text_frame(top, layout.paragraph_height),
                block: TextBlock::new(TextStyle::Body, vec![paragraph.clone()]),
            });
        }
        let mut cursor =
            layout.content_top + record.paragraphs.len() as f64 * layout.paragraph_step;

        if !record.bullets.is_empty() {
            let frame = layout.text_frame(cursor, layout.bullets_height);
            regions.push(Region::Text {
                frame,
                block: TextBlock::new(TextStyle::Bullets, record.bullets.clone()),
            });
            cursor = frame.bottom() + layout.region_gap;
        }

        if let Some(code) = record.code.as_deref().filter(|c| !c.is_empty()) {
            let frame = layout.text_frame(cursor, layout.code_height);
            regions.push(Region::Text {
                frame,
                block: TextBlock::new(TextStyle::Code, code.lines().map(str::to_string).collect()),
            });
            cursor = frame.bottom() + layout.region_gap;
        }

        if let Some(table) = &record.table {
            let columns = table.columns();
            let oversized = layout.is_oversized(table);
            let shown = if oversized {
                layout.max_inline_rows
            } else {
                table.row_count()
            };
            let grid = TableGrid::from_rows(&columns, &table.rows, shown);
            let height = (grid.rows.len() + 1) as f64 * layout.table_row_height;
            let frame = layout.text_frame(cursor, height);
            regions.push(Region::Table { frame, grid });
            cursor = frame.bottom() + layout.region_gap;

            if oversized {
                let file_name = namer.next_name(
                    table.source_index.or(record.source_index),
                    slide_number,
                );
                log::debug!(
                    "Slide {}: table of {} rows x {} columns overflows to {}",
                    slide_number,
                    table.row_count(),
                    table.column_count(),
                    file_name
                );
                let notice = format!(
                    "Table truncated to {} of {} rows, see {}",
                    shown.min(table.row_count()),
                    table.row_count(),
                    file_name
                );
                regions.push(Region::Text {
                    frame: layout.text_frame(cursor, layout.notice_height),
                    block: TextBlock::new(TextStyle::Notice, vec![notice]),
                });
                overflow.push(OverflowTable {
                    file_name,
                    columns,
                    rows: table.rows.clone(),
                });
            }
        }

        for (i, image) in record.images.iter().enumerate() {
            regions.push(Region::Image {
                frame: layout.image_frame(i),
                image: image.clone(),
            });
        }

        Ok(SlidePlan {
            title: record.title.clone().unwrap_or_default(),
            regions,
            notes: self.notes_for(record),
            overflow,
        })
    }

    /// Lay out one slide record and draw it onto `surface`.
    ///
    /// Overflow tables are written next to the deck in `output_dir`; the
    /// paths written are returned.
    pub fn render(
        &self,
        record: &CellRecord,
        slide_number: usize,
        namer: &mut OverflowNamer,
        surface: &mut dyn DeckSurface,
        writer: &dyn TableWriter,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let plan = self.plan(record, slide_number, namer)?;
        apply_plan(&plan, surface)?;

        let mut written = Vec::with_capacity(plan.overflow.len());
        for table in &plan.overflow {
            let path = output_dir.join(&table.file_name);
            writer.write_table(&path, &table.columns, &table.rows)?;
            written.push(path);
        }

        Ok(written)
    }

    /// Presenter notes: the slide's paragraphs, then any `notes:` directive.
    fn notes_for(&self, record: &CellRecord) -> Option<String> {
        if !self.speaker_notes {
            return None;
        }

        let mut parts: Vec<&str> = record.paragraphs.iter().map(String::as_str).collect();
        if let Some(extra) = record.notes_directive() {
            parts.push(extra);
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n"))
        }
    }
}

/// Draw a slide plan onto a surface.
pub fn apply_plan(plan: &SlidePlan, surface: &mut dyn DeckSurface) -> Result<()> {
    surface.add_slide(&plan.title)?;

    for region in &plan.regions {
        match region {
            Region::Text { frame, block } => surface.add_text(*frame, block)?,
            Region::Image { frame, image } => surface.add_image(*frame, image)?,
            Region::Table { frame, grid } => surface.add_table(*frame, grid)?,
        }
    }

    if let Some(notes) = &plan.notes {
        surface.attach_notes(notes)?;
    }

    Ok(())
}
