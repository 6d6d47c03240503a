//! Slide geometry: layout configuration and the regions a slide plan places.
//!
//! Positions are fixed per region kind rather than computed from how much
//! text a region holds. All lengths are in inches.

use crate::types::{cell_text, ImageRef, Table, TableRow};

/// A positioned rectangle on the slide, in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Frame {
    /// Create a new frame.
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Bottom edge of the frame.
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Layout constants for the slide renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    /// Slide width.
    pub slide_width: f64,
    /// Slide height.
    pub slide_height: f64,
    /// Title region.
    pub title: Frame,
    /// Left edge of the text column.
    pub text_left: f64,
    /// Width of the text column.
    pub text_width: f64,
    /// Top of the first content region.
    pub content_top: f64,
    /// Vertical offset between stacked paragraph blocks.
    pub paragraph_step: f64,
    /// Height of one paragraph block.
    pub paragraph_height: f64,
    /// Height of the bullet list region.
    pub bullets_height: f64,
    /// Height of the code block.
    pub code_height: f64,
    /// Space left between consecutive regions.
    pub region_gap: f64,
    /// Left edge of the image column.
    pub image_left: f64,
    /// Width of one image.
    pub image_width: f64,
    /// Height of one image.
    pub image_height: f64,
    /// Vertical offset between stacked images.
    pub image_step: f64,
    /// Height of one table row.
    pub table_row_height: f64,
    /// Height of the truncation notice.
    pub notice_height: f64,
    /// Tables with more rows than this overflow.
    pub max_inline_rows: usize,
    /// Tables with more columns than this overflow.
    pub max_inline_columns: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            slide_width: 10.0,
            slide_height: 7.5,
            title: Frame::new(0.5, 0.3, 9.0, 1.0),
            text_left: 0.5,
            text_width: 5.8,
            content_top: 1.5,
            paragraph_step: 0.8,
            paragraph_height: 0.7,
            bullets_height: 2.0,
            code_height: 1.6,
            region_gap: 0.2,
            image_left: 6.5,
            image_width: 3.0,
            image_height: 2.4,
            image_step: 2.6,
            table_row_height: 0.3,
            notice_height: 0.4,
            max_inline_rows: 10,
            max_inline_columns: 6,
        }
    }
}

impl LayoutConfig {
    /// Create a layout with the default 10in x 7.5in geometry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the overflow thresholds.
    pub fn with_table_limits(mut self, max_rows: usize, max_columns: usize) -> Self {
        self.max_inline_rows = max_rows.max(1);
        self.max_inline_columns = max_columns.max(1);
        self
    }

    /// Set the text column.
    pub fn with_text_column(mut self, left: f64, width: f64) -> Self {
        self.text_left = left;
        self.text_width = width;
        self
    }

    /// Set the image column.
    pub fn with_image_column(mut self, left: f64, width: f64, height: f64, step: f64) -> Self {
        self.image_left = left;
        self.image_width = width;
        self.image_height = height;
        self.image_step = step;
        self
    }

    /// Set the paragraph stacking.
    pub fn with_paragraph_step(mut self, step: f64, height: f64) -> Self {
        self.paragraph_step = step;
        self.paragraph_height = height;
        self
    }

    /// Whether a table is too large to render inline.
    pub fn is_oversized(&self, table: &Table) -> bool {
        table.row_count() > self.max_inline_rows || table.column_count() > self.max_inline_columns
    }

    /// A full-width frame in the text column.
    pub(crate) fn text_frame(&self, top: f64, height: f64) -> Frame {
        Frame::new(self.text_left, top, self.text_width, height)
    }

    /// The frame of the `index`-th image.
    pub(crate) fn image_frame(&self, index: usize) -> Frame {
        Frame::new(
            self.image_left,
            self.content_top + index as f64 * self.image_step,
            self.image_width,
            self.image_height,
        )
    }
}

/// How a text region is styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    /// Plain prose.
    Body,
    /// A bulleted list, one bullet per paragraph.
    Bullets,
    /// Monospaced, shaded source code, one line per paragraph.
    Code,
    /// The "table truncated" notice.
    Notice,
}

/// Text for one region.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub style: TextStyle,
    pub paragraphs: Vec<String>,
}

impl TextBlock {
    /// Create a block of the given style.
    pub fn new(style: TextStyle, paragraphs: Vec<String>) -> Self {
        Self { style, paragraphs }
    }

    /// All text joined with newlines.
    pub fn text(&self) -> String {
        self.paragraphs.join("\n")
    }
}

/// A table flattened to display strings.
#[derive(Debug, Clone, PartialEq)]
pub struct TableGrid {
    /// Header row.
    pub columns: Vec<String>,
    /// Body rows, each as wide as `columns`.
    pub rows: Vec<Vec<String>>,
}

impl TableGrid {
    /// Flatten up to `limit` rows; columns come from the first row and
    /// missing keys render empty.
    pub fn from_rows(columns: &[String], rows: &[TableRow], limit: usize) -> Self {
        let rows = rows
            .iter()
            .take(limit)
            .map(|row| columns.iter().map(|c| cell_text(row.get(c))).collect())
            .collect();

        Self {
            columns: columns.to_vec(),
            rows,
        }
    }
}

/// One positioned element of a slide.
#[derive(Debug, Clone, PartialEq)]
pub enum Region {
    Text { frame: Frame, block: TextBlock },
    Image { frame: Frame, image: ImageRef },
    Table { frame: Frame, grid: TableGrid },
}

impl Region {
    /// The region's frame.
    pub fn frame(&self) -> Frame {
        match self {
            Region::Text { frame, .. } | Region::Image { frame, .. } | Region::Table { frame, .. } => {
                *frame
            }
        }
    }
}

/// A complete table that did not fit on the slide.
#[derive(Debug, Clone, PartialEq)]
pub struct OverflowTable {
    /// File name of the side file, relative to the deck's directory.
    pub file_name: String,
    /// Header row.
    pub columns: Vec<String>,
    /// Every original row.
    pub rows: Vec<TableRow>,
}

/// Everything the renderer will put on one slide.
#[derive(Debug, Clone, PartialEq)]
pub struct SlidePlan {
    /// Title text (empty if the group has none).
    pub title: String,
    /// Positioned regions, in drawing order.
    pub regions: Vec<Region>,
    /// Presenter notes, if enabled and non-empty.
    pub notes: Option<String>,
    /// Tables to export as side files.
    pub overflow: Vec<OverflowTable>,
}
