//! Core pipeline for turning notebook cells into slide decks: cell records,
//! markdown and code extraction, slide grouping and slide layout.

pub mod code;
pub mod convert;
pub mod error;
pub mod extract;
pub mod grouping;
pub mod layout;
pub mod markdown;
pub mod record;
pub mod render;
pub mod title;
pub mod traits;
pub mod types;

pub use convert::{ConversionSummary, Converter};
pub use error::{Error, Result};
pub use extract::CellExtractor;
pub use grouping::GroupingEngine;
pub use layout::{Frame, LayoutConfig, Region, SlidePlan, TableGrid, TextBlock, TextStyle};
pub use record::{CellRecord, TablePolicy};
pub use render::{OverflowNamer, SlideRenderer};
pub use title::clean_title;
pub use traits::{DeckSurface, NoTableParser, TableParser, TableWriter};
pub use types::{CellKind, ImageRef, Metadata, Notebook, RawCell, Table, TableRow};
