//! Jupyter notebook backend: reads nbformat v4 notebooks (and pre-parsed
//! record documents) and mines HTML tables from rich outputs.

pub mod html;
pub mod reader;

pub use html::HtmlTableParser;
pub use reader::{Document, InputFormat, NotebookReader, RecordDocument};
