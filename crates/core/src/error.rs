//! Error types for notebook-to-deck conversion.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting a notebook into a deck.
///
/// Best-effort extraction problems (a malformed HTML table in a cell
/// output, for example) are not represented here: they are logged and the
/// affected field is left empty.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read the input or write the deck / side files.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The input could not be parsed as a notebook document.
    #[error("Notebook parsing error: {0}")]
    NotebookParse(String),

    /// A cell record handed to the renderer is not well formed.
    #[error("Invalid cell record: {0}")]
    InvalidRecord(String),

    /// The input format is not supported or could not be detected.
    #[error("Unsupported or unrecognized input format: {0}")]
    UnsupportedFormat(String),

    /// A deck surface was driven out of order.
    #[error("Deck error: {0}")]
    Deck(String),

    /// Failed to produce XML for a package part.
    #[error("XML error: {0}")]
    XmlError(String),

    /// ZIP archive error (for PPTX/XLSX packages).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// An embedded image payload could not be decoded.
    #[error("Image error: {0}")]
    Image(String),
}
