//! PowerPoint (Office Open XML) output backend.
//!
//! Implements the core drawing surface as a `.pptx` package writer, the
//! overflow table writer as a single-sheet `.xlsx` writer, and a reader
//! that summarizes written decks.

pub mod deck;
pub mod inspect;
pub mod package;
pub mod shapes;
pub mod template;
pub mod xlsx;

pub use deck::PptxDeck;
pub use inspect::{DeckInspector, SlideSummary};
pub use xlsx::XlsxTableWriter;
