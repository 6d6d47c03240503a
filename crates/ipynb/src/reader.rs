//! Notebook and record-document reader.

use jupdeck_core::code::multiline_text;
use jupdeck_core::{CellKind, CellRecord, Error, Metadata, Notebook, RawCell, Result};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Oldest nbformat major version with a flat `cells` list.
const MIN_NBFORMAT: u64 = 4;

/// The kind of input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// A Jupyter notebook (`.ipynb`).
    Notebook,
    /// A JSON document of already-parsed cell records.
    Records,
}

impl InputFormat {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "ipynb" => Some(Self::Notebook),
            "json" => Some(Self::Records),
            _ => None,
        }
    }

    /// Detect format from parsed JSON content.
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        if object.contains_key("nbformat") {
            Some(Self::Notebook)
        } else if object.get("cells").is_some_and(Value::is_array) {
            Some(Self::Records)
        } else {
            None
        }
    }
}

/// A pre-parsed document: metadata plus cell records.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordDocument {
    /// Document-level metadata.
    #[serde(default)]
    pub metadata: Metadata,

    /// Cell records in document order.
    pub cells: Vec<CellRecord>,
}

/// A loaded input of either kind.
#[derive(Debug, Clone)]
pub enum Document {
    Notebook(Notebook),
    Records(RecordDocument),
}

#[derive(Deserialize)]
struct NotebookFile {
    #[serde(default)]
    nbformat: Option<u64>,
    #[serde(default)]
    metadata: Metadata,
    cells: Vec<CellFile>,
}

#[derive(Deserialize)]
struct CellFile {
    cell_type: String,
    #[serde(default)]
    source: Value,
    #[serde(default)]
    outputs: Vec<Value>,
    #[serde(default)]
    metadata: Metadata,
}

/// Reader for nbformat v4 notebooks and record documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotebookReader;

impl NotebookReader {
    /// Create a new reader.
    pub fn new() -> Self {
        Self
    }

    /// Load a document, detecting its kind from the extension and content.
    pub fn load(&self, path: &Path) -> Result<Document> {
        let text = fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&text).map_err(|e| {
            Error::NotebookParse(format!("{} is not valid JSON: {}", path.display(), e))
        })?;

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(InputFormat::from_extension)
            .or_else(|| InputFormat::from_json(&value))
            .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?;

        log::debug!("Loading {} as {:?}", path.display(), format);
        match format {
            InputFormat::Notebook => self.notebook_from_value(value).map(Document::Notebook),
            InputFormat::Records => self.records_from_value(value).map(Document::Records),
        }
    }

    /// Parse notebook JSON text.
    pub fn parse_notebook(&self, text: &str) -> Result<Notebook> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| Error::NotebookParse(format!("Invalid notebook JSON: {}", e)))?;
        self.notebook_from_value(value)
    }

    /// Parse a record document's JSON text.
    pub fn parse_records(&self, text: &str) -> Result<RecordDocument> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| Error::NotebookParse(format!("Invalid record document JSON: {}", e)))?;
        self.records_from_value(value)
    }

    fn notebook_from_value(&self, value: Value) -> Result<Notebook> {
        let file: NotebookFile = serde_json::from_value(value)
            .map_err(|e| Error::NotebookParse(format!("Malformed notebook structure: {}", e)))?;

        if let Some(version) = file.nbformat.filter(|&v| v < MIN_NBFORMAT) {
            return Err(Error::UnsupportedFormat(format!(
                "nbformat {} (need {} or newer)",
                version, MIN_NBFORMAT
            )));
        }

        let mut cells = Vec::with_capacity(file.cells.len());
        for (index, cell) in file.cells.into_iter().enumerate() {
            let Some(kind) = CellKind::from_cell_type(&cell.cell_type) else {
                log::debug!("Skipping cell {} of type '{}'", index, cell.cell_type);
                continue;
            };

            let source = multiline_text(&cell.source).unwrap_or_default();
            cells.push(RawCell {
                index,
                kind,
                source,
                outputs: if kind == CellKind::Code { cell.outputs } else { Vec::new() },
                metadata: cell.metadata,
            });
        }

        log::debug!("Read notebook with {} renderable cells", cells.len());
        Ok(Notebook {
            metadata: file.metadata,
            cells,
        })
    }

    fn records_from_value(&self, value: Value) -> Result<RecordDocument> {
        serde_json::from_value(value)
            .map_err(|e| Error::InvalidRecord(format!("Malformed cell record document: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn notebook_json(cells: Value) -> String {
        json!({
            "nbformat": 4,
            "nbformat_minor": 5,
            "metadata": {"language_info": {"name": "python"}},
            "cells": cells
        })
        .to_string()
    }

    #[test]
    fn test_input_format_from_extension() {
        assert_eq!(InputFormat::from_extension("ipynb"), Some(InputFormat::Notebook));
        assert_eq!(InputFormat::from_extension("JSON"), Some(InputFormat::Records));
        assert_eq!(InputFormat::from_extension("txt"), None);
    }

    #[test]
    fn test_input_format_from_json() {
        assert_eq!(InputFormat::from_json(&json!({"nbformat": 4, "cells": []})), Some(InputFormat::Notebook));
        assert_eq!(InputFormat::from_json(&json!({"cells": []})), Some(InputFormat::Records));
        assert_eq!(InputFormat::from_json(&json!([1, 2])), None);
    }

    #[test]
    fn test_parse_markdown_and_code_cells() {
        let text = notebook_json(json!([
            {"cell_type": "markdown", "metadata": {}, "source": ["# Heading Line 1\n", "More text on line 2"]},
            {"cell_type": "raw", "metadata": {}, "source": "raw stuff"},
            {"cell_type": "code", "metadata": {"tags": ["x"]}, "execution_count": 1, "source": "print('Hello')",
             "outputs": [
                {"output_type": "stream", "name": "stdout", "text": "This is standard output\n"},
                {"output_type": "stream", "name": "stderr", "text": "This is an error message\n"}
             ]}
        ]));

        let notebook = NotebookReader::new().parse_notebook(&text).unwrap();
        assert_eq!(notebook.language(), Some("python"));
        assert_eq!(notebook.cells.len(), 2);

        let markdown = &notebook.cells[0];
        assert_eq!(markdown.kind, CellKind::Markdown);
        assert_eq!(markdown.source, "# Heading Line 1\nMore text on line 2");

        let code = &notebook.cells[1];
        assert_eq!(code.index, 2);
        assert_eq!(code.kind, CellKind::Code);
        assert_eq!(code.outputs.len(), 2);
        assert_eq!(code.outputs[0]["name"], "stdout");
        assert_eq!(code.metadata["tags"], json!(["x"]));
    }

    #[test]
    fn test_code_cell_without_outputs() {
        let text = notebook_json(json!([
            {"cell_type": "code", "metadata": {}, "source": "x = 1 + 1", "outputs": []}
        ]));
        let notebook = NotebookReader::new().parse_notebook(&text).unwrap();
        assert!(notebook.cells[0].outputs.is_empty());
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = NotebookReader::new().parse_notebook("{not json").unwrap_err();
        assert!(matches!(err, Error::NotebookParse(_)));
    }

    #[test]
    fn test_missing_cells_is_parse_error() {
        let err = NotebookReader::new().parse_notebook(r#"{"nbformat": 4}"#).unwrap_err();
        assert!(matches!(err, Error::NotebookParse(_)));
    }

    #[test]
    fn test_old_nbformat_rejected() {
        let err = NotebookReader::new()
            .parse_notebook(r#"{"nbformat": 3, "cells": []}"#)
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_parse_record_document() {
        let text = json!({
            "metadata": {},
            "cells": [{
                "type": "markdown",
                "title": "Demo Slide",
                "paragraphs": ["This is a test."],
                "bullets": [],
                "images": [],
                "table": null,
                "raw_outputs": null,
                "code": null,
                "metadata": {}
            }]
        })
        .to_string();

        let doc = NotebookReader::new().parse_records(&text).unwrap();
        assert_eq!(doc.cells.len(), 1);
        assert_eq!(doc.cells[0].title.as_deref(), Some("Demo Slide"));
    }

    #[test]
    fn test_record_document_with_wrong_shape_is_invalid_record() {
        let text = r#"{"cells": [{"type": "slide", "title": 3}]}"#;
        let err = NotebookReader::new().parse_records(text).unwrap_err();
        assert!(matches!(err, Error::InvalidRecord(_)));
    }

    #[test]
    fn test_load_detects_format() {
        let dir = tempfile::tempdir().unwrap();

        let nb_path = dir.path().join("demo.ipynb");
        let mut file = fs::File::create(&nb_path).unwrap();
        file.write_all(notebook_json(json!([{"cell_type": "markdown", "metadata": {}, "source": "# T"}])).as_bytes())
            .unwrap();
        assert!(matches!(NotebookReader::new().load(&nb_path).unwrap(), Document::Notebook(_)));

        let sniffed = dir.path().join("records.data");
        fs::write(&sniffed, r#"{"cells": []}"#).unwrap();
        assert!(matches!(NotebookReader::new().load(&sniffed).unwrap(), Document::Records(_)));

        let missing = dir.path().join("missing.ipynb");
        assert!(matches!(NotebookReader::new().load(&missing).unwrap_err(), Error::IoError(_)));
    }
}
