//! Domain types shared by every stage of the notebook-to-deck pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One table row: column name to cell value, in column order.
pub type TableRow = Map<String, Value>;

/// Free-form metadata attached to notebooks and records (tags, directives).
pub type Metadata = Map<String, Value>;

/// The kind of a notebook cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    /// Markdown prose.
    Markdown,
    /// Executable code with outputs.
    Code,
}

impl CellKind {
    /// Map an nbformat `cell_type` string to a cell kind.
    ///
    /// Returns `None` for kinds the pipeline does not render (`raw`).
    pub fn from_cell_type(cell_type: &str) -> Option<Self> {
        match cell_type {
            "markdown" => Some(Self::Markdown),
            "code" => Some(Self::Code),
            _ => None,
        }
    }
}

/// An image carried by a cell output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// MIME type of the payload, e.g. `image/png`.
    pub mime_type: String,

    /// Base64-encoded image bytes.
    pub data: String,
}

impl ImageRef {
    /// Create a new image reference.
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }
}

/// Tabular data mined from a cell output.
///
/// Serialized as a bare list of rows. `source_index` remembers which cell
/// the table came from so overflow files can be named after it even when
/// the table ends up on a slide headed by another cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<TableRow>", into = "Vec<TableRow>")]
pub struct Table {
    /// Rows in document order.
    pub rows: Vec<TableRow>,

    /// Index of the cell that produced the table, if known.
    pub source_index: Option<usize>,
}

impl Table {
    /// Build a table from rows; an empty row list yields `None`.
    pub fn from_rows(rows: Vec<TableRow>) -> Option<Self> {
        if rows.is_empty() {
            None
        } else {
            Some(Self {
                rows,
                source_index: None,
            })
        }
    }

    /// Tag the table with the index of the cell that produced it.
    pub fn with_source_index(mut self, index: Option<usize>) -> Self {
        self.source_index = index;
        self
    }

    /// Column names, taken from the first row's keys.
    pub fn columns(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns, as determined by the first row.
    pub fn column_count(&self) -> usize {
        self.rows.first().map(|row| row.len()).unwrap_or(0)
    }
}

impl From<Vec<TableRow>> for Table {
    fn from(rows: Vec<TableRow>) -> Self {
        Self {
            rows,
            source_index: None,
        }
    }
}

impl From<Table> for Vec<TableRow> {
    fn from(table: Table) -> Self {
        table.rows
    }
}

/// Render a table cell value as display text.
///
/// Null renders empty, strings verbatim, anything else as its JSON text.
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// A cell as handed over by the notebook reader, before semantic parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCell {
    /// Position of the cell in the original document.
    pub index: usize,

    /// Markdown or code.
    pub kind: CellKind,

    /// Raw source text.
    pub source: String,

    /// Execution outputs, verbatim (code cells only).
    pub outputs: Vec<Value>,

    /// Per-cell metadata from the notebook.
    pub metadata: Metadata,
}

impl RawCell {
    /// Create a markdown cell.
    pub fn markdown(index: usize, source: impl Into<String>) -> Self {
        Self {
            index,
            kind: CellKind::Markdown,
            source: source.into(),
            outputs: Vec::new(),
            metadata: Metadata::new(),
        }
    }

    /// Create a code cell with outputs.
    pub fn code(index: usize, source: impl Into<String>, outputs: Vec<Value>) -> Self {
        Self {
            index,
            kind: CellKind::Code,
            source: source.into(),
            outputs,
            metadata: Metadata::new(),
        }
    }
}

/// A notebook as returned by a reader: document metadata plus cells.
#[derive(Debug, Clone, Default)]
pub struct Notebook {
    /// Document-level metadata (kernel, language info, ...).
    pub metadata: Metadata,

    /// Renderable cells in document order.
    pub cells: Vec<RawCell>,
}

impl Notebook {
    /// Name of the notebook's programming language, if declared.
    pub fn language(&self) -> Option<&str> {
        self.metadata
            .get("language_info")
            .and_then(|info| info.get("name"))
            .or_else(|| {
                self.metadata
                    .get("kernelspec")
                    .and_then(|spec| spec.get("language"))
            })
            .and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> TableRow {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_cell_kind_from_cell_type() {
        assert_eq!(CellKind::from_cell_type("markdown"), Some(CellKind::Markdown));
        assert_eq!(CellKind::from_cell_type("code"), Some(CellKind::Code));
        assert_eq!(CellKind::from_cell_type("raw"), None);
    }

    #[test]
    fn test_empty_table_is_absent() {
        assert!(Table::from_rows(Vec::new()).is_none());
    }

    #[test]
    fn test_table_columns_follow_first_row() {
        let table = Table::from_rows(vec![
            row(json!({"b": 1, "a": 2})),
            row(json!({"a": 3, "c": 4})),
        ])
        .unwrap();

        assert_eq!(table.columns(), vec!["b", "a"]);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_table_serializes_as_row_list() {
        let table = Table::from_rows(vec![row(json!({"x": 1}))])
            .unwrap()
            .with_source_index(Some(4));
        let encoded = serde_json::to_value(&table).unwrap();
        assert_eq!(encoded, json!([{"x": 1}]));
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(None), "");
        assert_eq!(cell_text(Some(&Value::Null)), "");
        assert_eq!(cell_text(Some(&json!("abc"))), "abc");
        assert_eq!(cell_text(Some(&json!(1.5))), "1.5");
        assert_eq!(cell_text(Some(&json!(true))), "true");
    }

    #[test]
    fn test_notebook_language() {
        let mut notebook = Notebook::default();
        assert_eq!(notebook.language(), None);

        notebook
            .metadata
            .insert("kernelspec".into(), json!({"language": "julia"}));
        assert_eq!(notebook.language(), Some("julia"));

        notebook
            .metadata
            .insert("language_info".into(), json!({"name": "python"}));
        assert_eq!(notebook.language(), Some("python"));
    }
}
