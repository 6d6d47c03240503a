//! The cell record: unified semantic content of one or more notebook cells.

use crate::error::{Error, Result};
use crate::types::{CellKind, ImageRef, Metadata, Table};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata key holding the `slide:` directive.
pub const SLIDE_DIRECTIVE: &str = "slide";

/// Metadata key holding the `notes:` directive.
pub const NOTES_DIRECTIVE: &str = "notes";

/// How a merge treats tables contributed by non-leading records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TablePolicy {
    /// Only the leading record's table survives; later tables are dropped.
    #[default]
    KeepBase,
    /// The first table present in the group survives.
    InheritFirst,
}

/// Semantic content of a cell, or of a slide group after merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    /// Markdown or code.
    #[serde(rename = "type")]
    pub kind: CellKind,

    /// Slide title, present only if a heading (or leading comment) was found.
    #[serde(default)]
    pub title: Option<String>,

    /// Bullet items in document order.
    #[serde(default)]
    pub bullets: Vec<String>,

    /// Prose paragraphs in document order.
    #[serde(default)]
    pub paragraphs: Vec<String>,

    /// Trimmed source text (code cells only).
    #[serde(default)]
    pub code: Option<String>,

    /// Images from rich display outputs.
    #[serde(default)]
    pub images: Vec<ImageRef>,

    /// Table mined from HTML output.
    #[serde(default)]
    pub table: Option<Table>,

    /// Execution outputs, kept verbatim for traceability.
    #[serde(default)]
    pub raw_outputs: Option<Vec<Value>>,

    /// Tags and directives.
    #[serde(default)]
    pub metadata: Metadata,

    /// Position of the originating cell in the document.
    #[serde(default)]
    pub source_index: Option<usize>,
}

impl CellRecord {
    /// Create an empty record of the given kind.
    pub fn new(kind: CellKind) -> Self {
        Self {
            kind,
            title: None,
            bullets: Vec::new(),
            paragraphs: Vec::new(),
            code: None,
            images: Vec::new(),
            table: None,
            raw_outputs: None,
            metadata: Metadata::new(),
            source_index: None,
        }
    }

    /// Set the source index.
    pub fn with_source_index(mut self, index: usize) -> Self {
        self.source_index = Some(index);
        self
    }

    /// Whether this record opens a new slide group.
    ///
    /// Titled markdown always does; a `slide: new` directive forces it.
    pub fn starts_slide(&self) -> bool {
        (self.kind == CellKind::Markdown && self.title.is_some())
            || self.slide_directive() == Some("new")
    }

    /// Whether a `slide: skip` directive excludes this record.
    pub fn is_skipped(&self) -> bool {
        self.slide_directive() == Some("skip")
    }

    /// Value of the `slide:` directive, if any.
    pub fn slide_directive(&self) -> Option<&str> {
        self.metadata.get(SLIDE_DIRECTIVE).and_then(Value::as_str)
    }

    /// Text of the `notes:` directive, if any.
    pub fn notes_directive(&self) -> Option<&str> {
        self.metadata.get(NOTES_DIRECTIVE).and_then(Value::as_str)
    }

    /// Merge trailing records into this one using the default table policy.
    pub fn merge(&self, others: &[CellRecord]) -> CellRecord {
        self.merge_with(others, TablePolicy::default())
    }

    /// Merge trailing records into this one.
    ///
    /// `title`, `code`, `kind` and `source_index` come from `self` only.
    /// Sequences are concatenated in order. Metadata is a shallow union in
    /// which earlier records win, except `notes` directives, which are
    /// joined in order with newlines. Tables follow `policy`.
    pub fn merge_with(&self, others: &[CellRecord], policy: TablePolicy) -> CellRecord {
        let mut merged = self.clone();

        for other in others {
            merged.bullets.extend(other.bullets.iter().cloned());
            merged.paragraphs.extend(other.paragraphs.iter().cloned());
            merged.images.extend(other.images.iter().cloned());

            if let Some(outputs) = &other.raw_outputs {
                merged
                    .raw_outputs
                    .get_or_insert_with(Vec::new)
                    .extend(outputs.iter().cloned());
            }

            for (key, value) in &other.metadata {
                if key == NOTES_DIRECTIVE {
                    continue;
                }
                if !merged.metadata.contains_key(key) {
                    merged.metadata.insert(key.clone(), value.clone());
                }
            }
            if let Some(note) = other.notes_directive() {
                let combined = match merged.notes_directive() {
                    Some(existing) => format!("{}\n{}", existing, note),
                    None => note.to_string(),
                };
                merged
                    .metadata
                    .insert(NOTES_DIRECTIVE.to_string(), Value::String(combined));
            }

            if policy == TablePolicy::InheritFirst && merged.table.is_none() {
                merged.table = other.table.clone();
            }
        }

        merged
    }

    /// Check the record invariants.
    ///
    /// Bullets and paragraphs must not contain empty strings and a present
    /// table must have rows. Records built by this crate always pass; records
    /// deserialized from external documents may not.
    pub fn validate(&self) -> Result<()> {
        let label = self
            .source_index
            .map(|i| format!("cell {}", i))
            .unwrap_or_else(|| "cell without index".to_string());

        if self.bullets.iter().any(|b| b.trim().is_empty()) {
            return Err(Error::InvalidRecord(format!("{}: empty bullet", label)));
        }
        if self.paragraphs.iter().any(|p| p.trim().is_empty()) {
            return Err(Error::InvalidRecord(format!("{}: empty paragraph", label)));
        }
        if matches!(&self.table, Some(table) if table.rows.is_empty()) {
            return Err(Error::InvalidRecord(format!(
                "{}: table present but has no rows",
                label
            )));
        }
        if let Some(image) = self.images.iter().find(|i| !i.mime_type.starts_with("image/")) {
            return Err(Error::InvalidRecord(format!(
                "{}: unsupported image type '{}'",
                label, image.mime_type
            )));
        }

        Ok(())
    }
}
