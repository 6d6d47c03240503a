//! OOXML package (ZIP) writing shared by the deck and spreadsheet writers.

use jupdeck_core::{Error, Result};
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Content type of relationship parts.
pub const RELS_CONTENT_TYPE: &str = "application/vnd.openxmlformats-package.relationships+xml";

/// Builder for an OOXML package: parts plus `[Content_Types].xml`.
pub struct PackageWriter<W: Write + Seek> {
    zip_writer: ZipWriter<W>,
    defaults: Vec<(String, String)>,
    overrides: Vec<(String, String)>,
}

impl PackageWriter<BufWriter<File>> {
    /// Create a package writer targeting a new file at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::with_writer(BufWriter::new(file)))
    }
}

impl<W: Write + Seek> PackageWriter<W> {
    /// Create a package writer over any seekable writer.
    pub fn with_writer(writer: W) -> Self {
        Self {
            zip_writer: ZipWriter::new(writer),
            defaults: vec![
                ("rels".to_string(), RELS_CONTENT_TYPE.to_string()),
                ("xml".to_string(), "application/xml".to_string()),
            ],
            overrides: Vec::new(),
        }
    }

    /// Register a default content type for an extension.
    pub fn add_default(&mut self, extension: &str, content_type: &str) {
        if !self.defaults.iter().any(|(ext, _)| ext == extension) {
            self.defaults.push((extension.to_string(), content_type.to_string()));
        }
    }

    /// Add a part with an explicit content type override.
    pub fn add_part(&mut self, path: &str, content_type: &str, content: &[u8]) -> Result<()> {
        self.overrides.push((format!("/{}", path), content_type.to_string()));
        self.add_file(path, content)
    }

    /// Add a part whose content type comes from its extension default.
    pub fn add_file(&mut self, path: &str, content: &[u8]) -> Result<()> {
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        self.zip_writer
            .start_file(path, options)
            .map_err(|e| Error::ZipError(format!("Failed to start '{}': {}", path, e)))?;
        self.zip_writer.write_all(content)?;
        Ok(())
    }

    /// Write `[Content_Types].xml` and finish the archive.
    pub fn finish(mut self) -> Result<W> {
        let content_types = self.content_types_xml();
        self.add_file("[Content_Types].xml", content_types.as_bytes())?;

        let mut writer = self
            .zip_writer
            .finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish archive: {}", e)))?;
        writer.flush()?;
        Ok(writer)
    }

    fn content_types_xml(&self) -> String {
        let mut xml = String::with_capacity(1024);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        );
        for (extension, content_type) in &self.defaults {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                extension, content_type
            ));
        }
        for (part, content_type) in &self.overrides {
            xml.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                part, content_type
            ));
        }
        xml.push_str("</Types>");
        xml
    }
}

/// Build a relationships part from `(id, type, target)` triples.
pub fn relationships_xml(relationships: &[(String, &str, String)]) -> String {
    let mut xml = String::with_capacity(256 + relationships.len() * 160);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (id, rel_type, target) in relationships {
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
            id, rel_type, target
        ));
    }
    xml.push_str("</Relationships>");
    xml
}
