//! Single-sheet XLSX writer for tables that overflow a slide.

use crate::package::{relationships_xml, PackageWriter};
use crate::shapes::escape_text;
use crate::template::REL_OFFICE_DOCUMENT;
use jupdeck_core::types::cell_text;
use jupdeck_core::{Result, TableRow, TableWriter};
use serde_json::Value;
use std::io::{Seek, Write};
use std::path::Path;

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const CT_WORKBOOK: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const CT_WORKSHEET: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
const CT_STYLES: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

const STYLES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    r#"<fonts count="2"><font><sz val="11"/><name val="Calibri"/></font>"#,
    r#"<font><b/><sz val="11"/><name val="Calibri"/></font></fonts>"#,
    r#"<fills count="2"><fill><patternFill patternType="none"/></fill>"#,
    r#"<fill><patternFill patternType="gray125"/></fill></fills>"#,
    r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#,
    r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
    r#"<cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#,
    r#"<xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/></cellXfs>"#,
    r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
    r#"</styleSheet>"#
);

/// Writes a table to a one-sheet workbook: a bold header row of column
/// names, then one row per table row in column order.
#[derive(Debug, Clone)]
pub struct XlsxTableWriter {
    sheet_name: String,
}

impl Default for XlsxTableWriter {
    fn default() -> Self {
        Self {
            sheet_name: "Table".to_string(),
        }
    }
}

impl XlsxTableWriter {
    /// Create a writer with the default sheet name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worksheet name.
    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }

    /// Write the workbook package to any seekable writer.
    pub fn write_to<W: Write + Seek>(
        &self,
        writer: W,
        columns: &[String],
        rows: &[TableRow],
    ) -> Result<W> {
        let mut package = PackageWriter::with_writer(writer);

        package.add_file(
            "_rels/.rels",
            relationships_xml(&[("rId1".to_string(), REL_OFFICE_DOCUMENT, "xl/workbook.xml".to_string())])
                .as_bytes(),
        )?;
        package.add_part("xl/workbook.xml", CT_WORKBOOK, self.workbook_xml().as_bytes())?;
        package.add_file(
            "xl/_rels/workbook.xml.rels",
            relationships_xml(&[
                ("rId1".to_string(), REL_WORKSHEET, "worksheets/sheet1.xml".to_string()),
                ("rId2".to_string(), REL_STYLES, "styles.xml".to_string()),
            ])
            .as_bytes(),
        )?;
        package.add_part("xl/styles.xml", CT_STYLES, STYLES_XML.as_bytes())?;
        package.add_part(
            "xl/worksheets/sheet1.xml",
            CT_WORKSHEET,
            sheet_xml(columns, rows).as_bytes(),
        )?;

        package.finish()
    }

    fn workbook_xml(&self) -> String {
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<workbook xmlns="{}" xmlns:r="{}">"#,
                r#"<sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#
            ),
            NS_MAIN,
            crate::template::NS_R,
            escape_text(&self.sheet_name)
        )
    }
}

impl TableWriter for XlsxTableWriter {
    fn write_table(&self, path: &Path, columns: &[String], rows: &[TableRow]) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_to(std::io::BufWriter::new(file), columns, rows)?;
        log::debug!("Wrote {} rows to {}", rows.len(), path.display());
        Ok(())
    }
}

/// Spreadsheet column letters: 0 is `A`, 26 is `AA`.
pub fn column_letter(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

fn inline_string(reference: &str, text: &str, style: Option<u32>) -> String {
    let style = style.map(|s| format!(r#" s="{}""#, s)).unwrap_or_default();
    let space = if text.trim() != text {
        r#" xml:space="preserve""#
    } else {
        ""
    };
    format!(
        r#"<c r="{}" t="inlineStr"{}><is><t{}>{}</t></is></c>"#,
        reference,
        style,
        space,
        escape_text(text)
    )
}

fn cell_xml(reference: &str, value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => Some(format!(r#"<c r="{}"><v>{}</v></c>"#, reference, n)),
        Some(Value::Bool(b)) => Some(format!(
            r#"<c r="{}" t="b"><v>{}</v></c>"#,
            reference,
            u8::from(*b)
        )),
        other => Some(inline_string(reference, &cell_text(other), None)),
    }
}

fn sheet_xml(columns: &[String], rows: &[TableRow]) -> String {
    let mut xml = String::with_capacity(512 + rows.len() * columns.len() * 48);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(&format!(r#"<worksheet xmlns="{}"><sheetData>"#, NS_MAIN));

    let letters: Vec<String> = (0..columns.len()).map(column_letter).collect();

    xml.push_str(r#"<row r="1">"#);
    for (letter, column) in letters.iter().zip(columns) {
        xml.push_str(&inline_string(&format!("{}1", letter), column, Some(1)));
    }
    xml.push_str("</row>");

    for (i, row) in rows.iter().enumerate() {
        let number = i + 2;
        xml.push_str(&format!(r#"<row r="{}">"#, number));
        for (letter, column) in letters.iter().zip(columns) {
            if let Some(cell) = cell_xml(&format!("{}{}", letter, number), row.get(column)) {
                xml.push_str(&cell);
            }
        }
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}
