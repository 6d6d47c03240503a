//! DrawingML fragments for the regions a slide can hold.

use jupdeck_core::{Frame, TableGrid, TextBlock, TextStyle};
use quick_xml::escape::escape;

/// English Metric Units per inch.
pub const EMU_PER_INCH: f64 = 914_400.0;

const BODY_SIZE: u32 = 1600;
const CODE_SIZE: u32 = 1200;
const NOTICE_SIZE: u32 = 1200;
const TABLE_SIZE: u32 = 1000;
const CODE_FONT: &str = "Courier New";
const CODE_FILL: &str = "F2F2F2";
const NOTICE_COLOR: &str = "7F7F7F";
const BULLET_INDENT: i64 = 285_750;

/// Convert inches to EMU.
pub fn emu(inches: f64) -> i64 {
    (inches * EMU_PER_INCH).round() as i64
}

/// Escape text for element content, dropping characters XML 1.0 forbids.
pub fn escape_text(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|&c| c == '\t' || c == '\n' || c == '\r' || c >= ' ')
        .collect();
    escape(cleaned.as_str()).into_owned()
}

fn push_xfrm(xml: &mut String, frame: Frame, prefix: &str) {
    xml.push_str(&format!(
        r#"<{p}:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></{p}:xfrm>"#,
        emu(frame.left),
        emu(frame.top),
        emu(frame.width),
        emu(frame.height),
        p = prefix
    ));
}

/// Run properties for a text style.
fn run_properties(style: TextStyle) -> String {
    match style {
        TextStyle::Body | TextStyle::Bullets => {
            format!(r#"<a:rPr lang="en-US" sz="{}" dirty="0"/>"#, BODY_SIZE)
        }
        TextStyle::Code => format!(
            r#"<a:rPr lang="en-US" sz="{}" dirty="0"><a:latin typeface="{f}"/><a:cs typeface="{f}"/></a:rPr>"#,
            CODE_SIZE,
            f = CODE_FONT
        ),
        TextStyle::Notice => format!(
            r#"<a:rPr lang="en-US" sz="{}" i="1" dirty="0"><a:solidFill><a:srgbClr val="{}"/></a:solidFill></a:rPr>"#,
            NOTICE_SIZE, NOTICE_COLOR
        ),
    }
}

fn push_paragraph(xml: &mut String, style: TextStyle, text: &str) {
    xml.push_str("<a:p>");
    if style == TextStyle::Bullets {
        xml.push_str(&format!(
            r#"<a:pPr marL="{}" indent="-{}"><a:buFont typeface="Arial"/><a:buChar char="•"/></a:pPr>"#,
            BULLET_INDENT, BULLET_INDENT
        ));
    }
    if text.is_empty() {
        xml.push_str(r#"<a:endParaRPr lang="en-US" dirty="0"/>"#);
    } else {
        xml.push_str("<a:r>");
        xml.push_str(&run_properties(style));
        xml.push_str(&format!("<a:t>{}</a:t>", escape_text(text)));
        xml.push_str("</a:r>");
    }
    xml.push_str("</a:p>");
}

/// A text box holding one paragraph per entry of `block`.
pub fn text_box_xml(xml: &mut String, shape_id: u32, frame: Frame, block: &TextBlock) {
    let name = match block.style {
        TextStyle::Body => "Text",
        TextStyle::Bullets => "Bullets",
        TextStyle::Code => "Code",
        TextStyle::Notice => "Notice",
    };

    xml.push_str("<p:sp><p:nvSpPr>");
    xml.push_str(&format!(
        r#"<p:cNvPr id="{}" name="{} {}"/>"#,
        shape_id, name, shape_id
    ));
    xml.push_str(r#"<p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr>"#);
    push_xfrm(xml, frame, "a");
    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>"#);
    if block.style == TextStyle::Code {
        xml.push_str(&format!(
            r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#,
            CODE_FILL
        ));
    } else {
        xml.push_str("<a:noFill/>");
    }
    xml.push_str("</p:spPr><p:txBody>");
    xml.push_str(r#"<a:bodyPr wrap="square" rtlCol="0"><a:normAutofit/></a:bodyPr><a:lstStyle/>"#);

    if block.paragraphs.is_empty() {
        push_paragraph(xml, block.style, "");
    }
    for paragraph in &block.paragraphs {
        push_paragraph(xml, block.style, paragraph);
    }
    xml.push_str("</p:txBody></p:sp>");
}

/// The slide title, filling the layout's title placeholder.
pub fn title_xml(xml: &mut String, shape_id: u32, title: &str) {
    xml.push_str("<p:sp><p:nvSpPr>");
    xml.push_str(&format!(
        r#"<p:cNvPr id="{}" name="Title {}"/>"#,
        shape_id, shape_id
    ));
    xml.push_str(r#"<p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="title"/></p:nvPr>"#);
    xml.push_str("</p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p>");
    if title.is_empty() {
        xml.push_str(r#"<a:endParaRPr lang="en-US" dirty="0"/>"#);
    } else {
        xml.push_str(&format!(
            r#"<a:r><a:rPr lang="en-US" dirty="0"/><a:t>{}</a:t></a:r>"#,
            escape_text(title)
        ));
    }
    xml.push_str("</a:p></p:txBody></p:sp>");
}

/// A picture referencing media through `rel_id`.
pub fn picture_xml(xml: &mut String, shape_id: u32, frame: Frame, rel_id: &str) {
    xml.push_str("<p:pic><p:nvPicPr>");
    xml.push_str(&format!(
        r#"<p:cNvPr id="{}" name="Picture {}" descr="Cell output"/>"#,
        shape_id, shape_id
    ));
    xml.push_str(r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>"#);
    xml.push_str(&format!(
        r#"<p:blipFill><a:blip r:embed="{}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>"#,
        rel_id
    ));
    xml.push_str("<p:spPr>");
    push_xfrm(xml, frame, "a");
    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#);
}

fn push_cell(xml: &mut String, text: &str, bold: bool) {
    xml.push_str("<a:tc><a:txBody><a:bodyPr/><a:lstStyle/><a:p>");
    if text.is_empty() {
        xml.push_str(&format!(r#"<a:endParaRPr lang="en-US" sz="{}"/>"#, TABLE_SIZE));
    } else {
        xml.push_str(&format!(
            r#"<a:r><a:rPr lang="en-US" sz="{}"{} dirty="0"/><a:t>{}</a:t></a:r>"#,
            TABLE_SIZE,
            if bold { r#" b="1""# } else { "" },
            escape_text(text)
        ));
    }
    xml.push_str("</a:p></a:txBody><a:tcPr/></a:tc>");
}

/// A graphic-frame table: a bold header row, then the grid's rows.
pub fn table_xml(xml: &mut String, shape_id: u32, frame: Frame, grid: &TableGrid) {
    let column_count = grid.columns.len().max(1) as i64;
    let row_count = grid.rows.len() as i64 + 1;
    let column_width = emu(frame.width) / column_count;
    let row_height = emu(frame.height) / row_count;

    xml.push_str("<p:graphicFrame><p:nvGraphicFramePr>");
    xml.push_str(&format!(
        r#"<p:cNvPr id="{}" name="Table {}"/>"#,
        shape_id, shape_id
    ));
    xml.push_str(r#"<p:cNvGraphicFramePr><a:graphicFrameLocks noGrp="1"/></p:cNvGraphicFramePr><p:nvPr/>"#);
    xml.push_str("</p:nvGraphicFramePr>");
    push_xfrm(xml, frame, "p");
    xml.push_str(r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table">"#);
    xml.push_str(r#"<a:tbl><a:tblPr firstRow="1" bandRow="1"/><a:tblGrid>"#);
    for _ in 0..column_count {
        xml.push_str(&format!(r#"<a:gridCol w="{}"/>"#, column_width));
    }
    xml.push_str("</a:tblGrid>");

    xml.push_str(&format!(r#"<a:tr h="{}">"#, row_height));
    for column in &grid.columns {
        push_cell(xml, column, true);
    }
    xml.push_str("</a:tr>");

    for row in &grid.rows {
        xml.push_str(&format!(r#"<a:tr h="{}">"#, row_height));
        for cell in row {
            push_cell(xml, cell, false);
        }
        xml.push_str("</a:tr>");
    }
    xml.push_str("</a:tbl></a:graphicData></a:graphic></p:graphicFrame>");
}
