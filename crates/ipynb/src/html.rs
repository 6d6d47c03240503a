//! HTML table mining for rich cell outputs (e.g. rendered DataFrames).
//!
//! Output markup is untrusted and often not well-formed XML, so the reader
//! runs in lenient mode and any hard error simply yields no table.

use jupdeck_core::{TableParser, TableRow};
use quick_xml::events::{BytesText, Event};
use quick_xml::Reader;
use serde_json::{Number, Value};

/// Reads the first `<table>` of an HTML fragment into column-named rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlTableParser;

impl HtmlTableParser {
    /// Create a new parser.
    pub fn new() -> Self {
        Self
    }
}

impl TableParser for HtmlTableParser {
    fn parse_first_table(&self, markup: &str) -> Option<Vec<TableRow>> {
        let start = markup.to_ascii_lowercase().find("<table")?;
        let raw_rows = match read_rows(&markup[start..]) {
            Ok(rows) => rows,
            Err(e) => {
                log::debug!("Could not read HTML table: {}", e);
                return None;
            }
        };

        let rows = build_rows(raw_rows);
        if rows.is_empty() {
            None
        } else {
            Some(rows)
        }
    }
}

/// A `<tr>` as read from the markup.
#[derive(Debug, Default)]
struct RawRow {
    cells: Vec<String>,
    header_cells: usize,
    in_thead: bool,
}

impl RawRow {
    fn is_header(&self) -> bool {
        !self.cells.is_empty() && (self.in_thead || self.header_cells == self.cells.len())
    }
}

/// Read the rows of the outermost table starting at the beginning of `fragment`.
fn read_rows(fragment: &str) -> Result<Vec<RawRow>, quick_xml::Error> {
    let mut reader = Reader::from_str(fragment);
    reader.trim_text(true);
    reader.check_end_names(false);

    let mut rows = Vec::new();
    let mut table_depth = 0usize;
    let mut in_thead = false;
    let mut row: Option<RawRow> = None;
    let mut cell: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_ascii_lowercase();
                match name.as_slice() {
                    b"table" => table_depth += 1,
                    _ if table_depth != 1 => {}
                    b"thead" => in_thead = true,
                    b"tr" => {
                        // `</tr>` is optional in HTML.
                        flush_cell(&mut cell, &mut row);
                        if let Some(open) = row.replace(RawRow {
                            in_thead,
                            ..Default::default()
                        }) {
                            rows.push(open);
                        }
                    }
                    b"th" | b"td" => {
                        // So is `</td>`.
                        flush_cell(&mut cell, &mut row);
                        if let Some(r) = row.as_mut() {
                            if name.as_slice() == b"th" {
                                r.header_cells += 1;
                            }
                            cell = Some(String::new());
                        }
                    }
                    _ => {}
                }
            }
            Event::Empty(e) if table_depth == 1 => {
                let name = e.local_name().as_ref().to_ascii_lowercase();
                if let (b"th" | b"td", Some(r)) = (name.as_slice(), row.as_mut()) {
                    if name.as_slice() == b"th" {
                        r.header_cells += 1;
                    }
                    r.cells.push(String::new());
                }
            }
            Event::Text(text) if table_depth == 1 => {
                if let Some(c) = cell.as_mut() {
                    if !c.is_empty() {
                        c.push(' ');
                    }
                    c.push_str(&text_content(&text));
                }
            }
            Event::End(e) => {
                let name = e.local_name().as_ref().to_ascii_lowercase();
                match name.as_slice() {
                    b"table" => {
                        if table_depth == 1 {
                            flush_cell(&mut cell, &mut row);
                        }
                        table_depth = table_depth.saturating_sub(1);
                        if table_depth == 0 {
                            break;
                        }
                    }
                    _ if table_depth != 1 => {}
                    b"thead" => in_thead = false,
                    b"th" | b"td" => flush_cell(&mut cell, &mut row),
                    b"tr" => {
                        flush_cell(&mut cell, &mut row);
                        if let Some(r) = row.take() {
                            rows.push(r);
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    flush_cell(&mut cell, &mut row);
    if let Some(r) = row.take() {
        rows.push(r);
    }
    Ok(rows)
}

/// Close the open cell, if any, into the open row.
fn flush_cell(cell: &mut Option<String>, row: &mut Option<RawRow>) {
    if let (Some(text), Some(r)) = (cell.take(), row.as_mut()) {
        r.cells.push(collapse_whitespace(&text));
    }
}

/// Turn raw rows into column-named rows using the first header row.
fn build_rows(raw_rows: Vec<RawRow>) -> Vec<TableRow> {
    let mut header: Option<Vec<String>> = None;
    let mut body = Vec::new();

    for row in raw_rows {
        if row.cells.is_empty() {
            continue;
        }
        if row.is_header() && body.is_empty() {
            if header.is_none() {
                header = Some(row.cells);
            }
            continue;
        }
        body.push(row.cells);
    }

    let width = body.iter().map(Vec::len).max().unwrap_or(0);
    let columns = column_names(header, width);

    body.into_iter()
        .map(|cells| {
            cells
                .into_iter()
                .enumerate()
                .map(|(i, text)| (columns[i].clone(), coerce_value(&text)))
                .collect()
        })
        .collect()
}

/// Column names for `width` columns, filling gaps and disambiguating repeats.
fn column_names(header: Option<Vec<String>>, width: usize) -> Vec<String> {
    let Some(header) = header else {
        return (0..width).map(|i| i.to_string()).collect();
    };

    let mut names: Vec<String> = Vec::with_capacity(width.max(header.len()));
    for i in 0..width.max(header.len()) {
        let base = match header.get(i) {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("Unnamed: {}", i),
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while names.contains(&candidate) {
            candidate = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        names.push(candidate);
    }
    names
}

/// Interpret cell text as an integer, a float, or a string; empty is null.
fn coerce_value(text: &str) -> Value {
    if text.is_empty() {
        return Value::Null;
    }
    if let Ok(n) = text.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Some(n) = text.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(n);
    }
    Value::String(text.to_string())
}

/// Unescaped text, tolerating HTML-only entities.
fn text_content(text: &BytesText) -> String {
    match text.unescape() {
        Ok(s) => s.into_owned(),
        Err(_) => String::from_utf8_lossy(text)
            .replace("&nbsp;", " ")
            .replace("&amp;", "&"),
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DATAFRAME_HTML: &str = r#"<div>
<style scoped>
    .dataframe tbody tr th:only-of-type {
        vertical-align: middle;
    }
</style>
<table border="1" class="dataframe">
  <thead>
    <tr style="text-align: right;">
      <th></th>
      <th>name</th>
      <th>score</th>
    </tr>
  </thead>
  <tbody>
    <tr>
      <th>0</th>
      <td>alice</td>
      <td>1.5</td>
    </tr>
    <tr>
      <th>1</th>
      <td>bob</td>
      <td>NaN</td>
    </tr>
  </tbody>
</table>
<p>2 rows × 2 columns</p>
</div>"#;

    #[test]
    fn test_dataframe_table() {
        let rows = HtmlTableParser::new().parse_first_table(DATAFRAME_HTML).unwrap();

        assert_eq!(rows.len(), 2);
        let columns: Vec<&String> = rows[0].keys().collect();
        assert_eq!(columns, vec!["Unnamed: 0", "name", "score"]);
        assert_eq!(rows[0]["Unnamed: 0"], json!(0));
        assert_eq!(rows[0]["name"], json!("alice"));
        assert_eq!(rows[0]["score"], json!(1.5));
        assert_eq!(rows[1]["score"], json!("NaN"));
    }

    #[test]
    fn test_table_without_header() {
        let html = "<table><tr><td>a</td><td>2</td></tr><tr><td>b</td><td></td></tr></table>";
        let rows = HtmlTableParser::new().parse_first_table(html).unwrap();

        assert_eq!(rows[0]["0"], json!("a"));
        assert_eq!(rows[0]["1"], json!(2));
        assert_eq!(rows[1]["1"], Value::Null);
    }

    #[test]
    fn test_first_table_only() {
        let html = "<table><tr><th>x</th></tr><tr><td>1</td></tr></table>\
                    <table><tr><th>y</th></tr><tr><td>2</td></tr></table>";
        let rows = HtmlTableParser::new().parse_first_table(html).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["x"], json!(1));
    }

    #[test]
    fn test_unclosed_cells_keep_every_value() {
        let html = "<table><tr><th>a<th>b<tr><td>1<td>x</table>";
        let rows = HtmlTableParser::new().parse_first_table(html).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["a"], json!(1));
        assert_eq!(rows[0]["b"], json!("x"));
    }

    #[test]
    fn test_nested_table_is_ignored() {
        let html = "<table><tr><th>outer</th></tr>\
                    <tr><td>v<table><tr><td>inner</td></tr></table></td></tr></table>";
        let rows = HtmlTableParser::new().parse_first_table(html).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["outer"], json!("v"));
    }

    #[test]
    fn test_duplicate_and_missing_headers() {
        let html = "<table><tr><th>a</th><th>a</th></tr><tr><td>1</td><td>2</td><td>3</td></tr></table>";
        let rows = HtmlTableParser::new().parse_first_table(html).unwrap();
        let columns: Vec<&String> = rows[0].keys().collect();

        assert_eq!(columns, vec!["a", "a.1", "Unnamed: 2"]);
    }

    #[test]
    fn test_entities_and_line_breaks() {
        let html = "<table><tr><th>k</th></tr><tr><td>a &amp; b<br>c&nbsp;d</td></tr></table>";
        let rows = HtmlTableParser::new().parse_first_table(html).unwrap();
        let text = rows[0]["k"].as_str().unwrap();

        assert!(text.starts_with("a & b"));
        assert!(text.contains('c'));
    }

    #[test]
    fn test_header_only_table_is_absent() {
        let html = "<table><thead><tr><th>a</th></tr></thead></table>";
        assert!(HtmlTableParser::new().parse_first_table(html).is_none());
    }

    #[test]
    fn test_no_table() {
        assert!(HtmlTableParser::new().parse_first_table("<p>hello</p>").is_none());
    }

    #[test]
    fn test_malformed_markup_is_swallowed() {
        let html = "<table><tr><td>1</td></tr><tr><td <<< broken";
        let result = HtmlTableParser::new().parse_first_table(html);
        if let Some(rows) = result {
            assert_eq!(rows[0]["0"], json!(1));
        }
    }

    #[test]
    fn test_coerce_value() {
        assert_eq!(coerce_value(""), Value::Null);
        assert_eq!(coerce_value("42"), json!(42));
        assert_eq!(coerce_value("-0.25"), json!(-0.25));
        assert_eq!(coerce_value("inf"), json!("inf"));
        assert_eq!(coerce_value("1,234"), json!("1,234"));
    }
}
