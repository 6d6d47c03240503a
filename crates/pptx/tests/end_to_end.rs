//! Notebook in, deck and side files out, read back from disk.

use jupdeck_core::{
    CellExtractor, ConversionSummary, Converter, GroupingEngine, SlideRenderer, TablePolicy,
};
use jupdeck_ipynb::{Document, HtmlTableParser, NotebookReader};
use jupdeck_pptx::{DeckInspector, PptxDeck, SlideSummary, XlsxTableWriter};
use serde_json::{json, Value};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

const PIXEL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

fn markdown(source: &str) -> Value {
    json!({"cell_type": "markdown", "metadata": {}, "source": source})
}

fn code(source: &str, outputs: Value) -> Value {
    json!({"cell_type": "code", "metadata": {}, "execution_count": 1, "source": source, "outputs": outputs})
}

fn html_table(rows: usize) -> String {
    let mut html = String::from(
        "<table border=\"1\" class=\"dataframe\"><thead><tr><th></th><th>x</th><th>y</th></tr></thead><tbody>",
    );
    for i in 0..rows {
        html.push_str(&format!("<tr><th>{}</th><td>{}</td><td>v{}</td></tr>", i, i * 2, i));
    }
    html.push_str("</tbody></table>");
    html
}

fn table_output(rows: usize) -> Value {
    json!([{
        "output_type": "execute_result",
        "execution_count": 1,
        "metadata": {},
        "data": {"text/plain": "DataFrame", "text/html": html_table(rows)}
    }])
}

fn write_notebook(dir: &Path, cells: Value) -> std::path::PathBuf {
    let path = dir.join("input.ipynb");
    let notebook = json!({
        "nbformat": 4,
        "nbformat_minor": 5,
        "metadata": {"kernelspec": {"language": "python", "name": "python3"}},
        "cells": cells
    });
    std::fs::write(&path, notebook.to_string()).unwrap();
    path
}

fn convert_with(
    dir: &Path,
    deck_name: &str,
    cells: Value,
    grouping: GroupingEngine,
    renderer: SlideRenderer,
) -> (ConversionSummary, Vec<SlideSummary>) {
    let input = write_notebook(dir, cells);
    let Document::Notebook(notebook) = NotebookReader::new().load(&input).unwrap() else {
        panic!("expected a notebook");
    };

    let parser = HtmlTableParser::new();
    let records = CellExtractor::for_notebook(&notebook, &parser).extract_all(&notebook.cells);

    let writer = XlsxTableWriter::new();
    let mut deck = PptxDeck::from_layout(renderer.layout());
    let deck_path = dir.join(deck_name);
    let summary = Converter::new(&writer)
        .with_grouping(grouping)
        .with_renderer(renderer)
        .convert(&records, &mut deck, &deck_path)
        .unwrap();

    let slides = DeckInspector::new().inspect_file(&deck_path).unwrap();
    (summary, slides)
}

fn convert(dir: &Path, cells: Value) -> (ConversionSummary, Vec<SlideSummary>) {
    convert_with(dir, "deck.pptx", cells, GroupingEngine::new(), SlideRenderer::new())
}

fn read_entries(path: &Path) -> Vec<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).unwrap();
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).unwrap();
        entries.push((file.name().to_string(), bytes));
    }
    entries.sort();
    entries
}

#[test]
fn single_markdown_cell_makes_one_slide() {
    let dir = tempfile::tempdir().unwrap();
    let (summary, slides) = convert(
        dir.path(),
        json!([markdown("# Slide Title\n\nThis is a paragraph.")]),
    );

    assert_eq!(summary.slide_count, 1);
    assert_eq!(slides.len(), 1);
    assert_eq!(slides[0].title, "Slide Title");
    assert_eq!(slides[0].texts, vec!["This is a paragraph."]);
    assert_eq!(slides[0].notes.as_deref(), Some("This is a paragraph."));
}

#[test]
fn bullet_list_becomes_one_bullet_region() {
    let dir = tempfile::tempdir().unwrap();
    let (_, slides) = convert(dir.path(), json!([markdown("# Key Findings\n\n- A\n- B\n- C")]));

    assert_eq!(slides[0].title, "Key Findings");
    assert_eq!(slides[0].texts, vec!["A\nB\nC"]);
    assert!(slides[0].notes.is_none());
}

#[test]
fn intro_with_large_table_overflows_to_side_file() {
    let dir = tempfile::tempdir().unwrap();
    let (summary, slides) = convert_with(
        dir.path(),
        "deck.pptx",
        json!([markdown("# Intro"), code("df", table_output(20))]),
        GroupingEngine::new().with_table_policy(TablePolicy::InheritFirst),
        SlideRenderer::new(),
    );

    assert_eq!(slides.len(), 1);
    assert_eq!(slides[0].title, "Intro");
    assert_eq!(slides[0].tables, vec![11]);
    assert_eq!(
        slides[0].texts,
        vec!["Table truncated to 10 of 20 rows, see cell_1_table_1.xlsx"]
    );

    let side_file = dir.path().join("cell_1_table_1.xlsx");
    assert_eq!(summary.overflow_files, vec![side_file.clone()]);

    let entries = read_entries(&side_file);
    let (_, sheet) = entries
        .iter()
        .find(|(name, _)| name == "xl/worksheets/sheet1.xml")
        .unwrap();
    let sheet = String::from_utf8(sheet.clone()).unwrap();
    assert_eq!(sheet.matches("<row ").count(), 21);
    assert!(sheet.contains("<t>v19</t>"));
}

#[test]
fn later_table_is_dropped_under_default_policy() {
    let dir = tempfile::tempdir().unwrap();
    let (summary, slides) = convert(
        dir.path(),
        json!([markdown("# Intro"), code("df", table_output(20))]),
    );

    assert_eq!(slides.len(), 1);
    assert!(slides[0].tables.is_empty());
    assert!(summary.overflow_files.is_empty());
}

#[test]
fn table_row_limit_boundary() {
    let dir = tempfile::tempdir().unwrap();

    let (fits, slides) = convert(dir.path(), json!([code("df", table_output(10))]));
    assert!(fits.overflow_files.is_empty());
    assert_eq!(slides[0].tables, vec![11]);
    assert_eq!(slides[0].texts, vec!["df"]);

    let (overflows, slides) = convert(dir.path(), json!([code("df", table_output(11))]));
    assert_eq!(overflows.overflow_files, vec![dir.path().join("cell_0_table_1.xlsx")]);
    assert_eq!(slides[0].tables, vec![11]);
    assert!(slides[0].texts[1].starts_with("Table truncated to 10 of 11 rows"));
}

#[test]
fn speaker_notes_toggle_only_changes_notes() {
    let dir = tempfile::tempdir().unwrap();
    let cells = json!([
        markdown("# One\n\nFirst point.\n\nSecond point."),
        markdown("# Two\n\n- a\n- b"),
    ]);

    convert_with(
        dir.path(),
        "with_notes.pptx",
        cells.clone(),
        GroupingEngine::new(),
        SlideRenderer::new(),
    );
    convert_with(
        dir.path(),
        "without_notes.pptx",
        cells,
        GroupingEngine::new(),
        SlideRenderer::new().with_speaker_notes(false),
    );

    let with_notes = read_entries(&dir.path().join("with_notes.pptx"));
    let without_notes = read_entries(&dir.path().join("without_notes.pptx"));

    let slide_parts = |entries: &[(String, Vec<u8>)]| -> Vec<(String, Vec<u8>)> {
        entries
            .iter()
            .filter(|(name, _)| name.starts_with("ppt/slides/slide"))
            .cloned()
            .collect()
    };
    assert_eq!(slide_parts(&with_notes), slide_parts(&without_notes));
    assert_eq!(slide_parts(&with_notes).len(), 2);

    let has_notes_part = |entries: &[(String, Vec<u8>)]| {
        entries.iter().any(|(name, _)| name.starts_with("ppt/notesSlides/"))
    };
    assert!(has_notes_part(&with_notes));
    assert!(!has_notes_part(&without_notes));
}

#[test]
fn code_outputs_and_comment_titles() {
    let dir = tempfile::tempdir().unwrap();
    let outputs = json!([
        {"output_type": "stream", "name": "stdout", "text": "plotting\n"},
        {"output_type": "display_data", "metadata": {}, "data": {"image/png": PIXEL_PNG, "text/plain": "<Figure>"}}
    ]);
    let (_, slides) = convert(
        dir.path(),
        json!([code("# Revenue Plot:\nplot(df)", outputs)]),
    );

    assert_eq!(slides.len(), 1);
    assert_eq!(slides[0].title, "Revenue Plot");
    assert_eq!(slides[0].pictures, 1);
    assert_eq!(slides[0].texts, vec!["# Revenue Plot:\nplot(df)"]);
}

#[test]
fn directives_split_skip_and_annotate() {
    let dir = tempfile::tempdir().unwrap();
    let (summary, slides) = convert(
        dir.path(),
        json!([
            markdown("# Start\n\nLead."),
            markdown("<!-- slide: skip -->\nHidden."),
            markdown("<!-- slide: new -->\n<!-- notes: Say hello -->\nFresh start."),
        ]),
    );

    assert_eq!(summary.slide_count, 2);
    assert_eq!(slides[0].texts, vec!["Lead."]);
    assert_eq!(slides[1].title, "");
    assert_eq!(slides[1].texts, vec!["Fresh start."]);
    assert_eq!(slides[1].notes.as_deref(), Some("Fresh start.\nSay hello"));
}
