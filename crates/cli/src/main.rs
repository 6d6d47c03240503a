//! CLI tool for turning Jupyter notebooks into slide decks.

use anyhow::{Context, Result};
use clap::Parser;
use jupdeck_core::{
    CellExtractor, CellRecord, Converter, GroupingEngine, SlideRenderer, TablePolicy,
};
use jupdeck_ipynb::{Document, HtmlTableParser, NotebookReader};
use jupdeck_pptx::{DeckInspector, PptxDeck, XlsxTableWriter};
use std::path::{Path, PathBuf};

/// Convert a notebook (or a cell-record document) into a PowerPoint deck.
#[derive(Parser, Debug)]
#[command(name = "jupdeck")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input notebook (.ipynb) or cell-record document (.json)
    input: PathBuf,

    /// Output deck (.pptx); overflow tables are written next to it
    output: PathBuf,

    /// Do not attach presenter notes
    #[arg(long)]
    no_speaker_notes: bool,

    /// Let a slide without a table take the first table of its later cells
    #[arg(long)]
    inherit_tables: bool,

    /// Print the grouped slide records as JSON
    #[arg(long)]
    print_records: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let records = load_records(&args.input)?;
    log::info!("Loaded {} cell records from {}", records.len(), args.input.display());

    let table_policy = if args.inherit_tables {
        TablePolicy::InheritFirst
    } else {
        TablePolicy::KeepBase
    };
    let renderer = SlideRenderer::new().with_speaker_notes(!args.no_speaker_notes);
    let mut deck = PptxDeck::from_layout(renderer.layout());

    let grouping = GroupingEngine::new().with_table_policy(table_policy);
    log::debug!(
        "Table policy: {:?}, speaker notes: {}",
        grouping.table_policy(),
        renderer.speaker_notes()
    );

    let writer = XlsxTableWriter::new();
    let converter = Converter::new(&writer)
        .with_grouping(grouping)
        .with_renderer(renderer);

    if args.print_records {
        println!("{}", slides_json(&converter, &records)?);
    }

    ensure_parent_dir(&args.output)?;
    let summary = converter
        .convert(&records, &mut deck, &args.output)
        .with_context(|| format!("Failed to generate {}", args.output.display()))?;

    println!("Report generated: {}", summary.deck_path.display());
    for path in &summary.overflow_files {
        println!("Overflow table written: {}", path.display());
    }

    if args.verbose {
        describe_deck(&summary.deck_path)?;
    }

    Ok(())
}

/// Read the input and turn it into cell records.
fn load_records(input: &Path) -> Result<Vec<CellRecord>> {
    let document = NotebookReader::new()
        .load(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let records = match document {
        Document::Notebook(notebook) => {
            log::debug!(
                "Notebook language: {}",
                notebook.language().unwrap_or("unknown")
            );
            let parser = HtmlTableParser::new();
            CellExtractor::for_notebook(&notebook, &parser).extract_all(&notebook.cells)
        }
        Document::Records(document) => document.cells,
    };

    Ok(records)
}

/// Group valid records into slides and serialize them.
fn slides_json(converter: &Converter, records: &[CellRecord]) -> Result<String> {
    for (i, record) in records.iter().enumerate() {
        record
            .validate()
            .with_context(|| format!("Invalid cell record {}", i))?;
    }
    let slides = converter.group(records);
    serde_json::to_string_pretty(&slides).context("Failed to serialize records")
}

/// Create the directory the deck (and its side files) will live in.
fn ensure_parent_dir(output: &Path) -> Result<()> {
    if let Some(dir) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
    }
    Ok(())
}

/// Print what each slide of the written deck holds.
fn describe_deck(path: &Path) -> Result<()> {
    let slides = DeckInspector::new()
        .inspect_file(path)
        .with_context(|| format!("Failed to read back {}", path.display()))?;

    for slide in &slides {
        eprintln!(
            "  Slide {}: \"{}\" ({} text regions, {} pictures, {} tables{})",
            slide.number,
            slide.title,
            slide.texts.len(),
            slide.pictures,
            slide.tables.len(),
            if slide.notes.is_some() { ", notes" } else { "" }
        );
    }
    Ok(())
}
