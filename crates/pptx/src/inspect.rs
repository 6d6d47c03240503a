//! Reads a written deck back into per-slide summaries.
//!
//! Used to check what a conversion produced (and by `--verbose` runs of the
//! CLI) without opening PowerPoint.

use jupdeck_core::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// What one slide of a deck holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlideSummary {
    /// 1-based slide number.
    pub number: usize,
    /// Title placeholder text.
    pub title: String,
    /// Text of every other text shape, top to bottom then left to right.
    pub texts: Vec<String>,
    /// Number of pictures.
    pub pictures: usize,
    /// Row count (header included) of each table, in drawing order.
    pub tables: Vec<usize>,
    /// Notes page text.
    pub notes: Option<String>,
}

/// Reader for decks written by [`crate::PptxDeck`] (or any PPTX).
#[derive(Debug, Clone, Copy, Default)]
pub struct DeckInspector;

impl DeckInspector {
    /// Create a new inspector.
    pub fn new() -> Self {
        Self
    }

    /// Summarize the deck at `path`.
    pub fn inspect_file(&self, path: &Path) -> Result<Vec<SlideSummary>> {
        let file = File::open(path)?;
        self.inspect(BufReader::new(file))
    }

    /// Summarize a deck from a reader.
    pub fn inspect<R: Read + Seek>(&self, reader: R) -> Result<Vec<SlideSummary>> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let slide_paths = self.slide_order(&mut archive)?;
        let mut summaries = Vec::with_capacity(slide_paths.len());

        for (i, slide_path) in slide_paths.iter().enumerate() {
            let content = read_part(&mut archive, slide_path)?;
            let mut summary = summarize_slide(&content)?;
            summary.number = i + 1;
            summary.notes = self.notes_for(&mut archive, slide_path)?;
            summaries.push(summary);
        }

        Ok(summaries)
    }

    /// Slide part paths in presentation order.
    fn slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels = read_part(archive, "ppt/_rels/presentation.xml.rels")?;
        let mut slides: Vec<(String, Option<usize>)> = relationships(&rels)?
            .into_iter()
            .filter(|(rel_type, _)| rel_type.ends_with("/slide"))
            .map(|(_, target)| {
                let order = trailing_number(&target);
                (resolve_target("ppt", &target), order)
            })
            .collect();

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    fn notes_for<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
    ) -> Result<Option<String>> {
        let (dir, file) = slide_path.rsplit_once('/').unwrap_or(("", slide_path));
        let rels_path = format!("{}/_rels/{}.rels", dir, file);
        let Ok(rels) = read_part(archive, &rels_path) else {
            return Ok(None);
        };

        let target = relationships(&rels)?
            .into_iter()
            .find(|(rel_type, _)| rel_type.ends_with("/notesSlide"))
            .map(|(_, target)| resolve_target(dir, &target));

        match target {
            Some(path) => {
                let content = read_part(archive, &path)?;
                Ok(Some(paragraph_text(&content)?))
            }
            None => Ok(None),
        }
    }
}

/// A shape being read.
enum Shape {
    Text { title: bool, x: i64, y: i64, paragraphs: Vec<String> },
    Picture,
    Table { rows: usize },
}

fn summarize_slide(xml: &str) -> Result<SlideSummary> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut summary = SlideSummary::default();
    let mut positioned: Vec<(i64, i64, String)> = Vec::new();
    let mut shape: Option<Shape> = None;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => {
                    shape = Some(Shape::Text {
                        title: false,
                        x: 0,
                        y: 0,
                        paragraphs: Vec::new(),
                    })
                }
                b"pic" => shape = Some(Shape::Picture),
                b"graphicFrame" => shape = Some(Shape::Table { rows: 0 }),
                b"tr" => {
                    if let Some(Shape::Table { rows }) = shape.as_mut() {
                        *rows += 1;
                    }
                }
                b"p" => {
                    if let Some(Shape::Text { paragraphs, .. }) = shape.as_mut() {
                        paragraphs.push(String::new());
                    }
                }
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                b"ph" => {
                    if let Some(Shape::Text { title, .. }) = shape.as_mut() {
                        *title = attribute(e, b"type").is_some_and(|t| t == "title");
                    }
                }
                b"off" => {
                    if let Some(Shape::Text { x, y, .. }) = shape.as_mut() {
                        *x = attribute(e, b"x").and_then(|v| v.parse().ok()).unwrap_or(0);
                        *y = attribute(e, b"y").and_then(|v| v.parse().ok()).unwrap_or(0);
                    }
                }
                b"p" => {
                    if let Some(Shape::Text { paragraphs, .. }) = shape.as_mut() {
                        paragraphs.push(String::new());
                    }
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_text => {
                if let Some(Shape::Text { paragraphs, .. }) = shape.as_mut() {
                    let text = e.unescape().unwrap_or_default();
                    if let Some(last) = paragraphs.last_mut() {
                        last.push_str(&text);
                    }
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"t" => in_text = false,
                b"sp" | b"pic" | b"graphicFrame" => match shape.take() {
                    Some(Shape::Text { title: true, paragraphs, .. }) => {
                        summary.title = paragraphs.join("\n");
                    }
                    Some(Shape::Text { x, y, paragraphs, .. }) => {
                        let text = paragraphs.join("\n");
                        if !text.trim().is_empty() {
                            positioned.push((y, x, text));
                        }
                    }
                    Some(Shape::Picture) => summary.pictures += 1,
                    Some(Shape::Table { rows }) => summary.tables.push(rows),
                    None => {}
                },
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlError(format!("Error parsing slide: {}", e))),
            _ => {}
        }
    }

    positioned.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
    summary.texts = positioned.into_iter().map(|(_, _, text)| text).collect();
    Ok(summary)
}

/// All `a:t` text of a part, one line per paragraph.
fn paragraph_text(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"p" => paragraphs.push(String::new()),
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) if local_name(e.name().as_ref()) == b"p" => {
                paragraphs.push(String::new())
            }
            Ok(Event::Text(ref e)) if in_text => {
                if let Some(last) = paragraphs.last_mut() {
                    last.push_str(&e.unescape().unwrap_or_default());
                }
            }
            Ok(Event::End(ref e)) if local_name(e.name().as_ref()) == b"t" => in_text = false,
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlError(format!("Error parsing notes: {}", e))),
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}

/// `(Type, Target)` of every relationship in a rels part.
fn relationships(xml: &str) -> Result<Vec<(String, String)>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut found = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.name().as_ref() == b"Relationship" =>
            {
                let rel_type = attribute(e, b"Type").unwrap_or_default();
                let target = attribute(e, b"Target").unwrap_or_default();
                found.push((rel_type, target));
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing relationships: {}",
                    e
                )))
            }
            _ => {}
        }
    }

    Ok(found)
}

fn attribute(element: &BytesStart, key: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<String> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;
    Ok(content)
}

/// Resolve a relationship target against the directory of its source part.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut parts: Vec<&str> = base_dir.split('/').filter(|p| !p.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            ".." => {
                parts.pop();
            }
            "." | "" => {}
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().position(|&b| b == b':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// The number at the end of a name like "slide3.xml".
fn trailing_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");
    let start = s.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    s[start..].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PptxDeck;
    use jupdeck_core::{DeckSurface, Frame, TableGrid, TextBlock, TextStyle};
    use std::io::Cursor;

    #[test]
    fn test_trailing_number() {
        assert_eq!(trailing_number("slides/slide1.xml"), Some(1));
        assert_eq!(trailing_number("slide123.xml"), Some(123));
        assert_eq!(trailing_number("nodigits"), None);
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"sp"), b"sp");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("ppt", "slides/slide2.xml"), "ppt/slides/slide2.xml");
        assert_eq!(
            resolve_target("ppt/slides", "../notesSlides/notesSlide2.xml"),
            "ppt/notesSlides/notesSlide2.xml"
        );
        assert_eq!(resolve_target("ppt", "/ppt/x.xml"), "ppt/x.xml");
    }

    #[test]
    fn test_inspect_written_deck() {
        let mut deck = PptxDeck::new();
        for n in 1..=11 {
            deck.add_slide(&format!("Slide {}", n)).unwrap();
        }
        deck.add_text(
            Frame::new(0.5, 3.0, 5.8, 2.0),
            &TextBlock::new(TextStyle::Bullets, vec!["one".into(), "two".into()]),
        )
        .unwrap();
        deck.add_text(
            Frame::new(0.5, 1.5, 5.8, 0.7),
            &TextBlock::new(TextStyle::Body, vec!["lead".into()]),
        )
        .unwrap();
        let grid = TableGrid {
            columns: vec!["a".into()],
            rows: vec![vec!["1".into()], vec!["2".into()]],
        };
        deck.add_table(Frame::new(0.5, 5.5, 5.8, 0.9), &grid).unwrap();
        deck.attach_notes("lead\nmore").unwrap();

        let bytes = deck.to_bytes().unwrap();
        let slides = DeckInspector::new().inspect(Cursor::new(bytes)).unwrap();

        assert_eq!(slides.len(), 11);
        assert_eq!(slides[1].title, "Slide 2");
        assert_eq!(slides[10].title, "Slide 11");
        assert_eq!(slides[10].texts, vec!["lead", "one\ntwo"]);
        assert_eq!(slides[10].tables, vec![3]);
        assert_eq!(slides[10].notes.as_deref(), Some("lead\nmore"));
        assert!(slides[0].notes.is_none());
    }

    #[test]
    fn test_not_a_zip() {
        let err = DeckInspector::new()
            .inspect(Cursor::new(b"plain text".to_vec()))
            .unwrap_err();
        assert!(matches!(err, Error::ZipError(_)));
    }
}
