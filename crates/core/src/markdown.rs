//! Structural parsing of markdown cells into title, bullets and paragraphs.
//!
//! Only the shapes a data notebook actually produces are recognised: one
//! primary heading, `-`/`*` bullet lists, prose paragraphs, inline links and
//! leading `<!-- key: value -->` directives. Everything else is prose.

use crate::record::{NOTES_DIRECTIVE, SLIDE_DIRECTIVE};
use crate::title::clean_title;
use crate::types::Metadata;
use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::LazyLock;

/// `<!-- key: value -->` on a line of its own.
static DIRECTIVE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*<!--\s*([A-Za-z][\w-]*)\s*:\s*(.*?)\s*-->\s*$").expect("valid directive regex")
});

/// A level-1 heading: exactly one `#` followed by whitespace or end of line.
static TITLE_HEADING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s{0,3}#(?:[ \t]+.*)?$").expect("valid heading regex"));

/// Any ATX heading marker at the start of a line.
static HEADING_PREFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s{0,3}#{1,6}(?:[ \t]+|$)").expect("valid heading regex"));

/// A bullet item: `-` or `*` followed by whitespace.
static BULLET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-*]\s+(.*)$").expect("valid bullet regex"));

/// Inline link `[text](url)` or `[text](url "title")`; a leading `!` marks an image.
static LINK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(!?)\[([^\]]+)\]\(([^)\s]+)(?:\s+"[^"]*")?\)"#).expect("valid link regex")
});

/// Values accepted for the `slide:` directive.
const SLIDE_DIRECTIVE_VALUES: &[&str] = &["new", "skip"];

/// Result of parsing one markdown cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedMarkdown {
    /// Cleaned level-1 heading, if the cell starts with one.
    pub title: Option<String>,

    /// Bullet items in document order.
    pub bullets: Vec<String>,

    /// Paragraphs in document order.
    pub paragraphs: Vec<String>,

    /// Recognised directives.
    pub metadata: Metadata,
}

/// Parse markdown text into its slide fields.
pub fn parse_markdown(text: &str) -> ParsedMarkdown {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = normalized.lines().map(str::trim_end).collect();

    let mut parsed = ParsedMarkdown::default();
    let mut pos = 0;

    // Leading directives (blank lines between them are allowed).
    while pos < lines.len() {
        let line = lines[pos];
        if line.trim().is_empty() {
            pos += 1;
            continue;
        }
        match DIRECTIVE_REGEX.captures(line) {
            Some(caps) => {
                record_directive(&mut parsed.metadata, &caps[1], &caps[2]);
                pos += 1;
            }
            None => break,
        }
    }

    if let Some(&first) = lines.get(pos) {
        if TITLE_HEADING_REGEX.is_match(first) {
            let title = clean_title(first);
            if !title.is_empty() {
                parsed.title = Some(title);
            }
            pos += 1;
        }
    }

    for block in split_blocks(&lines[pos..]) {
        if block.iter().all(|line| BULLET_REGEX.is_match(line)) {
            for line in block {
                let item = BULLET_REGEX
                    .captures(line)
                    .map(|caps| caps[1].trim().to_string())
                    .unwrap_or_default();
                let item = rewrite_links(&item);
                if !item.is_empty() {
                    parsed.bullets.push(item);
                }
            }
        } else {
            let joined = block
                .iter()
                .map(|line| fold_heading(line).trim())
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            let paragraph = rewrite_links(&joined);
            if !paragraph.is_empty() {
                parsed.paragraphs.push(paragraph);
            }
        }
    }

    parsed
}

/// Rewrite inline links `[text](url)` as `text (url)`.
///
/// Link titles are dropped. Image syntax `![alt](url)` is left as written.
pub fn rewrite_links(text: &str) -> String {
    LINK_REGEX
        .replace_all(text, |caps: &Captures| {
            if &caps[1] == "!" {
                caps[0].to_string()
            } else {
                format!("{} ({})", &caps[2], &caps[3])
            }
        })
        .into_owned()
}

/// Store a directive if its key and value are recognised.
fn record_directive(metadata: &mut Metadata, key: &str, value: &str) {
    let key = key.to_ascii_lowercase();
    match key.as_str() {
        SLIDE_DIRECTIVE => {
            let value = value.to_ascii_lowercase();
            if SLIDE_DIRECTIVE_VALUES.contains(&value.as_str()) {
                metadata.insert(key, Value::String(value));
            } else {
                log::debug!("Ignoring unknown slide directive value '{}'", value);
            }
        }
        NOTES_DIRECTIVE if !value.is_empty() => {
            metadata.insert(key, Value::String(value.to_string()));
        }
        _ => log::debug!("Ignoring unrecognized directive '{}'", key),
    }
}

/// Split lines into blocks separated by blank lines.
fn split_blocks<'a>(lines: &[&'a str]) -> Vec<Vec<&'a str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for &line in lines {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

/// Strip heading markers from a secondary heading folded into prose.
fn fold_heading(line: &str) -> &str {
    match HEADING_PREFIX_REGEX.find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    }
}
