//! Title cleaning for slide headings.
//!
//! Markdown headings and code comments both feed slide titles; they go
//! through the same cleanup so that `"## Results:"` and `"# results -"`
//! come out the same way.

use regex::Regex;
use std::sync::LazyLock;

/// Regex to collapse runs of whitespace into one space.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Heading marker characters removed from titles.
const HEADING_MARKER: char = '#';

/// Characters stripped from the end of a title.
const TRAILING_PUNCTUATION: &[char] = &[':', '.', '-'];

/// Clean a heading or comment line into a slide title.
///
/// - Removes every `#` character
/// - Collapses whitespace runs to single spaces
/// - Trims, then strips any trailing mix of `:`, `.` and `-`
///
/// The result is stable: cleaning a cleaned title returns it unchanged.
pub fn clean_title(line: &str) -> String {
    let without_markers: String = line.chars().filter(|&c| c != HEADING_MARKER).collect();
    let collapsed = WHITESPACE_COLLAPSE_REGEX.replace_all(&without_markers, " ");

    collapsed
        .trim()
        .trim_end_matches(|c: char| TRAILING_PUNCTUATION.contains(&c) || c.is_whitespace())
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_removes_heading_markers() {
        assert_eq!(clean_title("# Slide Title"), "Slide Title");
        assert_eq!(clean_title("### Deep heading"), "Deep heading");
        assert_eq!(clean_title("#hashtag#"), "hashtag");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(clean_title("#   Key \t  Findings  "), "Key Findings");
    }

    #[test]
    fn test_strips_trailing_punctuation() {
        assert_eq!(clean_title("# Results:"), "Results");
        assert_eq!(clean_title("# Results..."), "Results");
        assert_eq!(clean_title("# Results -"), "Results");
        assert_eq!(clean_title("# Results -.: -"), "Results");
    }

    #[test]
    fn test_keeps_inner_punctuation() {
        assert_eq!(clean_title("# Step 1: load-data"), "Step 1: load-data");
        assert_eq!(clean_title("# v1.2 release"), "v1.2 release");
    }

    #[test]
    fn test_empty_and_marker_only() {
        assert_eq!(clean_title(""), "");
        assert_eq!(clean_title("#"), "");
        assert_eq!(clean_title("## ::"), "");
    }

    proptest! {
        #[test]
        fn prop_clean_title_is_idempotent(s in "[#:. \\t\\-a-zA-Z0-9]{0,40}") {
            let once = clean_title(&s);
            prop_assert_eq!(clean_title(&once), once);
        }

        #[test]
        fn prop_clean_title_is_idempotent_any_text(s in "\\PC{0,60}") {
            let once = clean_title(&s);
            prop_assert_eq!(clean_title(&once), once);
        }
    }
}
