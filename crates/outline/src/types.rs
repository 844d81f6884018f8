use std::fmt;

use serde::{Deserialize, Serialize};

/// Heading depth as emitted in the final outline.
///
/// Only three levels exist in the output contract; anything deeper that a
/// classifier might emit is treated as body text upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeadingLabel {
    H1,
    H2,
    H3,
}

impl HeadingLabel {
    /// Map a classifier label string onto a heading level.
    ///
    /// Returns `None` for any non-heading label (`"body"`, `"O"`, ...).
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "H1" => Some(HeadingLabel::H1),
            "H2" => Some(HeadingLabel::H2),
            "H3" => Some(HeadingLabel::H3),
            _ => None,
        }
    }
}

impl fmt::Display for HeadingLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeadingLabel::H1 => write!(f, "H1"),
            HeadingLabel::H2 => write!(f, "H2"),
            HeadingLabel::H3 => write!(f, "H3"),
        }
    }
}

/// One visually distinct line of text, in document reading order.
///
/// Coordinates are top-down: `y0` is the distance from the page top to the
/// line's top edge, `y1` to its bottom edge. Immutable once collected.
#[derive(Debug, Clone)]
pub struct TextLine {
    pub text: String,
    pub font_size: f64,
    pub is_bold: bool,
    pub is_italic: bool,
    pub is_centered: bool,
    /// 1-based page number.
    pub page: u32,
    pub x0: f64,
    pub y0: f64,
    pub y1: f64,
    /// Vertical distance from the previous non-empty line's bottom edge.
    /// Zero for the first line of the document.
    pub gap_above: f64,
    pub page_width: f64,
    pub page_height: f64,
}

impl TextLine {
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// A finalized heading in the output artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub level: HeadingLabel,
    pub text: String,
    pub page: u32,
}

/// The terminal artifact: a document title plus its ordered headings.
///
/// Field order matters -- it is the stable serialization contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outline {
    pub title: String,
    pub outline: Vec<OutlineEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_from_heading_strings() {
        assert_eq!(HeadingLabel::from_label("H1"), Some(HeadingLabel::H1));
        assert_eq!(HeadingLabel::from_label("H2"), Some(HeadingLabel::H2));
        assert_eq!(HeadingLabel::from_label("H3"), Some(HeadingLabel::H3));
    }

    #[test]
    fn label_from_non_heading_strings() {
        assert_eq!(HeadingLabel::from_label("body"), None);
        assert_eq!(HeadingLabel::from_label("O"), None);
        assert_eq!(HeadingLabel::from_label(""), None);
        assert_eq!(HeadingLabel::from_label("h1"), None);
    }

    #[test]
    fn outline_serializes_title_first() {
        let outline = Outline {
            title: "report".to_string(),
            outline: vec![OutlineEntry {
                level: HeadingLabel::H1,
                text: "Introduction".to_string(),
                page: 1,
            }],
        };
        let json = serde_json::to_string(&outline).unwrap();
        assert_eq!(
            json,
            r#"{"title":"report","outline":[{"level":"H1","text":"Introduction","page":1}]}"#
        );
    }

    #[test]
    fn word_and_char_counts() {
        let line = TextLine {
            text: "1. Introduction".to_string(),
            font_size: 18.0,
            is_bold: true,
            is_italic: false,
            is_centered: false,
            page: 1,
            x0: 72.0,
            y0: 90.0,
            y1: 108.0,
            gap_above: 0.0,
            page_width: 612.0,
            page_height: 792.0,
        };
        assert_eq!(line.word_count(), 2);
        assert_eq!(line.char_count(), 15);
    }
}
