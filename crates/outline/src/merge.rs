//! Rejection of implausible heading candidates and merging of adjacent
//! fragments into logical headings.
//!
//! A two-state machine (no active heading / active heading) walks the
//! classified lines in reading order. Accepted candidates either extend the
//! active heading or flush it and start a new one; every rejected or
//! non-heading line flushes whatever is active.

use crate::heuristics::{is_bad_h3, is_likely_paragraph, is_numbering_only};
use crate::types::{HeadingLabel, OutlineEntry, TextLine};

/// Consecutive candidates merge only when their font sizes differ by at most
/// this many points.
pub const MERGE_FONT_TOLERANCE: f64 = 0.5;

/// A heading being accumulated; text grows while adjacent fragments merge.
#[derive(Debug, Clone)]
struct HeadingCandidate {
    label: HeadingLabel,
    text: String,
    page: u32,
    font_size: f64,
}

impl HeadingCandidate {
    fn finalize(self) -> OutlineEntry {
        OutlineEntry {
            level: self.label,
            text: self.text.trim().to_string(),
            page: self.page,
        }
    }
}

/// Should this classified line be accepted as a heading candidate?
///
/// Rules run in order: the H3-only plausibility check first, then the rules
/// common to all heading levels (threshold, paragraph-likeness, bare
/// numbering). A line failing any rule counts as non-heading for this pass.
fn accept(label: HeadingLabel, line: &TextLine, threshold: f64) -> bool {
    if label == HeadingLabel::H3 && is_bad_h3(&line.text) {
        return false;
    }
    if line.font_size < threshold {
        return false;
    }
    if is_likely_paragraph(&line.text) {
        return false;
    }
    if is_numbering_only(&line.text) {
        return false;
    }
    true
}

/// Run the filter-and-merge pass over classified lines in reading order.
///
/// `labels` carries the decoded classifier label per line; `None` (and any
/// non-H1/H2/H3 label upstream) means non-heading.
pub fn filter_and_merge<'a, I>(classified: I, threshold: f64) -> Vec<OutlineEntry>
where
    I: IntoIterator<Item = (&'a TextLine, Option<HeadingLabel>)>,
{
    let mut entries: Vec<OutlineEntry> = Vec::new();
    let mut current: Option<HeadingCandidate> = None;

    for (line, label) in classified {
        let accepted = label.filter(|&l| accept(l, line, threshold));

        match accepted {
            Some(label) => {
                let mergeable = current.as_ref().is_some_and(|cur| {
                    cur.page == line.page
                        && cur.label == label
                        && (cur.font_size - line.font_size).abs() <= MERGE_FONT_TOLERANCE
                });

                if mergeable {
                    let cur = current.as_mut().unwrap();
                    cur.text.push(' ');
                    cur.text.push_str(&line.text);
                } else {
                    if let Some(cur) = current.take() {
                        entries.push(cur.finalize());
                    }
                    current = Some(HeadingCandidate {
                        label,
                        text: line.text.clone(),
                        page: line.page,
                        font_size: line.font_size,
                    });
                }
            }
            None => {
                if let Some(cur) = current.take() {
                    entries.push(cur.finalize());
                }
            }
        }
    }

    if let Some(cur) = current {
        entries.push(cur.finalize());
    }

    entries
}
