//! Document-wide and per-page font-size statistics.

use std::collections::BTreeMap;

use crate::types::TextLine;

/// Threshold reported for a document with no text at all.
pub const EMPTY_DOC_THRESHOLD: f64 = 12.0;

/// Substitute size for a page with no lines; statistics for such a page are
/// computed from the singleton `[10.0]`.
pub const EMPTY_PAGE_FONT_SIZE: f64 = 10.0;

/// Default percentile for the global heading-size threshold.
pub const DEFAULT_PERCENTILE: f64 = 0.90;

/// Font-size statistics for one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageTypographyProfile {
    pub page: u32,
    pub median_font_size: f64,
    pub max_font_size: f64,
    pub stddev_font_size: f64,
}

impl PageTypographyProfile {
    fn from_sizes(page: u32, mut sizes: Vec<f64>) -> Self {
        if sizes.is_empty() {
            sizes.push(EMPTY_PAGE_FONT_SIZE);
        }
        sizes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let median_font_size = quantile(&sizes, 0.5);
        let max_font_size = *sizes.last().unwrap();
        let mean = sizes.iter().sum::<f64>() / sizes.len() as f64;
        let variance = sizes.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / sizes.len() as f64;

        Self {
            page,
            median_font_size,
            max_font_size,
            stddev_font_size: variance.sqrt(),
        }
    }
}

/// The global threshold plus one [`PageTypographyProfile`] per page.
#[derive(Debug, Clone)]
pub struct TypographyProfile {
    /// High-percentile font size across the whole document. Heading
    /// candidates below this size are rejected downstream.
    pub threshold: f64,
    pages: BTreeMap<u32, PageTypographyProfile>,
}

impl TypographyProfile {
    /// Compute statistics from the collected lines.
    ///
    /// `page_numbers` is the full 1-based page list of the document, so
    /// pages without any text still get a (default-size) profile.
    pub fn build(lines: &[TextLine], page_numbers: &[u32], percentile: f64) -> Self {
        let mut all_sizes: Vec<f64> = lines.iter().map(|l| l.font_size).collect();
        all_sizes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let threshold = if all_sizes.is_empty() {
            EMPTY_DOC_THRESHOLD
        } else {
            quantile(&all_sizes, percentile)
        };

        let mut by_page: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
        for &page in page_numbers {
            by_page.entry(page).or_default();
        }
        for line in lines {
            by_page.entry(line.page).or_default().push(line.font_size);
        }

        let pages = by_page
            .into_iter()
            .map(|(page, sizes)| (page, PageTypographyProfile::from_sizes(page, sizes)))
            .collect();

        Self { threshold, pages }
    }

    /// Profile for a page; pages unknown to the profiler report the
    /// empty-page defaults.
    pub fn page(&self, page: u32) -> PageTypographyProfile {
        self.pages
            .get(&page)
            .copied()
            .unwrap_or_else(|| PageTypographyProfile::from_sizes(page, Vec::new()))
    }
}

/// Linear-interpolation quantile over an already-sorted slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = pos - lo as f64;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}
