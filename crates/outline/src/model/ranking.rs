//! Artifact-free fallback model: rank font sizes, largest three become
//! H1/H2/H3. Lets the pipeline run when no trained artifact is available.

use std::collections::HashMap;

use ndarray::Array2;

use super::HeadingModel;
use crate::features::FEATURE_NAMES;
use crate::OutlineError;

/// Quantisation bucket width for font sizes (points).
const FONT_SIZE_BUCKET: f64 = 0.5;

/// Sizes must exceed the dominant body size by this margin to rank as
/// headings.
const HEADING_MARGIN: f64 = 1.5;

const LABELS: [&str; 4] = ["H1", "H2", "H3", "body"];

/// Code emitted for every non-heading row.
pub const BODY_CODE: usize = 3;

/// Rule-based [`HeadingModel`] driven purely by the feature matrix.
///
/// The dominant body size is the quantised font size covering the most
/// characters; distinct sizes above `body + 1.5` are ranked descending and
/// the top three map to H1, H2, H3.
pub struct RankingModel {
    schema: Vec<String>,
    labels: Vec<String>,
    font_size_col: usize,
    char_count_col: usize,
}

impl Default for RankingModel {
    fn default() -> Self {
        Self::new()
    }
}

impl RankingModel {
    pub fn new() -> Self {
        let schema: Vec<String> = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
        let font_size_col = schema.iter().position(|n| n == "font_size").unwrap();
        let char_count_col = schema.iter().position(|n| n == "char_count").unwrap();
        Self {
            schema,
            labels: LABELS.iter().map(|s| s.to_string()).collect(),
            font_size_col,
            char_count_col,
        }
    }
}

fn bucket(size: f64) -> f64 {
    (size / FONT_SIZE_BUCKET).round() * FONT_SIZE_BUCKET
}

fn bucket_key(size: f64) -> i64 {
    (bucket(size) * 100.0).round() as i64
}

impl HeadingModel for RankingModel {
    fn feature_schema(&self) -> &[String] {
        &self.schema
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Vec<usize>, OutlineError> {
        if features.ncols() != self.schema.len() {
            return Err(OutlineError::SchemaMismatch(format!(
                "feature matrix has {} columns, model expects {}",
                features.ncols(),
                self.schema.len()
            )));
        }

        // Histogram of character coverage per quantised size.
        let mut histogram: HashMap<i64, f64> = HashMap::new();
        for row in features.rows() {
            let size = row[self.font_size_col];
            if size <= 0.0 {
                continue;
            }
            let chars = row[self.char_count_col].max(1.0);
            *histogram.entry(bucket_key(size)).or_insert(0.0) += chars;
        }

        let body_size = histogram
            .iter()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(&k, _)| k as f64 / 100.0)
            .unwrap_or(12.0);
        let heading_threshold = body_size + HEADING_MARGIN;

        // Distinct heading sizes, largest first; top three become H1..H3.
        let mut heading_sizes: Vec<i64> = features
            .rows()
            .into_iter()
            .map(|row| row[self.font_size_col])
            .filter(|&s| s > heading_threshold)
            .map(bucket_key)
            .collect();
        heading_sizes.sort_unstable_by(|a, b| b.cmp(a));
        heading_sizes.dedup();
        heading_sizes.truncate(3);

        let codes = features
            .rows()
            .into_iter()
            .map(|row| {
                let size = row[self.font_size_col];
                if size > heading_threshold {
                    heading_sizes
                        .iter()
                        .position(|&k| k == bucket_key(size))
                        .unwrap_or(BODY_CODE)
                } else {
                    BODY_CODE
                }
            })
            .collect();

        Ok(codes)
    }

    fn decode(&self, code: usize) -> Option<&str> {
        self.labels.get(code).map(String::as_str)
    }
}
