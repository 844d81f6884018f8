//! Per-line feature engineering for the heading classifier.
//!
//! The encoder produces exactly the named fields below; rows are assembled
//! in whatever order the classifier's schema declares. Any schema name the
//! encoder cannot produce, or a field-count mismatch, is a contract
//! violation and aborts the document.

use ndarray::Array2;

use crate::typography::{PageTypographyProfile, TypographyProfile};
use crate::types::TextLine;
use crate::OutlineError;

/// Every feature the encoder knows how to produce.
pub const FEATURE_NAMES: [&str; 13] = [
    "font_size",
    "is_bold",
    "is_italic",
    "is_centered",
    "x0",
    "y0",
    "page",
    "font_size_ratio",
    "font_size_zscore",
    "font_percentile",
    "line_position",
    "char_count",
    "word_count",
];

/// Guard against division by a zero page median.
const MEDIAN_EPSILON: f64 = 1e-3;

/// Substitute for a zero standard deviation in the z-score.
const STDDEV_EPSILON: f64 = 1e-5;

fn feature_value(line: &TextLine, profile: &PageTypographyProfile, name: &str) -> Option<f64> {
    let value = match name {
        "font_size" => line.font_size,
        "is_bold" => line.is_bold as u8 as f64,
        "is_italic" => line.is_italic as u8 as f64,
        "is_centered" => line.is_centered as u8 as f64,
        "x0" => line.x0,
        "y0" => line.y0,
        "page" => line.page as f64,
        "font_size_ratio" => line.font_size / profile.median_font_size.max(MEDIAN_EPSILON),
        "font_size_zscore" => {
            let std = if profile.stddev_font_size == 0.0 {
                STDDEV_EPSILON
            } else {
                profile.stddev_font_size
            };
            (line.font_size - profile.median_font_size) / std
        }
        "font_percentile" => {
            if profile.max_font_size != 0.0 {
                line.font_size / profile.max_font_size
            } else {
                0.0
            }
        }
        "line_position" => line.y0 / line.page_height,
        "char_count" => line.char_count() as f64,
        "word_count" => line.word_count() as f64,
        _ => return None,
    };
    Some(value)
}

/// Verify the classifier's declared schema against the encoder's fields.
///
/// Fails with [`OutlineError::SchemaMismatch`] on a count mismatch or on any
/// name the encoder does not produce. Padding or truncating is never done.
pub fn check_schema(schema: &[String]) -> Result<(), OutlineError> {
    if schema.len() != FEATURE_NAMES.len() {
        return Err(OutlineError::SchemaMismatch(format!(
            "classifier expects {} features, encoder produces {}",
            schema.len(),
            FEATURE_NAMES.len()
        )));
    }
    for name in schema {
        if !FEATURE_NAMES.contains(&name.as_str()) {
            return Err(OutlineError::SchemaMismatch(format!(
                "classifier expects unknown feature \"{}\"",
                name
            )));
        }
    }
    Ok(())
}

/// Encode every line into one row of the feature matrix, columns ordered by
/// the classifier's declared `schema`.
pub fn encode_features(
    lines: &[TextLine],
    typography: &TypographyProfile,
    schema: &[String],
) -> Result<Array2<f64>, OutlineError> {
    check_schema(schema)?;

    let mut matrix = Array2::zeros((lines.len(), schema.len()));
    for (row, line) in lines.iter().enumerate() {
        let profile = typography.page(line.page);
        for (col, name) in schema.iter().enumerate() {
            // check_schema guarantees every name resolves.
            matrix[[row, col]] = feature_value(line, &profile, name)
                .ok_or_else(|| OutlineError::SchemaMismatch(format!("unknown feature {}", name)))?;
        }
    }

    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_schema() -> Vec<String> {
        FEATURE_NAMES.iter().map(|s| s.to_string()).collect()
    }

    fn sample_line() -> TextLine {
        TextLine {
            text: "1. Introduction".to_string(),
            font_size: 18.0,
            is_bold: true,
            is_italic: false,
            is_centered: true,
            page: 2,
            x0: 72.0,
            y0: 99.0,
            y1: 117.0,
            gap_above: 24.0,
            page_width: 612.0,
            page_height: 792.0,
        }
    }

    fn profile_with(median: f64, max: f64, std: f64) -> TypographyProfile {
        // Build a profile whose page 2 statistics are exactly as requested.
        let sizes = match (median, max, std) {
            (10.0, 18.0, _) => vec![10.0, 10.0, 10.0, 18.0],
            _ => vec![median],
        };
        let lines: Vec<TextLine> = sizes
            .into_iter()
            .map(|s| {
                let mut l = sample_line();
                l.font_size = s;
                l
            })
            .collect();
        TypographyProfile::build(&lines, &[2], 0.90)
    }

    #[test]
    fn encodes_fields_in_schema_order() {
        let typography = profile_with(10.0, 18.0, 0.0);
        let matrix = encode_features(&[sample_line()], &typography, &default_schema()).unwrap();

        assert_eq!(matrix.shape(), &[1, 13]);
        assert_eq!(matrix[[0, 0]], 18.0); // font_size
        assert_eq!(matrix[[0, 1]], 1.0); // is_bold
        assert_eq!(matrix[[0, 2]], 0.0); // is_italic
        assert_eq!(matrix[[0, 3]], 1.0); // is_centered
        assert_eq!(matrix[[0, 4]], 72.0); // x0
        assert_eq!(matrix[[0, 5]], 99.0); // y0
        assert_eq!(matrix[[0, 6]], 2.0); // page
        assert!((matrix[[0, 7]] - 1.8).abs() < 1e-9); // ratio vs median 10
        assert!(matrix[[0, 8]] > 0.0); // zscore
        assert!((matrix[[0, 9]] - 1.0).abs() < 1e-9); // percentile: 18/18
        assert!((matrix[[0, 10]] - 99.0 / 792.0).abs() < 1e-9); // line_position
        assert_eq!(matrix[[0, 11]], 15.0); // char_count
        assert_eq!(matrix[[0, 12]], 2.0); // word_count
    }

    #[test]
    fn schema_order_controls_column_order() {
        let typography = profile_with(10.0, 18.0, 0.0);
        let mut schema = default_schema();
        schema.reverse();
        let matrix = encode_features(&[sample_line()], &typography, &schema).unwrap();

        assert_eq!(matrix[[0, 12]], 18.0); // font_size now last
        assert_eq!(matrix[[0, 0]], 2.0); // word_count now first
    }

    #[test]
    fn zero_stddev_uses_epsilon_not_nan() {
        // Single-size page: std 0, median == font_size => zscore 0 via epsilon.
        let typography = profile_with(18.0, 18.0, 0.0);
        let matrix = encode_features(&[sample_line()], &typography, &default_schema()).unwrap();
        let zscore_col = default_schema()
            .iter()
            .position(|n| n == "font_size_zscore")
            .unwrap();
        assert!(matrix[[0, zscore_col]].is_finite());
        assert_eq!(matrix[[0, zscore_col]], 0.0);
    }

    #[test]
    fn count_mismatch_is_schema_error() {
        let typography = profile_with(10.0, 18.0, 0.0);
        let schema: Vec<String> = default_schema().into_iter().take(5).collect();
        let err = encode_features(&[sample_line()], &typography, &schema).unwrap_err();
        assert!(matches!(err, OutlineError::SchemaMismatch(_)));
    }

    #[test]
    fn unknown_field_is_schema_error() {
        let typography = profile_with(10.0, 18.0, 0.0);
        let mut schema = default_schema();
        schema[3] = "embedding_norm".to_string();
        let err = encode_features(&[sample_line()], &typography, &schema).unwrap_err();
        assert!(matches!(err, OutlineError::SchemaMismatch(_)));
    }

    #[test]
    fn empty_input_encodes_to_empty_matrix() {
        let typography = TypographyProfile::build(&[], &[], 0.90);
        let matrix = encode_features(&[], &typography, &default_schema()).unwrap();
        assert_eq!(matrix.shape(), &[0, 13]);
    }
}
