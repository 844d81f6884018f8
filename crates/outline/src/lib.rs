//! Typography-driven PDF outline extraction.
//!
//! The pipeline turns a PDF into `{title, outline: [{level, text, page}]}`:
//! collect styled text lines, profile font sizes globally and per page,
//! encode per-line feature vectors, classify them with an injected
//! [`HeadingModel`], then filter and merge the candidates into the final
//! outline.
//!
//! ```text
//! bytes -> TextLine[] -> TypographyProfile -> feature matrix
//!       -> label per line -> filter + merge -> Outline
//! ```
//!
//! Each stage depends only on the stages before it.

use thiserror::Error;

use parser::backend::{LopdfBackend, PdfBackend};

pub mod features;
pub mod heuristics;
pub mod merge;
pub mod model;
pub mod parser;
pub mod typography;
pub mod types;

pub use model::{HeadingModel, RankingModel, TreeModel};
pub use typography::DEFAULT_PERCENTILE;
pub use types::*;

#[derive(Debug, Error)]
pub enum OutlineError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("Feature schema mismatch: {0}")]
    SchemaMismatch(String),
    #[error("Classifier error: {0}")]
    Model(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Extract the outline of a single PDF document.
///
/// `title` becomes the outline's title verbatim (callers typically pass the
/// file stem). The model is shared read-only state; nothing here mutates it.
/// A document with no extractable text yields an empty outline, not an error.
pub fn extract_outline(
    bytes: &[u8],
    title: &str,
    model: &dyn HeadingModel,
    percentile: f64,
) -> Result<Outline, OutlineError> {
    let backend = LopdfBackend::load_bytes(bytes)?;
    extract_from_backend(&backend, title, model, percentile)
}

/// Pipeline over an already-opened backend; seam for mock-backed tests.
pub fn extract_from_backend(
    backend: &dyn PdfBackend,
    title: &str,
    model: &dyn HeadingModel,
    percentile: f64,
) -> Result<Outline, OutlineError> {
    let lines = parser::layout::collect_lines(backend)?;
    log::debug!("{}: collected {} text lines", title, lines.len());

    if lines.is_empty() {
        return Ok(Outline {
            title: title.to_string(),
            outline: Vec::new(),
        });
    }

    let page_numbers: Vec<u32> = backend.pages().keys().copied().collect();
    let typography = typography::TypographyProfile::build(&lines, &page_numbers, percentile);
    log::debug!(
        "{}: global font threshold {:.2}",
        title,
        typography.threshold
    );

    let matrix = features::encode_features(&lines, &typography, model.feature_schema())?;
    let codes = model.predict(&matrix)?;
    if codes.len() != lines.len() {
        return Err(OutlineError::Model(format!(
            "classifier returned {} labels for {} lines",
            codes.len(),
            lines.len()
        )));
    }

    let labels = codes
        .into_iter()
        .map(|code| model.decode(code).and_then(HeadingLabel::from_label));
    let entries = merge::filter_and_merge(lines.iter().zip(labels), typography.threshold);
    log::debug!("{}: {} outline entries", title, entries.len());

    Ok(Outline {
        title: title.to_string(),
        outline: entries,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::parser::backend::{ContentOp, FontInfo, PageId, PdfValue};
    use super::*;

    struct MockBackend {
        ops: Vec<ContentOp>,
    }

    impl PdfBackend for MockBackend {
        fn pages(&self) -> BTreeMap<u32, PageId> {
            let mut pages = BTreeMap::new();
            pages.insert(1, (1, 0));
            pages
        }

        fn page_size(&self, _page: PageId) -> Result<(f64, f64), OutlineError> {
            Ok((612.0, 792.0))
        }

        fn page_fonts(&self, _page: PageId) -> Result<Vec<FontInfo>, OutlineError> {
            Ok(Vec::new())
        }

        fn page_ops(&self, _page: PageId) -> Result<Vec<ContentOp>, OutlineError> {
            Ok(self.ops.clone())
        }

        fn decode_text(&self, _page: PageId, _font: &[u8], bytes: &[u8]) -> String {
            super::parser::backend::decode_text_simple(bytes)
        }
    }

    fn op(operator: &str, operands: Vec<PdfValue>) -> ContentOp {
        ContentOp {
            operator: operator.to_string(),
            operands,
        }
    }

    fn show(font: &str, size: f64, x: f64, y: f64, text: &str) -> Vec<ContentOp> {
        vec![
            op("BT", vec![]),
            op(
                "Tf",
                vec![
                    PdfValue::Name(font.as_bytes().to_vec()),
                    PdfValue::Real(size),
                ],
            ),
            op(
                "Tm",
                vec![
                    PdfValue::Real(1.0),
                    PdfValue::Real(0.0),
                    PdfValue::Real(0.0),
                    PdfValue::Real(1.0),
                    PdfValue::Real(x),
                    PdfValue::Real(y),
                ],
            ),
            op("Tj", vec![PdfValue::Str(text.as_bytes().to_vec())]),
            op("ET", vec![]),
        ]
    }

    #[test]
    fn single_heading_over_body_text() {
        // One large heading followed by body lines at the dominant size.
        let mut ops = show("F1", 18.0, 72.0, 720.0, "1. Introduction");
        ops.extend(show("F1", 10.0, 72.0, 690.0, "The quick brown fox jumps."));
        ops.extend(show("F1", 10.0, 72.0, 675.0, "It keeps jumping all day long."));
        ops.extend(show("F1", 10.0, 72.0, 660.0, "More body text follows here."));
        ops.extend(show("F1", 10.0, 72.0, 645.0, "And a final body sentence."));

        let backend = MockBackend { ops };
        let model = RankingModel::new();
        let outline =
            extract_from_backend(&backend, "sample", &model, DEFAULT_PERCENTILE).unwrap();

        assert_eq!(outline.title, "sample");
        assert_eq!(outline.outline.len(), 1);
        assert_eq!(outline.outline[0].text, "1. Introduction");
        assert_eq!(outline.outline[0].level, HeadingLabel::H1);
        assert_eq!(outline.outline[0].page, 1);
    }

    #[test]
    fn empty_document_degrades_to_empty_outline() {
        let backend = MockBackend { ops: Vec::new() };
        let model = RankingModel::new();
        let outline = extract_from_backend(&backend, "empty", &model, DEFAULT_PERCENTILE).unwrap();

        assert_eq!(outline.title, "empty");
        assert!(outline.outline.is_empty());
    }

    #[test]
    fn schema_mismatch_aborts_the_document() {
        struct BadSchemaModel {
            schema: Vec<String>,
        }

        impl HeadingModel for BadSchemaModel {
            fn feature_schema(&self) -> &[String] {
                &self.schema
            }

            fn predict(&self, _features: &ndarray::Array2<f64>) -> Result<Vec<usize>, OutlineError> {
                Ok(Vec::new())
            }

            fn decode(&self, _code: usize) -> Option<&str> {
                None
            }
        }

        let backend = MockBackend {
            ops: show("F1", 18.0, 72.0, 720.0, "Heading"),
        };
        let model = BadSchemaModel {
            schema: vec!["font_size".to_string(), "mystery_field".to_string()],
        };

        let err = extract_from_backend(&backend, "doc", &model, DEFAULT_PERCENTILE).unwrap_err();
        assert!(matches!(err, OutlineError::SchemaMismatch(_)));
    }

    #[test]
    fn parse_failure_surfaces_as_error() {
        let model = RankingModel::new();
        let err = extract_outline(b"definitely not a pdf", "bad", &model, DEFAULT_PERCENTILE)
            .unwrap_err();
        assert!(matches!(err, OutlineError::Parse(_)));
    }
}
