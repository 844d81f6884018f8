//! Heading classification behind an injected strategy trait.
//!
//! The pipeline never knows which model family it is talking to: it encodes
//! a feature matrix against [`HeadingModel::feature_schema`], asks for one
//! categorical code per row, and decodes codes to label strings. The model
//! is loaded once per process and shared read-only across documents.

use ndarray::Array2;

use crate::OutlineError;

pub mod ranking;
pub mod tree;

pub use ranking::RankingModel;
pub use tree::TreeModel;

/// A pre-trained tabular classifier mapping line features to heading labels.
pub trait HeadingModel: Send + Sync {
    /// The ordered, named numeric fields this model expects per row.
    fn feature_schema(&self) -> &[String];

    /// One categorical code per input row. Deterministic and stateless.
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<usize>, OutlineError>;

    /// Decode a categorical code to its label string ("H1", "body", ...).
    /// Unknown codes decode to `None` and are treated as non-headings.
    fn decode(&self, code: usize) -> Option<&str>;
}
