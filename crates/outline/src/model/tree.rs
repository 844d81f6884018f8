//! Pre-trained decision-tree artifact: load once, infer per document.

use std::io::BufRead;
use std::path::Path;

use linfa::traits::Predict;
use linfa_trees::DecisionTree;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::HeadingModel;
use crate::OutlineError;

/// On-disk model artifact: feature schema, label table, and the trained
/// tree, serialized together as one JSON document so the three can never
/// drift apart.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub feature_names: Vec<String>,
    /// Class-code to label-string table (the label encoder).
    pub labels: Vec<String>,
    pub tree: DecisionTree<f64, usize>,
}

/// [`HeadingModel`] backed by a deserialized [`DecisionTree`].
#[derive(Debug)]
pub struct TreeModel {
    schema: Vec<String>,
    labels: Vec<String>,
    tree: DecisionTree<f64, usize>,
}

impl TreeModel {
    /// Load the artifact from a JSON file.
    pub fn load(path: &Path) -> Result<Self, OutlineError> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Self::from_reader(reader)
    }

    /// Load the artifact from any reader producing the artifact JSON.
    pub fn from_reader(reader: impl BufRead) -> Result<Self, OutlineError> {
        let artifact: ModelArtifact = serde_json::from_reader(reader)
            .map_err(|e| OutlineError::Model(format!("cannot decode model artifact: {}", e)))?;
        Ok(Self::from_artifact(artifact))
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Self {
        Self {
            schema: artifact.feature_names,
            labels: artifact.labels,
            tree: artifact.tree,
        }
    }
}

impl HeadingModel for TreeModel {
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
        if features.nrows() == 0 {
            return Ok(Vec::new());
        }
        Ok(self.tree.predict(features).to_vec())
    }

    fn decode(&self, code: usize) -> Option<&str> {
        self.labels.get(code).map(String::as_str)
    }
}
