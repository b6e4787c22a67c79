//! Model inference
//!
//! This module provides everything between an assembled feature row and a
//! predicted AQI value:
//! - Model manifest (city -> artifact path)
//! - Artifact loading and the regressor contract
//! - The predictor that ties both together

pub mod artifact;
pub mod catalog;
pub mod predictor;

use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::features::FeatureRow;
use crate::{AqiError, Result};

pub use artifact::{DecisionTree, LinearModel, ModelArtifact, RandomForest, TreeNode};
pub use catalog::ModelCatalog;
pub use predictor::{Prediction, Predictor};

/// Tabular model input: named columns, one or more rows
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureFrame {
    /// Create a frame; every row must have one value per column
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        if let Some(bad) = rows.iter().position(|row| row.len() != columns.len()) {
            return Err(AqiError::inference(format!(
                "Row {bad} has {} values, expected {}",
                rows[bad].len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    /// Single-row frame from a feature row, keeping its column order
    #[must_use]
    pub fn from_row(row: &FeatureRow) -> Self {
        Self {
            columns: row.names().into_iter().map(str::to_string).collect(),
            rows: vec![row.values()],
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Fail unless the frame's columns are exactly `expected`, in order
    pub fn ensure_columns(&self, expected: &[String]) -> Result<()> {
        if self.columns != expected {
            return Err(AqiError::inference(format!(
                "Feature names mismatch: model expects [{}], got [{}]",
                expected.join(", "),
                self.columns.join(", ")
            )));
        }
        Ok(())
    }
}

/// A trained regression model
pub trait Regressor: Send + Sync + Debug {
    /// Column names the model was trained on, in order
    fn feature_names(&self) -> &[String];

    /// Predict one value per frame row
    fn predict(&self, frame: &FeatureFrame) -> Result<Vec<f64>>;
}

/// Reads model artifacts from disk
pub trait ModelLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Arc<dyn Regressor>>;
}

/// Loads JSON-encoded [`ModelArtifact`]s
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonModelLoader;

impl ModelLoader for JsonModelLoader {
    fn load(&self, path: &Path) -> Result<Arc<dyn Regressor>> {
        debug!("Loading model artifact from {}", path.display());
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AqiError::inference(format!("Failed to read model {}: {e}", path.display()))
        })?;
        let artifact: ModelArtifact = serde_json::from_str(&raw).map_err(|e| {
            AqiError::inference(format!("Failed to parse model {}: {e}", path.display()))
        })?;
        artifact.validate()?;
        Ok(Arc::new(artifact))
    }
}
