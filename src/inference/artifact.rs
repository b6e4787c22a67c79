//! On-disk model artifacts
//!
//! Artifacts are JSON documents tagged by `kind`:
//!
//! ```json
//! {"kind": "random_forest", "feature_names": ["..."],
//!  "trees": [{"nodes": [{"feature": 0, "threshold": 30.5, "left": 1, "right": 2},
//!                       {"value": 80.0}, {"value": 140.0}]}]}
//! ```
//!
//! Tree node 0 is the root; a split sends a row left when
//! `row[feature] <= threshold`. The forest predicts the mean over its trees.

use serde::{Deserialize, Serialize};

use super::{FeatureFrame, Regressor};
use crate::{AqiError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    RandomForest(RandomForest),
    Linear(LinearModel),
}

impl ModelArtifact {
    /// Structural checks run once at load time
    pub fn validate(&self) -> Result<()> {
        match self {
            ModelArtifact::RandomForest(forest) => forest.validate(),
            ModelArtifact::Linear(linear) => linear.validate(),
        }
    }
}

impl Regressor for ModelArtifact {
    fn feature_names(&self) -> &[String] {
        match self {
            ModelArtifact::RandomForest(forest) => &forest.feature_names,
            ModelArtifact::Linear(linear) => &linear.feature_names,
        }
    }

    fn predict(&self, frame: &FeatureFrame) -> Result<Vec<f64>> {
        frame.ensure_columns(self.feature_names())?;
        match self {
            ModelArtifact::RandomForest(forest) => {
                frame.rows().iter().map(|row| forest.predict_row(row)).collect()
            }
            ModelArtifact::Linear(linear) => {
                frame.rows().iter().map(|row| linear.predict_row(row)).collect()
            }
        }
    }
}

/// Ensemble of regression trees averaged together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub feature_names: Vec<String>,
    pub trees: Vec<DecisionTree>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    // Split must come first: a leaf would also accept a split's fields.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

impl RandomForest {
    fn validate(&self) -> Result<()> {
        validate_feature_names(&self.feature_names)?;
        if self.trees.is_empty() {
            return Err(AqiError::inference("Random forest has no trees"));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.feature_names.len())
                .map_err(|e| AqiError::inference(format!("Tree {i}: {e}")))?;
        }
        Ok(())
    }

    fn predict_row(&self, row: &[f64]) -> Result<f64> {
        if self.trees.is_empty() {
            return Err(AqiError::inference("Random forest has no trees"));
        }
        let mut total = 0.0;
        for (i, tree) in self.trees.iter().enumerate() {
            total += tree
                .predict_row(row)
                .map_err(|e| AqiError::inference(format!("Tree {i}: {e}")))?;
        }
        Ok(total / self.trees.len() as f64)
    }
}

impl DecisionTree {
    fn validate(&self, n_features: usize) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (index, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature, left, right, ..
            } = node
            {
                if *feature >= n_features {
                    return Err(format!("node {index} splits on unknown feature {feature}"));
                }
                // Children after their parent rules out cycles.
                for child in [left, right] {
                    if *child <= index || *child >= self.nodes.len() {
                        return Err(format!("node {index} has invalid child {child}"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Walk from the root to a leaf. A path longer than the node count
    /// means the tree has a cycle.
    fn predict_row(&self, row: &[f64]) -> std::result::Result<f64, String> {
        let mut index = 0;
        for _ in 0..self.nodes.len() {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { value }) => return Ok(*value),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let x = row
                        .get(*feature)
                        .ok_or_else(|| format!("node {index} splits on unknown feature {feature}"))?;
                    index = if *x <= *threshold { *left } else { *right };
                }
                None => return Err(format!("node {index} does not exist")),
            }
        }
        Err("no leaf reached".to_string())
    }
}

/// Ordinary linear regression: `intercept + sum(coef_i * x_i)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub feature_names: Vec<String>,
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearModel {
    fn validate(&self) -> Result<()> {
        validate_feature_names(&self.feature_names)?;
        if self.coefficients.len() != self.feature_names.len() {
            return Err(AqiError::inference(format!(
                "Linear model has {} coefficients for {} features",
                self.coefficients.len(),
                self.feature_names.len()
            )));
        }
        Ok(())
    }

    fn predict_row(&self, row: &[f64]) -> Result<f64> {
        if self.coefficients.len() != row.len() {
            return Err(AqiError::inference(format!(
                "Linear model has {} coefficients for {} features",
                self.coefficients.len(),
                row.len()
            )));
        }
        Ok(self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(coef, x)| coef * x)
                .sum::<f64>())
    }
}

fn validate_feature_names(names: &[String]) -> Result<()> {
    if names.is_empty() {
        return Err(AqiError::inference("Model declares no feature names"));
    }
    for (i, name) in names.iter().enumerate() {
        if names[..i].contains(name) {
            return Err(AqiError::inference(format!("Duplicate feature name '{name}'")));
        }
    }
    Ok(())
}
