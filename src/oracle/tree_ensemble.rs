//! Gradient-boosted tree ensemble loaded from a converted model package

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};
use crate::features::FeatureVector;
use crate::oracle::ModelOracle;

/// One node of a regression tree, in array-of-nodes form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    /// Index of the feature tested at this node; `None` marks a leaf
    pub feature: Option<usize>,
    /// Split threshold (`value < threshold` goes left)
    #[serde(default)]
    pub threshold: f64,
    /// Index of the left child within the tree
    #[serde(default)]
    pub left: usize,
    /// Index of the right child within the tree
    #[serde(default)]
    pub right: usize,
    /// Leaf output (unused on internal nodes)
    #[serde(default)]
    pub value: f64,
}

/// A single additive regression tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    /// Nodes in array form, root at index 0
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    /// Walk the tree for one feature vector and return the leaf output
    fn output(&self, values: &[f64]) -> Result<f64> {
        let mut index = 0usize;

        // A well-formed tree reaches a leaf in at most `nodes.len()` hops;
        // anything longer means a cycle in the node links.
        for _ in 0..=self.nodes.len() {
            let node = self.nodes.get(index).ok_or_else(|| {
                ForecastError::ModelError(format!("Tree node index {} out of range", index))
            })?;

            let feature = match node.feature {
                Some(feature) => feature,
                None => return Ok(node.value),
            };

            let value = values.get(feature).copied().ok_or_else(|| {
                ForecastError::ModelError(format!("Feature index {} out of range", feature))
            })?;

            index = if value < node.threshold {
                node.left
            } else {
                node.right
            };
        }

        Err(ForecastError::ModelError(
            "Tree walk did not reach a leaf".to_string(),
        ))
    }
}

/// On-disk model package produced by the offline conversion step.
///
/// The training subsystem exports the trained booster as additive trees
/// plus the ordered feature list it was fitted on; this is the only model
/// format the serving side understands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPackage {
    /// Ordered feature columns the booster was trained on
    pub features: Vec<String>,
    /// Additive regression trees
    pub trees: Vec<RegressionTree>,
    /// Base prediction added to every tree sum
    #[serde(default)]
    pub base_score: f64,
}

/// Gradient-boosted tree ensemble oracle
#[derive(Debug, Clone)]
pub struct TreeEnsemble {
    name: String,
    schema: Vec<String>,
    trees: Vec<RegressionTree>,
    base_score: f64,
}

impl TreeEnsemble {
    /// Build an oracle from an in-memory model package
    pub fn new(package: ModelPackage) -> Result<Self> {
        if package.features.is_empty() {
            return Err(ForecastError::ModelError(
                "Model package has no feature columns".to_string(),
            ));
        }

        Ok(Self {
            name: format!("Gradient-boosted trees ({} trees)", package.trees.len()),
            schema: package.features,
            trees: package.trees,
            base_score: package.base_score,
        })
    }

    /// Load a converted model package from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_json_reader(file)
    }

    /// Load a converted model package from any JSON reader
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        let package: ModelPackage = serde_json::from_reader(reader)?;
        Self::new(package)
    }

    /// Number of trees in the ensemble
    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

impl ModelOracle for TreeEnsemble {
    fn feature_schema(&self) -> &[String] {
        &self.schema
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        if features.names() != self.schema.as_slice() {
            return Err(ForecastError::OracleError(
                "Feature vector does not match the model schema".to_string(),
            ));
        }

        let mut total = self.base_score;
        for tree in &self.trees {
            total += tree.output(features.values())?;
        }

        Ok(total)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
