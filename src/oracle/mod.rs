//! Model oracle interface and implementations

use crate::error::Result;
use crate::features::FeatureVector;

/// Opaque trained regression model queried once per forecast step.
///
/// Implementations predict a single log-space value from a feature vector
/// aligned to their schema, are loaded once at startup, and are shared
/// read-only across concurrent category forecasts.
pub trait ModelOracle: Send + Sync {
    /// The exact feature column order the model expects
    fn feature_schema(&self) -> &[String];

    /// Predict a single log-space value from a schema-aligned feature vector
    fn predict(&self, features: &FeatureVector) -> Result<f64>;

    /// Name of the model
    fn name(&self) -> &str;
}

pub mod recent_mean;
pub mod tree_ensemble;

pub use recent_mean::RecentMeanOracle;
pub use tree_ensemble::{ModelPackage, RegressionTree, TreeEnsemble, TreeNode};
