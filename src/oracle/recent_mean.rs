//! Statistical baseline oracle used when no trained model is available

use crate::error::{ForecastError, Result};
use crate::features::{FeatureVector, BASE_FEATURE_NAMES};
use crate::oracle::ModelOracle;

/// Baseline oracle that continues the recent log-space mean.
///
/// Returns the `Rolling3` feature, optionally shifted by a constant
/// log-space drift, so the full pipeline (clamping, jitter, rounding,
/// batching) runs end-to-end before a trained model package is deployed.
#[derive(Debug, Clone)]
pub struct RecentMeanOracle {
    name: String,
    schema: Vec<String>,
    drift: f64,
}

impl Default for RecentMeanOracle {
    fn default() -> Self {
        Self {
            name: "Recent-mean baseline".to_string(),
            schema: BASE_FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            drift: 0.0,
        }
    }
}

impl RecentMeanOracle {
    /// Create a baseline oracle with no drift
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a baseline oracle with a constant log-space drift added to
    /// every prediction
    pub fn with_drift(drift: f64) -> Result<Self> {
        if !drift.is_finite() {
            return Err(ForecastError::InvalidParameter(
                "Drift must be finite".to_string(),
            ));
        }

        Ok(Self {
            name: format!("Recent-mean baseline (drift={})", drift),
            drift,
            ..Self::default()
        })
    }
}

impl ModelOracle for RecentMeanOracle {
    fn feature_schema(&self) -> &[String] {
        &self.schema
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        let rolling_3 = features.get("Rolling3").ok_or_else(|| {
            ForecastError::OracleError("Feature vector is missing Rolling3".to_string())
        })?;

        Ok(rolling_3 + self.drift)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
