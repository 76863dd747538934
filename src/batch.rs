//! Batch coordination across spending categories

use std::collections::BTreeMap;

use chrono::Datelike;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ForecastError, Result};
use crate::forecaster::{CategoryForecaster, ForecastParams};
use crate::oracle::ModelOracle;
use crate::profile::{UserContext, UserType};

/// A multi-category forecast request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    /// Historical monthly totals per category, oldest first
    pub categories: BTreeMap<String, Vec<f64>>,
    /// Number of future months to forecast
    pub horizon: usize,
    /// Declared total monthly budget
    #[serde(default)]
    pub total_budget: f64,
    /// Declared user archetype
    #[serde(default)]
    pub user_type: UserType,
}

impl ForecastRequest {
    /// User context view of the request
    pub fn context(&self) -> UserContext {
        UserContext::new(self.user_type, self.total_budget)
    }
}

/// A multi-category forecast response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchForecast {
    /// Predicted monthly totals per category, `horizon` entries each
    pub categories: BTreeMap<String, Vec<f64>>,
    /// Element-wise sum across categories, `horizon` entries
    pub total: Vec<f64>,
    /// Per-category failure messages; empty when every category succeeded.
    /// Failed categories report zero-filled predictions.
    pub errors: BTreeMap<String, String>,
}

impl BatchForecast {
    /// Whether every category forecast succeeded
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Fans a forecast request out to independent per-category runs.
///
/// Categories share no state beyond the read-only oracle, so they run in
/// parallel and are reduced into the element-wise total afterwards. A
/// category whose forecast fails is reported in the error map with
/// zero-filled predictions; the remaining categories and the total are
/// unaffected.
#[derive(Debug)]
pub struct BatchForecastCoordinator<O: ModelOracle> {
    forecaster: CategoryForecaster<O>,
}

impl<O: ModelOracle> BatchForecastCoordinator<O> {
    /// Create a coordinator with default forecast parameters
    pub fn new(oracle: O) -> Self {
        Self {
            forecaster: CategoryForecaster::new(oracle),
        }
    }

    /// Create a coordinator with custom forecast parameters
    pub fn with_params(oracle: O, params: ForecastParams) -> Result<Self> {
        Ok(Self {
            forecaster: CategoryForecaster::with_params(oracle, params)?,
        })
    }

    /// The per-category forecaster backing this coordinator
    pub fn forecaster(&self) -> &CategoryForecaster<O> {
        &self.forecaster
    }

    /// Forecast every category in the request, anchored on `anchor_month`
    pub fn forecast_batch(
        &self,
        request: &ForecastRequest,
        anchor_month: u32,
    ) -> Result<BatchForecast> {
        if !(1..=12).contains(&anchor_month) {
            return Err(ForecastError::InvalidParameter(format!(
                "Anchor month must be in 1..=12, got {}",
                anchor_month
            )));
        }

        debug!(
            categories = request.categories.len(),
            horizon = request.horizon,
            "starting batch forecast"
        );

        let ctx = request.context();
        let horizon = request.horizon;

        let outcomes: Vec<(String, std::result::Result<Vec<f64>, String>)> = request
            .categories
            .par_iter()
            .map(|(name, series)| {
                let outcome = self
                    .forecaster
                    .forecast_category(name, series, horizon, anchor_month, &ctx)
                    .map_err(|e| e.to_string());
                (name.clone(), outcome)
            })
            .collect();

        let mut categories = BTreeMap::new();
        let mut errors = BTreeMap::new();
        let mut total = vec![0.0; horizon];

        for (name, outcome) in outcomes {
            match outcome {
                Ok(values) => {
                    for (slot, value) in total.iter_mut().zip(values.iter()) {
                        *slot += value;
                    }
                    categories.insert(name, values);
                }
                Err(message) => {
                    warn!(category = %name, %message, "category forecast failed");
                    errors.insert(name.clone(), message);
                    categories.insert(name, vec![0.0; horizon]);
                }
            }
        }

        Ok(BatchForecast {
            categories,
            total,
            errors,
        })
    }

    /// Forecast anchored on the wall-clock month
    pub fn forecast_batch_now(&self, request: &ForecastRequest) -> Result<BatchForecast> {
        self.forecast_batch(request, chrono::Local::now().month())
    }
}
