//! Per-category recursive forecast loop

use chrono::Datelike;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::data::{from_log_space, recent_mean, to_log_space};
use crate::error::{ForecastError, Result};
use crate::features;
use crate::oracle::ModelOracle;
use crate::profile::UserContext;

/// Tunable constants of the forecast loop.
///
/// The defaults are the empirically chosen production values; they are kept
/// as data rather than literals so they can be retuned without touching the
/// loop itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastParams {
    /// Weight of the recent historical mean when a prior prediction is
    /// blended back into the feature input series
    pub history_weight: f64,
    /// Weight of the prior prediction itself
    pub prediction_weight: f64,
    /// Lower stability bound, as a multiple of the recent 3-month average
    pub clamp_floor: f64,
    /// Upper stability bound, as a multiple of the recent 3-month average
    pub clamp_ceil: f64,
    /// Half-width of the multiplicative jitter band (0.03 = ±3%)
    pub jitter_amplitude: f64,
    /// Base value the per-step jitter seed is derived from
    pub jitter_seed: u64,
}

impl Default for ForecastParams {
    fn default() -> Self {
        Self {
            history_weight: 0.85,
            prediction_weight: 0.15,
            clamp_floor: 0.3,
            clamp_ceil: 2.0,
            jitter_amplitude: 0.03,
            jitter_seed: 42,
        }
    }
}

impl ForecastParams {
    /// Validate the parameter set
    pub fn validate(&self) -> Result<()> {
        if self.history_weight < 0.0
            || self.prediction_weight < 0.0
            || (self.history_weight + self.prediction_weight - 1.0).abs() > 1e-9
        {
            return Err(ForecastError::InvalidParameter(
                "Blend weights must be non-negative and sum to 1".to_string(),
            ));
        }
        if self.clamp_floor < 0.0 || self.clamp_floor >= self.clamp_ceil {
            return Err(ForecastError::InvalidParameter(
                "Clamp floor must be non-negative and below the ceiling".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.jitter_amplitude) {
            return Err(ForecastError::InvalidParameter(
                "Jitter amplitude must be in [0, 1)".to_string(),
            ));
        }
        Ok(())
    }

    /// Multiplicative jitter factor for one forecast step.
    ///
    /// A pure function of the step index: step 0 is never jittered; later
    /// steps draw a uniform factor in ±amplitude from an RNG seeded with
    /// `jitter_seed + step`, so repeated forecasts are bit-identical. The
    /// perturbation only keeps consecutive forecast months from looking
    /// identical; it carries no statistical meaning.
    pub fn jitter_factor(&self, step: usize) -> f64 {
        if step == 0 || self.jitter_amplitude == 0.0 {
            return 1.0;
        }
        let mut rng = StdRng::seed_from_u64(self.jitter_seed + step as u64);
        1.0 + rng.gen_range(-self.jitter_amplitude..=self.jitter_amplitude)
    }
}

/// Drives the recursive multi-step forecast for a single category.
///
/// Each step builds a feature vector from the log-space working series,
/// queries the oracle for a log-space prediction, converts back to currency
/// units, applies the stability bounds and jitter, and folds the result
/// into the series the next step sees. Steps are strictly sequential.
#[derive(Debug)]
pub struct CategoryForecaster<O: ModelOracle> {
    oracle: O,
    params: ForecastParams,
}

impl<O: ModelOracle> CategoryForecaster<O> {
    /// Create a forecaster with default parameters
    pub fn new(oracle: O) -> Self {
        Self {
            oracle,
            params: ForecastParams::default(),
        }
    }

    /// Create a forecaster with custom parameters
    pub fn with_params(oracle: O, params: ForecastParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { oracle, params })
    }

    /// The oracle backing this forecaster
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// The active parameter set
    pub fn params(&self) -> &ForecastParams {
        &self.params
    }

    /// Forecast `horizon` future monthly totals for one category.
    ///
    /// `series` holds past monthly totals in currency units, oldest first.
    /// `anchor_month` is the 1-based calendar month the first forecast step
    /// lands on. An empty series yields zeros and a zero horizon an empty
    /// sequence, in both cases without querying the oracle. Oracle failures
    /// propagate; no retry or substitute model is attempted.
    pub fn forecast(
        &self,
        series: &[f64],
        horizon: usize,
        anchor_month: u32,
        ctx: &UserContext,
    ) -> Result<Vec<f64>> {
        self.forecast_inner(None, series, horizon, anchor_month, ctx)
    }

    /// Forecast one category by name, emitting its indicator feature for
    /// schemas trained with category columns
    pub fn forecast_category(
        &self,
        category: &str,
        series: &[f64],
        horizon: usize,
        anchor_month: u32,
        ctx: &UserContext,
    ) -> Result<Vec<f64>> {
        self.forecast_inner(Some(category), series, horizon, anchor_month, ctx)
    }

    /// Forecast anchored on the wall-clock month
    pub fn forecast_now(&self, series: &[f64], horizon: usize, ctx: &UserContext) -> Result<Vec<f64>> {
        self.forecast(series, horizon, chrono::Local::now().month(), ctx)
    }

    fn forecast_inner(
        &self,
        category: Option<&str>,
        series: &[f64],
        horizon: usize,
        anchor_month: u32,
        ctx: &UserContext,
    ) -> Result<Vec<f64>> {
        if !(1..=12).contains(&anchor_month) {
            return Err(ForecastError::InvalidParameter(format!(
                "Anchor month must be in 1..=12, got {}",
                anchor_month
            )));
        }
        if horizon == 0 {
            return Ok(Vec::new());
        }
        if series.is_empty() {
            return Ok(vec![0.0; horizon]);
        }

        debug!(
            category = category.unwrap_or("uncategorized"),
            history = series.len(),
            horizon,
            "starting category forecast"
        );

        let schema = self.oracle.feature_schema();
        let history_log = to_log_space(series);
        // Recent raw-currency average over the immutable input; anchors both
        // the blend and the stability bounds for every step.
        let recent_avg = recent_mean(series, 3);
        let stabilize = series.len() >= 3;

        let mut predictions: Vec<f64> = Vec::with_capacity(horizon);

        for step in 0..horizon {
            let mut input = history_log.clone();
            if step > 0 && stabilize {
                // Prior predictions re-enter the lag features pulled toward
                // the recent historical mean, damping compounding drift.
                input.extend(predictions.iter().map(|p| {
                    (self.params.history_weight * recent_avg + self.params.prediction_weight * p)
                        .ln_1p()
                }));
            } else {
                input.extend(predictions.iter().map(|p| p.ln_1p()));
            }

            let month = (anchor_month - 1 + step as u32) % 12 + 1;
            let vector = features::build(&input, month, ctx, category, schema);

            let predicted_log = self.oracle.predict(&vector)?;
            if !predicted_log.is_finite() {
                return Err(ForecastError::OracleError(format!(
                    "Non-finite model output {} at step {}",
                    predicted_log, step
                )));
            }

            let mut amount = from_log_space(predicted_log);
            if stabilize {
                let floor = self.params.clamp_floor * recent_avg;
                let ceil = self.params.clamp_ceil * recent_avg;
                if amount < floor || amount > ceil {
                    warn!(step, amount, floor, ceil, "clamping unstable prediction");
                    amount = amount.clamp(floor, ceil);
                }
            }

            amount *= self.params.jitter_factor(step);
            amount = amount.max(0.0);

            predictions.push(round_currency(amount));
        }

        Ok(predictions)
    }
}

/// Round to 2 decimal places (currency cents)
fn round_currency(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
