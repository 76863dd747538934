use std::sync::Mutex;

use assert_approx_eq::assert_approx_eq;
use forecast_expense::error::Result;
use forecast_expense::features::{FeatureVector, BASE_FEATURE_NAMES};
use forecast_expense::profile::{UserContext, UserType};
use forecast_expense::{CategoryForecaster, ForecastError, ForecastParams, ModelOracle};
use pretty_assertions::assert_eq;

fn base_schema() -> Vec<String> {
    BASE_FEATURE_NAMES.iter().map(|s| s.to_string()).collect()
}

/// Oracle returning the same log-space value for every query
#[derive(Debug)]
struct FixedOracle {
    schema: Vec<String>,
    value: f64,
}

impl FixedOracle {
    fn new(value: f64) -> Self {
        Self {
            schema: base_schema(),
            value,
        }
    }
}

impl ModelOracle for FixedOracle {
    fn feature_schema(&self) -> &[String] {
        &self.schema
    }

    fn predict(&self, _features: &FeatureVector) -> Result<f64> {
        Ok(self.value)
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Oracle that fails on every query
#[derive(Debug)]
struct FailingOracle {
    schema: Vec<String>,
}

impl FailingOracle {
    fn new() -> Self {
        Self {
            schema: base_schema(),
        }
    }
}

impl ModelOracle for FailingOracle {
    fn feature_schema(&self) -> &[String] {
        &self.schema
    }

    fn predict(&self, _features: &FeatureVector) -> Result<f64> {
        Err(ForecastError::OracleError("model exploded".to_string()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Oracle recording every feature vector it is queried with
#[derive(Debug)]
struct RecordingOracle {
    schema: Vec<String>,
    value: f64,
    seen: Mutex<Vec<FeatureVector>>,
}

impl RecordingOracle {
    fn new(value: f64) -> Self {
        Self::with_schema(value, base_schema())
    }

    fn with_schema(value: f64, schema: Vec<String>) -> Self {
        Self {
            schema,
            value,
            seen: Mutex::new(Vec::new()),
        }
    }

    fn seen(&self) -> Vec<FeatureVector> {
        self.seen.lock().unwrap().clone()
    }
}

impl ModelOracle for RecordingOracle {
    fn feature_schema(&self) -> &[String] {
        &self.schema
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        self.seen.lock().unwrap().push(features.clone());
        Ok(self.value)
    }

    fn name(&self) -> &str {
        "recording"
    }
}

#[test]
fn returns_exactly_horizon_non_negative_values() {
    let forecaster = CategoryForecaster::new(FixedOracle::new(1150.0_f64.ln_1p()));
    let ctx = UserContext::default();
    let predictions = forecaster
        .forecast(&[1000.0, 1200.0, 1100.0], 5, 6, &ctx)
        .unwrap();

    assert_eq!(predictions.len(), 5);
    assert!(predictions.iter().all(|p| *p >= 0.0));
}

#[test]
fn zero_horizon_short_circuits_without_model_calls() {
    let forecaster = CategoryForecaster::new(FailingOracle::new());
    let ctx = UserContext::default();

    let predictions = forecaster.forecast(&[500.0, 600.0], 0, 6, &ctx).unwrap();
    assert_eq!(predictions, Vec::<f64>::new());
}

#[test]
fn empty_series_short_circuits_without_model_calls() {
    let forecaster = CategoryForecaster::new(FailingOracle::new());
    let ctx = UserContext::default();

    let predictions = forecaster.forecast(&[], 4, 6, &ctx).unwrap();
    assert_eq!(predictions, vec![0.0; 4]);
}

#[test]
fn repeated_forecasts_are_bit_identical() {
    let forecaster = CategoryForecaster::new(FixedOracle::new(1150.0_f64.ln_1p()));
    let ctx = UserContext::new(UserType::FamilyModerate, 12_000.0);
    let series = [900.0, 1100.0, 1000.0, 1200.0];

    let first = forecaster.forecast(&series, 6, 3, &ctx).unwrap();
    let second = forecaster.forecast(&series, 6, 3, &ctx).unwrap();

    assert_eq!(first, second);
}

#[test]
fn reproduces_the_fixed_oracle_transform_exactly() {
    // With a constant oracle the only step-to-step differences are the
    // deterministic jitter factors.
    let value = 1150.0_f64.ln_1p();
    let forecaster = CategoryForecaster::new(FixedOracle::new(value));
    let ctx = UserContext::default();
    let predictions = forecaster
        .forecast(&[1000.0, 1200.0, 1100.0], 3, 6, &ctx)
        .unwrap();

    let params = ForecastParams::default();
    let raw = value.exp_m1();
    for (step, prediction) in predictions.iter().enumerate() {
        let expected = (raw * params.jitter_factor(step) * 100.0).round() / 100.0;
        assert_eq!(*prediction, expected, "step {}", step);
    }
    // Step 0 is never jittered
    assert_eq!(predictions[0], 1150.0);
}

#[test]
fn clamps_runaway_predictions_to_recent_average_bounds() {
    // avg3 of the input is 1100, so the stability band is [330, 2200]
    let forecaster = CategoryForecaster::new(FixedOracle::new(100_000.0_f64.ln_1p()));
    let ctx = UserContext::default();
    let predictions = forecaster
        .forecast(&[1000.0, 1200.0, 1100.0], 4, 6, &ctx)
        .unwrap();

    let params = ForecastParams::default();
    assert_eq!(predictions[0], 2200.0);
    for (step, prediction) in predictions.iter().enumerate() {
        let lower = 330.0 * (1.0 - params.jitter_amplitude);
        let upper = 2200.0 * (1.0 + params.jitter_amplitude);
        assert!(
            (lower..=upper).contains(prediction),
            "step {} out of band: {}",
            step,
            prediction
        );
    }
}

#[test]
fn clamps_collapsed_predictions_to_the_floor() {
    let forecaster = CategoryForecaster::new(FixedOracle::new(1.0_f64.ln_1p()));
    let ctx = UserContext::default();
    let predictions = forecaster
        .forecast(&[1000.0, 1200.0, 1100.0], 1, 6, &ctx)
        .unwrap();

    assert_eq!(predictions[0], 330.0);
}

#[test]
fn short_series_skips_the_stability_clamp() {
    let value = 10_000.0_f64.ln_1p();
    let forecaster = CategoryForecaster::new(FixedOracle::new(value));
    let ctx = UserContext::default();
    let predictions = forecaster.forecast(&[500.0], 2, 6, &ctx).unwrap();

    // Far outside any 3-month band, but the one-point history disables it
    let params = ForecastParams::default();
    assert_eq!(predictions[0], 10_000.0);
    let expected = (value.exp_m1() * params.jitter_factor(1) * 100.0).round() / 100.0;
    assert_eq!(predictions[1], expected);
}

#[test]
fn forecast_months_wrap_around_the_calendar() {
    let oracle = RecordingOracle::new(500.0_f64.ln_1p());
    let forecaster = CategoryForecaster::new(oracle);
    let ctx = UserContext::default();
    forecaster
        .forecast(&[400.0, 450.0, 500.0], 3, 11, &ctx)
        .unwrap();

    let months: Vec<f64> = forecaster
        .oracle()
        .seen()
        .iter()
        .map(|vector| vector.get("month_num").unwrap())
        .collect();
    assert_eq!(months, vec![11.0, 12.0, 1.0]);
}

#[test]
fn later_steps_blend_prior_predictions_toward_history() {
    let value = 1150.0_f64.ln_1p();
    let oracle = RecordingOracle::new(value);
    let forecaster = CategoryForecaster::new(oracle);
    let ctx = UserContext::default();
    forecaster
        .forecast(&[1000.0, 1200.0, 1100.0], 2, 6, &ctx)
        .unwrap();

    let seen = forecaster.oracle().seen();
    assert_eq!(seen.len(), 2);

    // Step 0 sees only the raw history
    assert_approx_eq!(seen[0].get("lag_1").unwrap(), 1100.0_f64.ln_1p());

    // Step 1's newest point is the blended prior prediction: the first
    // output is 1150.00 (inside the stability band, unjittered), pulled
    // toward avg3 = 1100 with weights 0.85/0.15.
    let blended: f64 = 0.85 * 1100.0 + 0.15 * 1150.0;
    assert_approx_eq!(seen[1].get("lag_1").unwrap(), blended.ln_1p());
    assert_approx_eq!(seen[1].get("lag_2").unwrap(), 1100.0_f64.ln_1p());
}

#[test]
fn short_series_appends_predictions_unblended() {
    let value = 700.0_f64.ln_1p();
    let oracle = RecordingOracle::new(value);
    let forecaster = CategoryForecaster::new(oracle);
    let ctx = UserContext::default();
    let predictions = forecaster.forecast(&[500.0, 600.0], 2, 6, &ctx).unwrap();

    let seen = forecaster.oracle().seen();
    // Fewer than 3 historical points: the working series extends as-is
    assert_approx_eq!(seen[1].get("lag_1").unwrap(), predictions[0].ln_1p());
}

#[test]
fn category_label_reaches_the_feature_vector() {
    let mut schema = base_schema();
    schema.push("Category_Food".to_string());
    let oracle = RecordingOracle::with_schema(600.0_f64.ln_1p(), schema);
    let forecaster = CategoryForecaster::new(oracle);
    let ctx = UserContext::default();
    forecaster
        .forecast_category("Food", &[500.0, 550.0, 600.0], 1, 6, &ctx)
        .unwrap();

    let seen = forecaster.oracle().seen();
    assert_eq!(seen[0].get("Category_Food"), Some(1.0));
}

#[test]
fn oracle_failures_propagate() {
    let forecaster = CategoryForecaster::new(FailingOracle::new());
    let ctx = UserContext::default();
    let result = forecaster.forecast(&[500.0, 600.0], 2, 6, &ctx);

    assert!(matches!(result, Err(ForecastError::OracleError(_))));
}

#[test]
fn non_finite_oracle_output_is_rejected() {
    let forecaster = CategoryForecaster::new(FixedOracle::new(f64::NAN));
    let ctx = UserContext::default();
    let result = forecaster.forecast(&[500.0, 600.0], 2, 6, &ctx);

    assert!(matches!(result, Err(ForecastError::OracleError(_))));
}

#[test]
fn rejects_out_of_range_anchor_months() {
    let forecaster = CategoryForecaster::new(FixedOracle::new(1.0));
    let ctx = UserContext::default();

    for month in [0, 13] {
        let result = forecaster.forecast(&[500.0], 1, month, &ctx);
        assert!(matches!(result, Err(ForecastError::InvalidParameter(_))));
    }
}

#[test]
fn jitter_factor_is_a_pure_function_of_the_step() {
    let params = ForecastParams::default();

    assert_eq!(params.jitter_factor(0), 1.0);
    for step in 1..10 {
        let factor = params.jitter_factor(step);
        assert_eq!(factor, params.jitter_factor(step));
        assert!(factor >= 1.0 - params.jitter_amplitude);
        assert!(factor <= 1.0 + params.jitter_amplitude);
    }

    let still = ForecastParams {
        jitter_amplitude: 0.0,
        ..ForecastParams::default()
    };
    assert_eq!(still.jitter_factor(5), 1.0);
}

#[test]
fn parameter_validation_rejects_bad_configurations() {
    let defaults = ForecastParams::default();
    assert!(defaults.validate().is_ok());

    let bad_weights = ForecastParams {
        history_weight: 0.9,
        prediction_weight: 0.2,
        ..defaults
    };
    assert!(bad_weights.validate().is_err());

    let inverted_clamp = ForecastParams {
        clamp_floor: 2.0,
        clamp_ceil: 0.3,
        ..defaults
    };
    assert!(inverted_clamp.validate().is_err());

    let wild_jitter = ForecastParams {
        jitter_amplitude: 1.5,
        ..defaults
    };
    assert!(wild_jitter.validate().is_err());

    assert!(matches!(
        CategoryForecaster::with_params(FixedOracle::new(1.0), bad_weights),
        Err(ForecastError::InvalidParameter(_))
    ));
}

#[test]
fn custom_parameters_change_the_stability_band() {
    let params = ForecastParams {
        clamp_floor: 0.5,
        clamp_ceil: 1.5,
        jitter_amplitude: 0.0,
        ..ForecastParams::default()
    };
    let forecaster =
        CategoryForecaster::with_params(FixedOracle::new(100_000.0_f64.ln_1p()), params).unwrap();
    let ctx = UserContext::default();
    let predictions = forecaster
        .forecast(&[1000.0, 1200.0, 1100.0], 2, 6, &ctx)
        .unwrap();

    // avg3 = 1100, ceiling 1.5x, no jitter
    assert_eq!(predictions, vec![1650.0, 1650.0]);
}
