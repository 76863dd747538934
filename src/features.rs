//! Feature construction and schema projection for the expense model

use crate::profile::{BudgetTier, UserContext, UserType};

/// Denominator guard for ratio features
const EPSILON: f64 = 1e-9;

/// Ordered list of base (non-indicator) feature names.
///
/// This order must match the column order used by the training pipeline;
/// indicator columns (`Category_*`, `UserType_*`, `budget_category_*`)
/// follow it in a trained schema. Any change here is a breaking change for
/// deployed model packages.
pub const BASE_FEATURE_NAMES: &[&str] = &[
    "lag_1",
    "lag_2",
    "lag_3",
    "lag_12",
    "Rolling3",
    "Rolling6",
    "Rolling12",
    "trend_3",
    "pct_change",
    "month_total",
    "category_ratio",
    "month_num",
    "month_sin",
    "month_cos",
    "log_total_budget",
    "spend_ratio",
];

/// Feature vector aligned to a model's schema
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    names: Vec<String>,
    values: Vec<f64>,
}

impl FeatureVector {
    /// Feature names, in schema order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Feature values, in schema order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of features
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the vector has no features
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a named feature, if present
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|index| self.values[index])
    }
}

/// Mean of the trailing `window` log-space points, 0 when the series is empty
fn tail_mean(series: &[f64], window: usize) -> f64 {
    if series.is_empty() {
        return 0.0;
    }
    let tail = &series[series.len().saturating_sub(window)..];
    tail.iter().sum::<f64>() / tail.len() as f64
}

/// Compute the full candidate feature set for one forecast step.
///
/// `series_log` is the log-space series (oldest first) and `month_index`
/// the 1-based calendar month the step lands on. Short histories degrade
/// to flat-continuation fallbacks: lags reaching past the series start
/// fall back to the latest value, and each rolling window falls back to
/// the next shorter one. An empty series produces all-zero series
/// features. This function never fails.
pub fn compute(
    series_log: &[f64],
    month_index: u32,
    ctx: &UserContext,
    category: Option<&str>,
) -> Vec<(String, f64)> {
    let n = series_log.len();
    let last = if n > 0 { series_log[n - 1] } else { 0.0 };

    let lag_1 = last;
    let lag_2 = if n > 1 { series_log[n - 2] } else { last };
    let lag_3 = if n > 2 { series_log[n - 3] } else { last };
    let lag_12 = if n > 11 { series_log[n - 12] } else { last };

    let rolling_3 = tail_mean(series_log, 3);
    let rolling_6 = if n >= 6 {
        tail_mean(series_log, 6)
    } else {
        rolling_3
    };
    let rolling_12 = if n >= 12 {
        tail_mean(series_log, 12)
    } else {
        rolling_6
    };

    let trend_3 = if n > 3 { last - series_log[n - 3] } else { 0.0 };
    let pct_change = if n > 1 {
        (last - series_log[n - 2]) / (series_log[n - 2].abs() + EPSILON)
    } else {
        0.0
    };

    let month_total: f64 = series_log[n.saturating_sub(3)..].iter().sum();
    let category_ratio = last / (month_total + EPSILON);

    let month = month_index as f64;
    let month_sin = (2.0 * std::f64::consts::PI * month / 12.0).sin();
    let month_cos = (2.0 * std::f64::consts::PI * month / 12.0).cos();

    let log_total_budget = ctx.total_budget.max(0.0).ln_1p();
    let spend_ratio = lag_1 / (log_total_budget + EPSILON);

    let mut features: Vec<(String, f64)> = vec![
        ("lag_1".to_string(), lag_1),
        ("lag_2".to_string(), lag_2),
        ("lag_3".to_string(), lag_3),
        ("lag_12".to_string(), lag_12),
        ("Rolling3".to_string(), rolling_3),
        ("Rolling6".to_string(), rolling_6),
        ("Rolling12".to_string(), rolling_12),
        ("trend_3".to_string(), trend_3),
        ("pct_change".to_string(), pct_change),
        ("month_total".to_string(), month_total),
        ("category_ratio".to_string(), category_ratio),
        ("month_num".to_string(), month),
        ("month_sin".to_string(), month_sin),
        ("month_cos".to_string(), month_cos),
        ("log_total_budget".to_string(), log_total_budget),
        ("spend_ratio".to_string(), spend_ratio),
    ];

    let tier = BudgetTier::from_budget(ctx.total_budget);
    for candidate in BudgetTier::ALL {
        let value = if candidate == tier { 1.0 } else { 0.0 };
        features.push((candidate.feature_name(), value));
    }

    for candidate in UserType::ALL {
        let value = if candidate == ctx.user_type { 1.0 } else { 0.0 };
        features.push((candidate.feature_name(), value));
    }

    if let Some(name) = category {
        features.push((format!("Category_{}", name), 1.0));
    }

    features
}

/// Project computed features onto an oracle's schema.
///
/// The result has exactly the schema's names and order: names the
/// computation did not produce are filled with 0, computed names the
/// schema does not list are dropped.
pub fn project(computed: &[(String, f64)], schema: &[String]) -> FeatureVector {
    let values = schema
        .iter()
        .map(|name| {
            computed
                .iter()
                .find(|(candidate, _)| candidate == name)
                .map(|(_, value)| *value)
                .unwrap_or(0.0)
        })
        .collect();

    FeatureVector {
        names: schema.to_vec(),
        values,
    }
}

/// Compute and project in one step
pub fn build(
    series_log: &[f64],
    month_index: u32,
    ctx: &UserContext,
    category: Option<&str>,
    schema: &[String],
) -> FeatureVector {
    project(&compute(series_log, month_index, ctx, category), schema)
}
