//! # Forecast Expense
//!
//! A Rust library for forecasting a user's future monthly expenses, per
//! spending category, from a short history of monthly totals.
//!
//! ## Features
//!
//! - Log-space lag, rolling-average, trend, and seasonality features with
//!   fixed-schema projection
//! - Recursive multi-step forecasting with stability clamping, blended
//!   historical extrapolation, and deterministic jitter
//! - Batch coordination across categories with per-category failure
//!   isolation
//! - Pluggable model oracles: a gradient-boosted tree package converted
//!   offline, or a recent-mean statistical baseline
//! - CSV transaction-log ingestion into aligned monthly category totals
//!
//! ## Quick Start
//!
//! ```rust
//! use forecast_expense::batch::{BatchForecastCoordinator, ForecastRequest};
//! use forecast_expense::oracle::RecentMeanOracle;
//! use forecast_expense::profile::UserType;
//! use std::collections::BTreeMap;
//!
//! let mut categories = BTreeMap::new();
//! categories.insert("Food".to_string(), vec![1200.0, 1350.0, 1280.0]);
//! categories.insert("Transport".to_string(), vec![300.0, 280.0, 310.0]);
//!
//! let request = ForecastRequest {
//!     categories,
//!     horizon: 3,
//!     total_budget: 8000.0,
//!     user_type: UserType::YoungProfessional,
//! };
//!
//! let coordinator = BatchForecastCoordinator::new(RecentMeanOracle::new());
//! let forecast = coordinator.forecast_batch(&request, 6).unwrap();
//!
//! assert_eq!(forecast.total.len(), 3);
//! assert!(forecast.is_clean());
//! ```

pub mod batch;
pub mod data;
pub mod error;
pub mod features;
pub mod forecaster;
pub mod oracle;
pub mod profile;

// Re-export commonly used types
pub use crate::batch::{BatchForecast, BatchForecastCoordinator, ForecastRequest};
pub use crate::error::ForecastError;
pub use crate::features::FeatureVector;
pub use crate::forecaster::{CategoryForecaster, ForecastParams};
pub use crate::oracle::ModelOracle;
pub use crate::profile::{BudgetTier, UserContext, UserType};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
