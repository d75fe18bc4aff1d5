//! # Stock Forecast
//!
//! A Rust library for business-day aware stock price forecasting.
//!
//! ## Features
//!
//! - Business calendar engine: regional holiday sets and "N business days
//!   from a date" advances that skip weekends and public holidays
//! - Lagged-feature engineering with training and recursive inference modes
//! - Time-ordered train/validation/test splits with MAE/RMSE scoring
//! - Two model families behind one interface: a seasonal trend/weekly
//!   decomposition and gradient-boosted regression trees
//! - Hyperparameter grid search with rolling-origin cross-validation
//! - An orchestrator that blends observed history with predicted future
//!   points into one chronologically ordered series for charting
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stock_forecast::data::{DataLoader, PriceProvider, PriceSeries};
//! use stock_forecast::forecast::{to_json_records, ForecastConfig, Forecaster};
//!
//! struct CsvProvider;
//!
//! impl PriceProvider for CsvProvider {
//!     fn fetch(
//!         &self,
//!         _ticker: &str,
//!         _start: chrono::NaiveDate,
//!         _end: chrono::NaiveDate,
//!     ) -> stock_forecast::Result<PriceSeries> {
//!         DataLoader::from_csv("prices.csv")
//!     }
//! }
//!
//! # fn main() -> stock_forecast::Result<()> {
//! let forecaster = Forecaster::new(CsvProvider, ForecastConfig::default());
//! let points = forecaster.forecast("TLS.AX")?;
//! let json = to_json_records(&points)?;
//! # Ok(())
//! # }
//! ```

pub mod calendar;
pub mod data;
pub mod error;
pub mod features;
pub mod forecast;
pub mod models;
pub mod split;
pub mod tuning;

// Re-export commonly used types
pub use crate::calendar::{add_business_days, HolidayCache, HolidaySet, Region};
pub use crate::data::{DataLoader, PriceProvider, PriceSeries};
pub use crate::error::{ForecastError, Result};
pub use crate::features::{build_training_table, FeatureTable};
pub use crate::forecast::{ForecastConfig, ForecastPoint, Forecaster};
pub use crate::models::{ModelParams, TrainedModel};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
