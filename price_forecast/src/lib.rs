//! # Price Forecast
//!
//! A Rust library for forecasting regional daily commodity prices.
//!
//! ## Features
//!
//! - Loading wide price tables (one row per region, one column per day)
//! - Cleaning: token parsing, daily reindexing, forward/backward fill
//! - Merging several sources with later sources taking precedence
//! - Lag and Eid al-Fitr holiday features
//! - A random forest regressor with hold-out evaluation (RMSE, MAPE)
//! - Recursive multi-step forecasts of up to 180 days
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use price_forecast::config::PipelineConfig;
//! use price_forecast::forecast::Horizon;
//! use price_forecast::pipeline::TrainingPipeline;
//!
//! fn main() -> price_forecast::error::Result<()> {
//!     let config = PipelineConfig::default();
//!     let pipeline = TrainingPipeline::new(config.clone())?;
//!
//!     // Later files override earlier ones for the same region and day
//!     let mut artifacts = pipeline.run_files(
//!         &["prices_2022.csv", "prices_2023.csv"],
//!         config.random_forest(),
//!     )?;
//!     println!("{}", artifacts.metrics);
//!
//!     // Thirty days for a single region
//!     let forecast = artifacts.forecast(Horizon::new(30)?, Some("Jawa Barat"))?;
//!     for point in forecast.points() {
//!         println!("{} {} {}", point.date, point.region, point.predicted_price);
//!     }
//!     Ok(())
//! }
//! ```

pub mod clean;
pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod forecast;
pub mod merge;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod train;

// Re-export commonly used types
pub use crate::config::PipelineConfig;
pub use crate::data::{DataLoader, PriceObservation, WideTable};
pub use crate::error::ForecastError;
pub use crate::features::{FeatureTable, FeatureTransformer, RegionEncoding};
pub use crate::forecast::{ForecastPoint, ForecastTable, Forecaster, Horizon};
pub use crate::metrics::EvaluationMetrics;
pub use crate::models::random_forest::{ForestParams, RandomForestRegressor};
pub use crate::models::Regressor;
pub use crate::pipeline::{TrainingArtifacts, TrainingPipeline};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
