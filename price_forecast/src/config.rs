//! Pipeline configuration
//!
//! Every field has a default, so a configuration file only needs the values
//! it overrides:
//!
//! ```json
//! {
//!   "train_fraction": 0.85,
//!   "forest": { "n_estimators": 100, "n_jobs": 4 },
//!   "observed_holidays": { "1445": "2024-04-10" }
//! }
//! ```

use crate::error::{ForecastError, Result};
use crate::forecast::{Forecaster, Horizon, MIN_WINDOW};
use crate::models::random_forest::{ForestParams, RandomForestRegressor};
use crate::train::{Trainer, DEFAULT_TRAIN_FRACTION};
use chrono::NaiveDate;
use hijri_calendar::HolidayCalendar;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Settings for a training run and the forecasts derived from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Share of feature rows used for fitting during evaluation
    pub train_fraction: f64,
    /// Random forest hyperparameters
    pub forest: ForestParams,
    /// Prices kept per region while forecasting
    pub forecast_window: usize,
    /// Horizon of the forecast produced by a training run
    pub default_horizon: u32,
    /// Observed holiday dates keyed by Hijri year
    pub observed_holidays: BTreeMap<i32, NaiveDate>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            train_fraction: DEFAULT_TRAIN_FRACTION,
            forest: ForestParams::default(),
            forecast_window: MIN_WINDOW,
            default_horizon: Horizon::MAX,
            observed_holidays: BTreeMap::new(),
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check every setting
    pub fn validate(&self) -> Result<()> {
        self.trainer()?;
        self.forecaster()?;
        self.horizon()?;
        self.forest.validate()?;
        if let Some((year, _)) = self.observed_holidays.iter().find(|(year, _)| **year < 1) {
            return Err(ForecastError::InvalidParameter(format!(
                "observed holiday for invalid Hijri year {}",
                year
            )));
        }
        Ok(())
    }

    /// Holiday calendar with the observed overrides applied
    pub fn holiday_calendar(&self) -> HolidayCalendar {
        HolidayCalendar::eid_al_fitr().with_observed_dates(self.observed_holidays.clone())
    }

    pub fn trainer(&self) -> Result<Trainer> {
        Trainer::new(self.train_fraction)
    }

    pub fn forecaster(&self) -> Result<Forecaster> {
        Forecaster::new(self.holiday_calendar(), self.forecast_window)
    }

    pub fn horizon(&self) -> Result<Horizon> {
        Horizon::new(self.default_horizon)
    }

    /// Unfitted random forest with the configured hyperparameters
    pub fn random_forest(&self) -> RandomForestRegressor {
        RandomForestRegressor::new(self.forest.clone())
    }
}
