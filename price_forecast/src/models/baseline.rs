//! Naive baseline model.
//!
//! Predicts the previous day's price (`lag_1`) for every row.

use crate::error::{ForecastError, Result};
use crate::models::{validate_training_set, FeatureVector, Regressor, LAG_1_INDEX};
use serde::{Deserialize, Serialize};

/// Regressor that repeats the `lag_1` feature
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LastValueRegressor {
    fitted: bool,
}

impl LastValueRegressor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Regressor for LastValueRegressor {
    fn fit(&mut self, features: &[FeatureVector], target: &[f64]) -> Result<()> {
        validate_training_set(features, target)?;
        self.fitted = true;
        Ok(())
    }

    fn predict(&self, features: &[FeatureVector]) -> Result<Vec<f64>> {
        if !self.fitted {
            return Err(ForecastError::ModelError(
                "model must be fitted before predicting".to_string(),
            ));
        }
        Ok(features.iter().map(|row| row[LAG_1_INDEX]).collect())
    }

    fn name(&self) -> &str {
        "Naive (lag_1)"
    }
}
