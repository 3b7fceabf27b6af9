//! Regression models mapping engineered features to a price
//!
//! The pipeline only relies on the [`Regressor`] capability: any model that
//! can be fitted on feature vectors and predict from them can be swapped in.

use crate::error::{ForecastError, Result};
use std::fmt::Debug;

pub mod baseline;
pub mod random_forest;

/// Number of engineered features
pub const FEATURE_COUNT: usize = 8;

/// Column names of a [`FeatureVector`], in order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "Province_id",
    "lag_1",
    "lag_14",
    "before_eid",
    "eid",
    "after_eid",
    "month",
    "year",
];

/// Position of `lag_1` in a [`FeatureVector`]
pub const LAG_1_INDEX: usize = 1;

/// Position of `lag_14` in a [`FeatureVector`]
pub const LAG_14_INDEX: usize = 2;

/// One row of model input
pub type FeatureVector = [f64; FEATURE_COUNT];

/// A regression model that can be (re)fitted and queried
pub trait Regressor: Debug + Send + Sync {
    /// Fit the model, replacing any previous fit
    fn fit(&mut self, features: &[FeatureVector], target: &[f64]) -> Result<()>;

    /// Predict one value per feature row
    fn predict(&self, features: &[FeatureVector]) -> Result<Vec<f64>>;

    /// Predict a single row
    fn predict_one(&self, features: &FeatureVector) -> Result<f64> {
        self.predict(std::slice::from_ref(features))?
            .into_iter()
            .next()
            .ok_or_else(|| ForecastError::ModelError("model returned no prediction".to_string()))
    }

    /// Name of the model
    fn name(&self) -> &str;
}

impl<R: Regressor + ?Sized> Regressor for Box<R> {
    fn fit(&mut self, features: &[FeatureVector], target: &[f64]) -> Result<()> {
        (**self).fit(features, target)
    }

    fn predict(&self, features: &[FeatureVector]) -> Result<Vec<f64>> {
        (**self).predict(features)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Check a training set before fitting
pub(crate) fn validate_training_set(features: &[FeatureVector], target: &[f64]) -> Result<()> {
    if features.is_empty() {
        return Err(ForecastError::InsufficientData(
            "cannot fit a model on an empty training set".to_string(),
        ));
    }
    if features.len() != target.len() {
        return Err(ForecastError::ModelError(format!(
            "features length ({}) doesn't match target length ({})",
            features.len(),
            target.len()
        )));
    }
    if features.iter().flatten().chain(target).any(|v| !v.is_finite()) {
        return Err(ForecastError::ModelError(
            "training set contains non-finite values".to_string(),
        ));
    }
    Ok(())
}
