//! Chronological train/test split, fitting and hold-out evaluation
//!
//! The split is by row position in the feature table's (date, region) order.
//! It is not stratified per region, so the test tail can cover regions
//! unevenly when their histories end on different days.

use crate::error::{ForecastError, Result};
use crate::features::FeatureTable;
use crate::metrics::EvaluationMetrics;
use crate::models::Regressor;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Default share of rows used for fitting
pub const DEFAULT_TRAIN_FRACTION: f64 = 0.9;

/// One held-out row with its prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldoutPoint {
    pub date: NaiveDate,
    pub region: String,
    pub actual: f64,
    pub predicted: f64,
}

/// Result of a training run
#[derive(Debug, Clone)]
pub struct TrainingOutcome<R> {
    /// Model fitted on the training rows
    pub model: R,
    /// Accuracy on the test rows
    pub metrics: EvaluationMetrics,
    /// Actual vs predicted values of the test rows
    pub holdout: Vec<HoldoutPoint>,
    /// Number of rows used for fitting
    pub train_rows: usize,
}

/// Fits a model on the head of a feature table and evaluates it on the tail
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trainer {
    train_fraction: f64,
}

impl Default for Trainer {
    fn default() -> Self {
        Self {
            train_fraction: DEFAULT_TRAIN_FRACTION,
        }
    }
}

impl Trainer {
    /// Create a trainer; the fraction must lie strictly between 0 and 1
    pub fn new(train_fraction: f64) -> Result<Self> {
        if !(train_fraction > 0.0 && train_fraction < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "train fraction must be between 0 and 1, got {}",
                train_fraction
            )));
        }
        Ok(Self { train_fraction })
    }

    pub fn train_fraction(&self) -> f64 {
        self.train_fraction
    }

    /// Number of leading rows used for fitting
    pub fn split_index(&self, rows: usize) -> usize {
        (rows as f64 * self.train_fraction).floor() as usize
    }

    /// Fit `model` on the head of `table` and evaluate it on the tail
    pub fn train<R: Regressor>(&self, table: &FeatureTable, mut model: R) -> Result<TrainingOutcome<R>> {
        let rows = table.len();
        let split = self.split_index(rows);
        if split == 0 || split >= rows {
            return Err(ForecastError::InsufficientData(format!(
                "{} feature rows leave an empty train or test split at fraction {}",
                rows, self.train_fraction
            )));
        }

        let features = table.feature_matrix();
        let targets = table.targets();
        let (train_x, test_x) = features.split_at(split);
        let (train_y, test_y) = targets.split_at(split);

        model.fit(train_x, train_y)?;
        let predicted = model.predict(test_x)?;
        let metrics = EvaluationMetrics::evaluate(test_y, &predicted)?;

        let holdout = table.rows()[split..]
            .iter()
            .zip(predicted)
            .map(|(row, predicted)| HoldoutPoint {
                date: row.date,
                region: row.region.clone(),
                actual: row.price as f64,
                predicted,
            })
            .collect();

        info!(
            model = model.name(),
            train_rows = split,
            test_rows = rows - split,
            rmse = metrics.rmse,
            mape = metrics.mape,
            "trained model"
        );

        Ok(TrainingOutcome {
            model,
            metrics,
            holdout,
            train_rows: split,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_fraction() {
        assert!(Trainer::new(0.0).is_err());
        assert!(Trainer::new(1.0).is_err());
        assert!(Trainer::new(f64::NAN).is_err());
        assert!(Trainer::new(0.8).is_ok());
    }

    #[test]
    fn test_split_index() {
        let trainer = Trainer::default();
        assert_eq!(trainer.split_index(100), 90);
        assert_eq!(trainer.split_index(15), 13);
        assert_eq!(trainer.split_index(1), 0);
    }
}
