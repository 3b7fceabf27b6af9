//! Metrics for evaluating forecast performance

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// Root mean squared error. NaN for empty or mismatched inputs.
pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }

    let mse = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64;
    mse.sqrt()
}

/// Mean absolute percentage error, as a percentage.
///
/// Actual values of zero are guarded by machine epsilon in the denominator,
/// so they produce a very large error instead of a division by zero.
pub fn mean_absolute_percentage_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }

    actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs() / a.abs().max(f64::EPSILON))
        .sum::<f64>()
        / actual.len() as f64
        * 100.0
}

/// Accuracy of a model on the held-out tail of a training run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    /// Root Mean Squared Error
    #[serde(rename = "RMSE")]
    pub rmse: f64,
    /// Mean Absolute Percentage Error (percent)
    #[serde(rename = "MAPE")]
    pub mape: f64,
}

impl EvaluationMetrics {
    /// Evaluate predictions against actual values
    pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Result<Self> {
        if actual.len() != predicted.len() || actual.is_empty() {
            return Err(ForecastError::InsufficientData(
                "actual and predicted values must have the same non-zero length".to_string(),
            ));
        }

        Ok(Self {
            rmse: root_mean_squared_error(actual, predicted),
            mape: mean_absolute_percentage_error(actual, predicted),
        })
    }
}

impl std::fmt::Display for EvaluationMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Evaluation Metrics:")?;
        writeln!(f, "  RMSE:  {:.2}", self.rmse)?;
        writeln!(f, "  MAPE:  {:.2}%", self.mape)?;
        Ok(())
    }
}
