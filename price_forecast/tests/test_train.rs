mod common;

use approx::assert_relative_eq;
use common::{daily, date};
use price_forecast::error::ForecastError;
use price_forecast::features::FeatureTransformer;
use price_forecast::metrics::{mean_absolute_percentage_error, root_mean_squared_error, EvaluationMetrics};
use price_forecast::models::baseline::LastValueRegressor;
use price_forecast::models::random_forest::{ForestParams, MaxFeatures, RandomForestRegressor};
use price_forecast::models::Regressor;
use price_forecast::train::Trainer;

#[test]
fn test_metrics() {
    let actual = [100.0, 200.0, 300.0];
    let predicted = [110.0, 190.0, 300.0];

    assert_relative_eq!(
        root_mean_squared_error(&actual, &predicted),
        (200.0_f64 / 3.0).sqrt(),
        epsilon = 1e-9
    );
    assert_relative_eq!(
        mean_absolute_percentage_error(&actual, &predicted),
        5.0,
        epsilon = 1e-9
    );
    assert!(root_mean_squared_error(&[], &[]).is_nan());
    assert!(EvaluationMetrics::evaluate(&actual, &predicted[..2]).is_err());
}

#[test]
fn test_chronological_split() {
    let observations = daily("Aceh", date("2024-01-01"), &(1..=114).collect::<Vec<_>>());
    let (table, _) = FeatureTransformer::default().transform(&observations).unwrap();
    assert_eq!(table.len(), 100);

    let outcome = Trainer::default()
        .train(&table, LastValueRegressor::new())
        .unwrap();

    assert_eq!(outcome.train_rows, 90);
    assert_eq!(outcome.holdout.len(), 10);
    assert_eq!(outcome.holdout[0].date, table.rows()[90].date);
    for point in &outcome.holdout {
        assert_relative_eq!(point.predicted, point.actual - 1.0);
    }
    assert_relative_eq!(outcome.metrics.rmse, 1.0);
}

#[test]
fn test_insufficient_rows() {
    let observations = daily("Aceh", date("2024-01-01"), &[100; 15]);
    let (table, _) = FeatureTransformer::default().transform(&observations).unwrap();
    assert_eq!(table.len(), 1);

    let result = Trainer::default().train(&table, LastValueRegressor::new());
    assert!(matches!(result, Err(ForecastError::InsufficientData(_))));
}

#[test]
fn test_random_forest_tracks_level() {
    let start = date("2023-01-01");
    let mut observations = daily("Cheap", start, &[1_000; 200]);
    observations.extend(daily("Dear", start, &[5_000; 200]));
    let (table, _) = FeatureTransformer::default().transform(&observations).unwrap();

    let params = ForestParams {
        n_estimators: 10,
        min_samples_split: 2,
        min_samples_leaf: 1,
        max_features: MaxFeatures::All,
        n_jobs: Some(2),
        ..ForestParams::default()
    };
    let outcome = Trainer::default()
        .train(&table, RandomForestRegressor::new(params))
        .unwrap();

    assert!(outcome.model.is_fitted());
    assert_relative_eq!(outcome.metrics.rmse, 0.0, epsilon = 1e-6);
    assert_relative_eq!(outcome.metrics.mape, 0.0, epsilon = 1e-6);
    assert_eq!(outcome.model.trees().len(), 10);
    assert!(outcome.model.name().contains("10 trees"));
}
