//! End-to-end training runs
//!
//! A run loads every source table, cleans and merges them, engineers
//! features, trains and evaluates the model, and produces the default
//! forecast. Either every stage succeeds and a complete
//! [`TrainingArtifacts`] value is returned, or the first error is.

use crate::clean::clean;
use crate::config::PipelineConfig;
use crate::data::{DataLoader, WideTable};
use crate::error::{ForecastError, Result};
use crate::features::{FeatureTable, FeatureTransformer, RegionEncoding};
use crate::forecast::{ForecastTable, Forecaster, Horizon};
use crate::merge::merge;
use crate::metrics::EvaluationMetrics;
use crate::models::Regressor;
use crate::train::{HoldoutPoint, Trainer};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::{info, warn};

/// Everything a training run produces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingArtifacts<R> {
    /// Model refit on the full feature table
    pub model: R,
    pub encoding: RegionEncoding,
    /// Hold-out accuracy of the model fitted on the training split
    pub metrics: EvaluationMetrics,
    pub holdout: Vec<HoldoutPoint>,
    pub features: FeatureTable,
    /// Forecast of the configured default horizon
    pub forecast: ForecastTable,
    pub forecaster: Forecaster,
}

impl<R> TrainingArtifacts<R> {
    /// Regions known to the encoding, sorted by name
    pub fn regions(&self) -> Vec<&str> {
        self.encoding.regions()
    }
}

impl<R: Regressor> TrainingArtifacts<R> {
    /// Forecast `horizon` days for every region, or only for `region`
    pub fn forecast(&mut self, horizon: Horizon, region: Option<&str>) -> Result<ForecastTable> {
        match region {
            Some(region) => self.forecaster.forecast_region(
                &self.features,
                &self.encoding,
                &mut self.model,
                region,
                horizon,
            ),
            None => self.forecaster.forecast(
                &self.features,
                &self.encoding,
                &mut self.model,
                horizon,
            ),
        }
    }
}

impl<R: Serialize> TrainingArtifacts<R> {
    /// Write the artifacts as JSON
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }
}

impl<R: DeserializeOwned> TrainingArtifacts<R> {
    /// Read artifacts written by [`TrainingArtifacts::save_json`]
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Runs the clean, merge, feature, train and forecast stages
#[derive(Debug, Clone, Default)]
pub struct TrainingPipeline {
    config: PipelineConfig,
    transformer: FeatureTransformer,
    trainer: Trainer,
    forecaster: Forecaster,
    horizon: Horizon,
}

impl TrainingPipeline {
    /// Create a pipeline from a validated configuration
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            transformer: FeatureTransformer::new(config.holiday_calendar()),
            trainer: config.trainer()?,
            forecaster: config.forecaster()?,
            horizon: config.horizon()?,
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load every readable source, skipping the ones that fail
    pub fn load_sources<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<WideTable>> {
        let mut tables = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            match DataLoader::from_csv(path) {
                Ok(table) => {
                    info!(
                        source = %path.display(),
                        regions = table.rows().len(),
                        dates = table.date_labels().len(),
                        "loaded source"
                    );
                    tables.push(table);
                }
                Err(e) => warn!(source = %path.display(), error = %e, "skipping source"),
            }
        }

        if tables.is_empty() {
            return Err(ForecastError::NoValidSources(format!(
                "none of the {} source files could be loaded",
                paths.len()
            )));
        }
        Ok(tables)
    }

    /// Load the given CSV files and run the pipeline on them
    pub fn run_files<P, R>(&self, paths: &[P], model: R) -> Result<TrainingArtifacts<R>>
    where
        P: AsRef<Path>,
        R: Regressor,
    {
        let tables = self.load_sources(paths)?;
        self.run(&tables, model)
    }

    /// Run every stage on already loaded tables, merged in the given order
    pub fn run<R: Regressor>(&self, tables: &[WideTable], model: R) -> Result<TrainingArtifacts<R>> {
        if tables.is_empty() {
            return Err(ForecastError::NoValidSources(
                "no source tables given".to_string(),
            ));
        }

        let observations = merge(tables.iter().map(clean));
        let (features, encoding) = self.transformer.transform(&observations)?;
        let outcome = self.trainer.train(&features, model)?;

        let mut model = outcome.model;
        let forecast = self
            .forecaster
            .forecast(&features, &encoding, &mut model, self.horizon)?;

        info!(
            sources = tables.len(),
            observations = observations.len(),
            feature_rows = features.len(),
            forecast_points = forecast.len(),
            "pipeline finished"
        );

        Ok(TrainingArtifacts {
            model,
            encoding,
            metrics: outcome.metrics,
            holdout: outcome.holdout,
            features,
            forecast,
            forecaster: self.forecaster.clone(),
        })
    }
}
