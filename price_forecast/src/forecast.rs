//! Recursive multi-step forecasting
//!
//! Each region is forecast one day at a time. The prediction for day `i`
//! is appended to the region's rolling price window and becomes the lag
//! input of the following days, so errors compound over the horizon.

use crate::error::{ForecastError, Result};
use crate::features::{feature_vector, FeatureRow, FeatureTable, RegionEncoding, MAX_LAG};
use crate::models::Regressor;
use chrono::{Days, NaiveDate};
use hijri_calendar::HolidayCalendar;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, info};

/// Smallest accepted rolling window
pub const MIN_WINDOW: usize = 30;

/// Number of days to forecast, between 1 and 180
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Horizon(u32);

impl Horizon {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 180;

    /// Validate a requested horizon
    pub fn new(days: u32) -> Result<Self> {
        if !(Self::MIN..=Self::MAX).contains(&days) {
            return Err(ForecastError::InvalidParameter(format!(
                "horizon must be between {} and {} days, got {}",
                Self::MIN,
                Self::MAX,
                days
            )));
        }
        Ok(Self(days))
    }

    pub fn days(&self) -> u32 {
        self.0
    }
}

impl Default for Horizon {
    fn default() -> Self {
        Self(Self::MAX)
    }
}

impl TryFrom<u32> for Horizon {
    type Error = ForecastError;

    fn try_from(days: u32) -> Result<Self> {
        Self::new(days)
    }
}

impl From<Horizon> for u32 {
    fn from(horizon: Horizon) -> Self {
        horizon.0
    }
}

/// One forecast day of one region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastPoint {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Province")]
    pub region: String,
    /// Rounded predicted price
    #[serde(rename = "Prediction")]
    pub predicted_price: i64,
}

/// Forecast points sorted by (region, date)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastTable {
    points: Vec<ForecastPoint>,
}

impl ForecastTable {
    /// Create a table, sorting points by (region, date)
    pub fn new(mut points: Vec<ForecastPoint>) -> Self {
        points.sort_by(|a, b| (&a.region, a.date).cmp(&(&b.region, b.date)));
        Self { points }
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Distinct regions, sorted by name
    pub fn regions(&self) -> Vec<&str> {
        let mut regions: Vec<&str> = self.points.iter().map(|p| p.region.as_str()).collect();
        regions.dedup();
        regions
    }

    /// Points of one region in date order
    pub fn for_region(&self, region: &str) -> Vec<&ForecastPoint> {
        self.points.iter().filter(|p| p.region == region).collect()
    }

    /// Mean prediction across regions for each date
    pub fn mean_by_date(&self) -> Vec<(NaiveDate, f64)> {
        let mut totals: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
        for point in &self.points {
            let entry = totals.entry(point.date).or_insert((0.0, 0));
            entry.0 += point.predicted_price as f64;
            entry.1 += 1;
        }
        totals
            .into_iter()
            .map(|(date, (sum, count))| (date, sum / count as f64))
            .collect()
    }

    /// Export as a `Date, Province, Prediction` DataFrame
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let dates: Vec<NaiveDate> = self.points.iter().map(|p| p.date).collect();
        Ok(DataFrame::new(vec![
            Series::new("Date", dates),
            Series::new(
                "Province",
                self.points.iter().map(|p| p.region.as_str()).collect::<Vec<_>>(),
            ),
            Series::new(
                "Prediction",
                self.points.iter().map(|p| p.predicted_price).collect::<Vec<_>>(),
            ),
        ])?)
    }
}

/// Produces self-fed forecasts from a feature table and a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecaster {
    calendar: HolidayCalendar,
    window: usize,
}

impl Default for Forecaster {
    fn default() -> Self {
        Self {
            calendar: HolidayCalendar::default(),
            window: MIN_WINDOW,
        }
    }
}

impl Forecaster {
    /// Create a forecaster keeping the last `window` prices of each region
    pub fn new(calendar: HolidayCalendar, window: usize) -> Result<Self> {
        if window < MIN_WINDOW {
            return Err(ForecastError::InvalidParameter(format!(
                "forecast window must hold at least {} rows, got {}",
                MIN_WINDOW, window
            )));
        }
        Ok(Self { calendar, window })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Refit `model` on the whole table and forecast every region
    pub fn forecast<R: Regressor>(
        &self,
        table: &FeatureTable,
        encoding: &RegionEncoding,
        model: &mut R,
        horizon: Horizon,
    ) -> Result<ForecastTable> {
        if table.is_empty() {
            return Ok(ForecastTable::default());
        }

        refit(table, model)?;

        let mut points = Vec::new();
        for region in table.regions() {
            let region_id = encoding.require(region)?;
            points.extend(self.forecast_series(
                region,
                region_id,
                &table.region_rows(region),
                model,
                horizon,
            )?);
        }

        let forecast = ForecastTable::new(points);
        info!(
            regions = forecast.regions().len(),
            horizon = horizon.days(),
            points = forecast.len(),
            "generated forecast"
        );
        Ok(forecast)
    }

    /// Refit `model` on the whole table and forecast a single region
    pub fn forecast_region<R: Regressor>(
        &self,
        table: &FeatureTable,
        encoding: &RegionEncoding,
        model: &mut R,
        region: &str,
        horizon: Horizon,
    ) -> Result<ForecastTable> {
        let region_id = encoding.require(region)?;
        let rows = table.region_rows(region);
        if rows.is_empty() {
            return Err(ForecastError::UnknownRegion(region.to_string()));
        }

        refit(table, model)?;
        let points = self.forecast_series(region, region_id, &rows, model, horizon)?;
        Ok(ForecastTable::new(points))
    }

    fn forecast_series<R: Regressor>(
        &self,
        region: &str,
        region_id: u32,
        rows: &[&FeatureRow],
        model: &R,
        horizon: Horizon,
    ) -> Result<Vec<ForecastPoint>> {
        let Some(last) = rows.last() else {
            return Ok(Vec::new());
        };
        let last_date = last.date;

        let mut window: VecDeque<f64> = rows[rows.len().saturating_sub(self.window)..]
            .iter()
            .map(|row| row.price as f64)
            .collect();
        let mut points = Vec::with_capacity(horizon.days() as usize);

        for step in 1..=horizon.days() {
            let date = last_date
                .checked_add_days(Days::new(u64::from(step)))
                .ok_or_else(|| {
                    ForecastError::DataError(format!("{} + {} days is out of range", last_date, step))
                })?;

            let (lag_1, lag_14) = lags(&window);
            let flags = self.calendar.flags(date)?;
            let features = feature_vector(region_id, lag_1, lag_14, flags, date);
            let predicted = model.predict_one(&features)?;

            points.push(ForecastPoint {
                date,
                region: region.to_string(),
                predicted_price: predicted.round_ties_even() as i64,
            });

            window.push_back(predicted);
            if window.len() > self.window {
                window.pop_front();
            }
        }

        debug!(region, region_id, steps = points.len(), "forecast region");
        Ok(points)
    }
}

/// `lag_1` and `lag_14` for the day after the window's last value.
///
/// With fewer than 14 values in the window `lag_14` falls back to `lag_1`.
pub fn lags(window: &VecDeque<f64>) -> (f64, f64) {
    let lag_1 = window.back().copied().unwrap_or(0.0);
    let lag_14 = if window.len() >= MAX_LAG {
        window[window.len() - MAX_LAG]
    } else {
        lag_1
    };
    (lag_1, lag_14)
}

fn refit<R: Regressor>(table: &FeatureTable, model: &mut R) -> Result<()> {
    model.fit(&table.feature_matrix(), &table.targets())
}
