//! Feature engineering: region encoding, lag features and calendar features

use crate::data::PriceObservation;
use crate::error::{ForecastError, Result};
use crate::models::FeatureVector;
use chrono::{Datelike, NaiveDate};
use hijri_calendar::{HolidayCalendar, HolidayFlags};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Longest lag used as a feature; earlier rows of a region are dropped
pub const MAX_LAG: usize = 14;

/// Dense integer ids for regions, ordered by mean historical price
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionEncoding {
    ids: BTreeMap<String, u32>,
}

impl RegionEncoding {
    /// Assign ids by ascending mean price, ties broken by region name
    pub fn from_observations(observations: &[PriceObservation]) -> Self {
        let mut totals: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
        for observation in observations {
            let entry = totals.entry(observation.region.as_str()).or_insert((0.0, 0));
            entry.0 += observation.price as f64;
            entry.1 += 1;
        }

        let mut means: Vec<(&str, f64)> = totals
            .into_iter()
            .map(|(region, (sum, count))| (region, sum / count as f64))
            .collect();
        means.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));

        Self {
            ids: means
                .into_iter()
                .enumerate()
                .map(|(id, (region, _))| (region.to_string(), id as u32))
                .collect(),
        }
    }

    /// Id of a region, if known
    pub fn id(&self, region: &str) -> Option<u32> {
        self.ids.get(region).copied()
    }

    /// Id of a region, failing for regions the model has never seen
    pub fn require(&self, region: &str) -> Result<u32> {
        self.id(region)
            .ok_or_else(|| ForecastError::UnknownRegion(region.to_string()))
    }

    /// Regions sorted by name
    pub fn regions(&self) -> Vec<&str> {
        self.ids.keys().map(String::as_str).collect()
    }

    /// Regions in id order
    pub fn regions_by_id(&self) -> Vec<&str> {
        let mut regions: Vec<(&str, u32)> =
            self.ids.iter().map(|(r, id)| (r.as_str(), *id)).collect();
        regions.sort_by_key(|(_, id)| *id);
        regions.into_iter().map(|(r, _)| r).collect()
    }

    /// Number of regions
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if no region is encoded
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// One observation with its engineered features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub region: String,
    /// Target
    pub price: u64,
    pub region_id: u32,
    /// Price one row earlier in the region's series
    pub lag_1: u64,
    /// Price fourteen rows earlier in the region's series
    pub lag_14: u64,
    pub before_holiday: bool,
    pub on_holiday: bool,
    pub after_holiday: bool,
    pub month: u32,
    pub year: i32,
}

impl FeatureRow {
    /// Model input for this row
    pub fn features(&self) -> FeatureVector {
        feature_vector(
            self.region_id,
            self.lag_1 as f64,
            self.lag_14 as f64,
            HolidayFlags {
                before: self.before_holiday,
                on: self.on_holiday,
                after: self.after_holiday,
            },
            self.date,
        )
    }
}

/// Assemble a feature vector in [`crate::models::FEATURE_NAMES`] order
pub fn feature_vector(
    region_id: u32,
    lag_1: f64,
    lag_14: f64,
    flags: HolidayFlags,
    date: NaiveDate,
) -> FeatureVector {
    let indicator = |set: bool| if set { 1.0 } else { 0.0 };
    [
        f64::from(region_id),
        lag_1,
        lag_14,
        indicator(flags.before),
        indicator(flags.on),
        indicator(flags.after),
        f64::from(date.month()),
        f64::from(date.year()),
    ]
}

/// Feature rows sorted by (date, region)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    rows: Vec<FeatureRow>,
}

impl FeatureTable {
    /// Create a table, sorting rows by (date, region)
    pub fn new(mut rows: Vec<FeatureRow>) -> Self {
        rows.sort_by(|a, b| (a.date, &a.region).cmp(&(b.date, &b.region)));
        Self { rows }
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct regions, sorted by name
    pub fn regions(&self) -> Vec<&str> {
        let mut regions: Vec<&str> = self.rows.iter().map(|r| r.region.as_str()).collect();
        regions.sort_unstable();
        regions.dedup();
        regions
    }

    /// Rows of one region in date order
    pub fn region_rows(&self, region: &str) -> Vec<&FeatureRow> {
        self.rows.iter().filter(|r| r.region == region).collect()
    }

    /// Model inputs in row order
    pub fn feature_matrix(&self) -> Vec<FeatureVector> {
        self.rows.iter().map(FeatureRow::features).collect()
    }

    /// Target prices in row order
    pub fn targets(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.price as f64).collect()
    }

    /// Export with the historical column names
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let dates: Vec<NaiveDate> = self.rows.iter().map(|r| r.date).collect();
        let flag = |f: fn(&FeatureRow) -> bool| -> Vec<i32> {
            self.rows.iter().map(|r| i32::from(f(r))).collect()
        };

        Ok(DataFrame::new(vec![
            Series::new("Date", dates),
            Series::new(
                "Province",
                self.rows.iter().map(|r| r.region.as_str()).collect::<Vec<_>>(),
            ),
            Series::new(
                "Price",
                self.rows.iter().map(|r| r.price as i64).collect::<Vec<_>>(),
            ),
            Series::new(
                "Province_id",
                self.rows.iter().map(|r| r.region_id).collect::<Vec<_>>(),
            ),
            Series::new(
                "lag_1",
                self.rows.iter().map(|r| r.lag_1 as i64).collect::<Vec<_>>(),
            ),
            Series::new(
                "lag_14",
                self.rows.iter().map(|r| r.lag_14 as i64).collect::<Vec<_>>(),
            ),
            Series::new("before_eid", flag(|r| r.before_holiday)),
            Series::new("eid", flag(|r| r.on_holiday)),
            Series::new("after_eid", flag(|r| r.after_holiday)),
            Series::new(
                "month",
                self.rows.iter().map(|r| r.month).collect::<Vec<_>>(),
            ),
            Series::new("year", self.rows.iter().map(|r| r.year).collect::<Vec<_>>()),
        ])?)
    }
}

/// Builds feature tables from cleaned observations
#[derive(Debug, Clone, Default)]
pub struct FeatureTransformer {
    calendar: HolidayCalendar,
}

impl FeatureTransformer {
    pub fn new(calendar: HolidayCalendar) -> Self {
        Self { calendar }
    }

    pub fn calendar(&self) -> &HolidayCalendar {
        &self.calendar
    }

    /// Encode regions, add lag and calendar features, drop rows without full
    /// lag history.
    pub fn transform(
        &self,
        observations: &[PriceObservation],
    ) -> Result<(FeatureTable, RegionEncoding)> {
        let encoding = RegionEncoding::from_observations(observations);

        let mut series: BTreeMap<&str, Vec<(NaiveDate, u64)>> = BTreeMap::new();
        for observation in observations {
            series
                .entry(observation.region.as_str())
                .or_default()
                .push((observation.date, observation.price));
        }

        let mut flags_by_date: BTreeMap<NaiveDate, HolidayFlags> = BTreeMap::new();
        let mut rows = Vec::with_capacity(observations.len());

        for (region, mut points) in series {
            points.sort_by_key(|(date, _)| *date);
            let region_id = encoding.require(region)?;
            if points.len() <= MAX_LAG {
                debug!(region, rows = points.len(), "not enough history for lag features");
            }

            for i in MAX_LAG..points.len() {
                let (date, price) = points[i];
                let flags = match flags_by_date.get(&date) {
                    Some(flags) => *flags,
                    None => {
                        let flags = self.calendar.flags(date)?;
                        flags_by_date.insert(date, flags);
                        flags
                    }
                };

                rows.push(FeatureRow {
                    date,
                    region: region.to_string(),
                    price,
                    region_id,
                    lag_1: points[i - 1].1,
                    lag_14: points[i - MAX_LAG].1,
                    before_holiday: flags.before,
                    on_holiday: flags.on,
                    after_holiday: flags.after,
                    month: date.month(),
                    year: date.year(),
                });
            }
        }

        let table = FeatureTable::new(rows);
        info!(
            rows = table.len(),
            dropped = observations.len() - table.len(),
            regions = encoding.len(),
            "engineered features"
        );
        Ok((table, encoding))
    }
}
