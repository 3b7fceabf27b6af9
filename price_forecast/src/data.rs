//! Raw price tables and long-format observations
//!
//! Source spreadsheets are "wide": one row per region and one column per day.
//! [`DataLoader`] turns a CSV file or a polars `DataFrame` into a [`WideTable`]
//! with every cell kept as text, so that the cleaner decides what a valid
//! price or date is.

use crate::clean::parse_date_label;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// One daily price of one region
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PriceObservation {
    /// Calendar day
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    /// Region identifier
    #[serde(rename = "Province")]
    pub region: String,
    /// Price rounded to a whole currency unit
    #[serde(rename = "Price")]
    pub price: u64,
}

impl PriceObservation {
    /// Create a new observation
    pub fn new(date: NaiveDate, region: impl Into<String>, price: u64) -> Self {
        Self {
            date,
            region: region.into(),
            price,
        }
    }
}

/// Accepted names of the region column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionColumn {
    /// `Province`
    Province,
    /// `Provinsi`
    Provinsi,
}

impl RegionColumn {
    /// Match a header cell against the accepted names (trimmed, case-insensitive)
    pub fn resolve(header: &str) -> Option<Self> {
        match header.trim().to_lowercase().as_str() {
            "province" => Some(RegionColumn::Province),
            "provinsi" => Some(RegionColumn::Provinsi),
            _ => None,
        }
    }

    /// Canonical header text
    pub fn label(&self) -> &'static str {
        match self {
            RegionColumn::Province => "Province",
            RegionColumn::Provinsi => "Provinsi",
        }
    }
}

/// One region's row of a wide table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideRow {
    /// Region name, trimmed
    pub region: String,
    /// Raw cell text, aligned with the table's date labels
    pub cells: Vec<Option<String>>,
}

/// A raw source table: one row per region, one column per date label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideTable {
    region_column: RegionColumn,
    date_labels: Vec<String>,
    rows: Vec<WideRow>,
}

impl WideTable {
    /// Build a table from a header and text records.
    ///
    /// The region column is resolved once here; a header without one of the
    /// accepted names is a [`ForecastError::SchemaError`]. Rows with a blank
    /// region are dropped.
    pub fn from_grid(header: Vec<String>, records: Vec<Vec<Option<String>>>) -> Result<Self> {
        let (region_index, region_column) = header
            .iter()
            .enumerate()
            .find_map(|(i, name)| RegionColumn::resolve(name).map(|column| (i, column)))
            .ok_or_else(|| {
                ForecastError::SchemaError(format!(
                    "no region column among headers {:?}",
                    header
                ))
            })?;

        let date_labels: Vec<String> = header
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != region_index)
            .map(|(_, name)| name.clone())
            .collect();

        let mut rows = Vec::with_capacity(records.len());
        for (line, mut record) in records.into_iter().enumerate() {
            if record.len() != header.len() {
                return Err(ForecastError::DataError(format!(
                    "record {} has {} cells, header has {}",
                    line,
                    record.len(),
                    header.len()
                )));
            }

            let region = record
                .remove(region_index)
                .map(|r| r.trim().to_string())
                .unwrap_or_default();
            if region.is_empty() {
                debug!(line, "skipping row without region");
                continue;
            }

            rows.push(WideRow {
                region,
                cells: record,
            });
        }

        Ok(Self {
            region_column,
            date_labels,
            rows,
        })
    }

    /// Pivot long observations back into a wide table with `DD/MM/YYYY` labels
    pub fn from_observations(observations: &[PriceObservation]) -> Self {
        let dates: Vec<NaiveDate> = observations
            .iter()
            .map(|o| o.date)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let column_of: BTreeMap<NaiveDate, usize> =
            dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();

        let mut by_region: BTreeMap<&str, Vec<Option<String>>> = BTreeMap::new();
        for observation in observations {
            let cells = by_region
                .entry(observation.region.as_str())
                .or_insert_with(|| vec![None; dates.len()]);
            cells[column_of[&observation.date]] = Some(observation.price.to_string());
        }

        Self {
            region_column: RegionColumn::Province,
            date_labels: dates
                .iter()
                .map(|d| d.format("%d/%m/%Y").to_string())
                .collect(),
            rows: by_region
                .into_iter()
                .map(|(region, cells)| WideRow {
                    region: region.to_string(),
                    cells,
                })
                .collect(),
        }
    }

    /// The resolved region column
    pub fn region_column(&self) -> RegionColumn {
        self.region_column
    }

    /// Raw date labels in column order
    pub fn date_labels(&self) -> &[String] {
        &self.date_labels
    }

    /// Region rows
    pub fn rows(&self) -> &[WideRow] {
        &self.rows
    }

    /// Check if the table has no region rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Earliest and latest parseable date label
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let dates: Vec<NaiveDate> = self
            .date_labels
            .iter()
            .filter_map(|label| parse_date_label(label))
            .collect();
        let first = dates.iter().min()?;
        let last = dates.iter().max()?;
        Some((*first, *last))
    }
}

/// Data loader for wide price tables
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a wide table from a CSV file, reading every column as text
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<WideTable> {
        let file = File::open(path.as_ref())?;
        let df = CsvReader::new(file)
            .infer_schema(Some(0))
            .has_header(true)
            .finish()?;

        Self::from_dataframe(df)
    }

    /// Create a wide table from an existing DataFrame
    pub fn from_dataframe(df: DataFrame) -> Result<WideTable> {
        let header: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();

        let mut columns: Vec<Vec<Option<String>>> = Vec::with_capacity(header.len());
        for series in df.get_columns() {
            let text = series.cast(&DataType::Utf8)?;
            columns.push(
                text.utf8()?
                    .into_iter()
                    .map(|cell| cell.map(str::to_string))
                    .collect(),
            );
        }

        let records = (0..df.height())
            .map(|row| columns.iter().map(|column| column[row].clone()).collect())
            .collect();

        WideTable::from_grid(header, records)
    }
}

/// Distinct regions among `observations`, sorted by name
pub fn region_names(observations: &[PriceObservation]) -> BTreeSet<&str> {
    observations.iter().map(|o| o.region.as_str()).collect()
}

/// Export long observations as a `Date, Province, Price` DataFrame
pub fn observations_to_dataframe(observations: &[PriceObservation]) -> Result<DataFrame> {
    let dates: Vec<NaiveDate> = observations.iter().map(|o| o.date).collect();
    let regions: Vec<&str> = observations.iter().map(|o| o.region.as_str()).collect();
    let prices: Vec<i64> = observations.iter().map(|o| o.price as i64).collect();

    Ok(DataFrame::new(vec![
        Series::new("Date", dates),
        Series::new("Province", regions),
        Series::new("Price", prices),
    ])?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    #[test]
    fn test_region_column_aliases() {
        assert_eq!(RegionColumn::resolve("Province"), Some(RegionColumn::Province));
        assert_eq!(RegionColumn::resolve(" provinsi "), Some(RegionColumn::Provinsi));
        assert_eq!(RegionColumn::resolve("Region"), None);
    }

    #[test]
    fn test_from_grid_moves_region_column() {
        let header = vec!["01/01/2024".to_string(), "Province".to_string()];
        let table = WideTable::from_grid(
            header,
            vec![cells(&["100", " Aceh "]), vec![Some("5".to_string()), None]],
        )
        .unwrap();

        assert_eq!(table.date_labels(), &["01/01/2024".to_string()]);
        assert_eq!(table.rows().len(), 1);
        assert_eq!(table.rows()[0].region, "Aceh");
        assert_eq!(table.rows()[0].cells, cells(&["100"]));
    }

    #[test]
    fn test_from_grid_without_region_column() {
        let result = WideTable::from_grid(vec!["Region".to_string()], vec![]);
        assert!(matches!(result, Err(ForecastError::SchemaError(_))));
    }

    #[test]
    fn test_observation_dates_are_polars_dates() {
        let observations = vec![
            PriceObservation::new(NaiveDate::from_ymd_opt(1970, 1, 2).unwrap(), "Aceh", 100),
            PriceObservation::new(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(), "Bali", 200),
        ];
        let df = observations_to_dataframe(&observations).unwrap();
        let column = df.column("Date").unwrap();
        assert_eq!(column.dtype(), &DataType::Date);

        // days since 1970-01-01
        let days = column.date().unwrap();
        assert_eq!((days.get(0), days.get(1)), (Some(1), Some(19_782)));
    }
}
