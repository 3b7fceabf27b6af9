#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use price_forecast::data::{PriceObservation, WideTable};

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Build a wide table from string cells; empty strings become missing cells
pub fn wide_table(header: &[&str], rows: &[&[&str]]) -> WideTable {
    let header = header.iter().map(|h| h.to_string()).collect();
    let records = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| {
                    if cell.is_empty() {
                        None
                    } else {
                        Some(cell.to_string())
                    }
                })
                .collect()
        })
        .collect();
    WideTable::from_grid(header, records).unwrap()
}

/// Consecutive daily observations of one region starting at `start`
pub fn daily(region: &str, start: NaiveDate, prices: &[u64]) -> Vec<PriceObservation> {
    prices
        .iter()
        .enumerate()
        .map(|(i, price)| PriceObservation::new(start + Duration::days(i as i64), region, *price))
        .collect()
}

/// Write a wide CSV with `days` daily columns starting at `start`
pub fn wide_csv(start: NaiveDate, days: usize, regions: &[(&str, u64)]) -> String {
    let mut csv = String::from("Province");
    for i in 0..days {
        let day = start + Duration::days(i as i64);
        csv.push(',');
        csv.push_str(&day.format("%d/%m/%Y").to_string());
    }
    csv.push('\n');

    for (region, base) in regions {
        csv.push_str(region);
        for i in 0..days {
            csv.push_str(&format!(",{}", base + (i as u64 % 7) * 10));
        }
        csv.push('\n');
    }
    csv
}
