//! Wide-to-long reshaping and per-region gap filling
//!
//! Cleaning never fails on a malformed cell. Unparseable dates drop their
//! column, unparseable prices become gaps, and gaps are repaired by forward
//! fill then backward fill over each region's complete daily range.

use crate::data::{region_names, PriceObservation, WideTable};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Parse a `DD/MM/YYYY` label, ignoring any whitespace inside it
pub fn parse_date_label(label: &str) -> Option<NaiveDate> {
    let compact: String = label.chars().filter(|c| !c.is_whitespace()).collect();
    NaiveDate::parse_from_str(&compact, "%d/%m/%Y").ok()
}

/// Parse a price cell.
///
/// A lone `-`, thousands separators aside, anything that is not a finite
/// non-negative number is treated as missing.
pub fn parse_price_token(token: &str) -> Option<f64> {
    let token = token.trim();
    if token == "-" {
        return None;
    }

    let value: f64 = token.replace(',', "").parse().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}

/// Forward fill then backward fill a series of optional values in place
pub fn fill_gaps(values: &mut [Option<f64>]) {
    let mut last = None;
    for value in values.iter_mut() {
        match value {
            Some(v) => last = Some(*v),
            None => *value = last,
        }
    }

    let mut next = None;
    for value in values.iter_mut().rev() {
        match value {
            Some(v) => next = Some(*v),
            None => *value = next,
        }
    }
}

/// Clean one wide table into long observations sorted by (date, region)
pub fn clean(table: &WideTable) -> Vec<PriceObservation> {
    let dates: Vec<Option<NaiveDate>> = table
        .date_labels()
        .iter()
        .map(|label| parse_date_label(label))
        .collect();

    let unparsed = dates.iter().filter(|d| d.is_none()).count();
    if unparsed > 0 {
        debug!(unparsed, "ignoring columns without a valid date label");
    }

    // region -> date -> price; a later parsed value replaces an earlier one
    let mut series: BTreeMap<&str, BTreeMap<NaiveDate, Option<f64>>> = BTreeMap::new();
    for row in table.rows() {
        let by_date = series.entry(row.region.as_str()).or_default();
        for (date, cell) in dates.iter().zip(row.cells.iter()) {
            let Some(date) = date else { continue };
            let price = cell.as_deref().and_then(parse_price_token);
            let slot = by_date.entry(*date).or_insert(None);
            if price.is_some() {
                *slot = price;
            }
        }
    }

    let mut observations = Vec::new();
    for (region, by_date) in series {
        let filled = fill_region(region, &by_date);
        if filled.is_empty() {
            warn!(region, "region has no parseable prices, skipping");
        }
        observations.extend(filled);
    }

    observations.sort_by(|a, b| (a.date, &a.region).cmp(&(b.date, &b.region)));
    info!(
        rows = observations.len(),
        regions = region_names(&observations).len(),
        "cleaned source table"
    );
    observations
}

/// Reindex one region onto its full daily range and fill the gaps
fn fill_region(region: &str, by_date: &BTreeMap<NaiveDate, Option<f64>>) -> Vec<PriceObservation> {
    let (Some(first), Some(last)) = (by_date.keys().next(), by_date.keys().next_back()) else {
        return Vec::new();
    };
    if by_date.values().all(Option::is_none) {
        return Vec::new();
    }

    let days: Vec<NaiveDate> = first.iter_days().take_while(|d| d <= last).collect();
    let mut prices: Vec<Option<f64>> = days
        .iter()
        .map(|d| by_date.get(d).copied().flatten())
        .collect();
    fill_gaps(&mut prices);

    days.into_iter()
        .zip(prices)
        .filter_map(|(date, price)| {
            price.map(|p| PriceObservation::new(date, region, p.round_ties_even() as u64))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1,234", Some(1234.0))]
    #[case(" 15,750 ", Some(15750.0))]
    #[case("-", None)]
    #[case(" - ", None)]
    #[case("", None)]
    #[case("n/a", None)]
    #[case("12500.6", Some(12500.6))]
    #[case("-40", None)]
    #[case("NaN", None)]
    fn test_parse_price_token(#[case] token: &str, #[case] expected: Option<f64>) {
        assert_eq!(parse_price_token(token), expected);
    }

    #[rstest]
    #[case("01/02/2024", Some((2024, 2, 1)))]
    #[case("01/ 02/ 2024", Some((2024, 2, 1)))]
    #[case(" 1/2/2024 ", Some((2024, 2, 1)))]
    #[case("31/02/2024", None)]
    #[case("No", None)]
    fn test_parse_date_label(#[case] label: &str, #[case] expected: Option<(i32, u32, u32)>) {
        let expected = expected.map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap());
        assert_eq!(parse_date_label(label), expected);
    }

    #[test]
    fn test_fill_gaps() {
        let mut values = vec![None, Some(1.0), None, None, Some(4.0), None];
        fill_gaps(&mut values);
        assert_eq!(
            values,
            vec![Some(1.0), Some(1.0), Some(1.0), Some(1.0), Some(4.0), Some(4.0)]
        );

        let mut empty: Vec<Option<f64>> = vec![None, None];
        fill_gaps(&mut empty);
        assert_eq!(empty, vec![None, None]);
    }
}
