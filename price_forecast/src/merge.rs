//! Combining cleaned tables from several sources

use crate::data::PriceObservation;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::info;

/// Merge cleaned tables, the last table in input order winning on duplicate
/// (region, date) keys. Output is sorted by (date, region).
pub fn merge<I>(tables: I) -> Vec<PriceObservation>
where
    I: IntoIterator<Item = Vec<PriceObservation>>,
{
    let mut merged: BTreeMap<(NaiveDate, String), u64> = BTreeMap::new();
    let mut sources = 0;
    let mut overridden = 0;

    for table in tables {
        sources += 1;
        for observation in table {
            if merged
                .insert((observation.date, observation.region), observation.price)
                .is_some()
            {
                overridden += 1;
            }
        }
    }

    info!(sources, rows = merged.len(), overridden, "merged cleaned tables");

    merged
        .into_iter()
        .map(|((date, region), price)| PriceObservation {
            date,
            region,
            price,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(day: u32, region: &str, price: u64) -> PriceObservation {
        PriceObservation::new(NaiveDate::from_ymd_opt(2024, 1, day).unwrap(), region, price)
    }

    #[test]
    fn test_later_source_wins() {
        let older = vec![obs(1, "A", 100), obs(2, "A", 110)];
        let newer = vec![obs(2, "A", 150), obs(3, "A", 160)];

        let merged = merge(vec![older.clone(), newer.clone()]);
        assert_eq!(merged, vec![obs(1, "A", 100), obs(2, "A", 150), obs(3, "A", 160)]);

        let reversed = merge(vec![newer, older]);
        assert_eq!(reversed[1], obs(2, "A", 110));
    }

    #[test]
    fn test_sorted_by_date_then_region() {
        let merged = merge(vec![vec![obs(2, "B", 1), obs(1, "B", 2)], vec![obs(2, "A", 3)]]);
        assert_eq!(merged, vec![obs(1, "B", 2), obs(2, "A", 3), obs(2, "B", 1)]);
    }

    #[test]
    fn test_empty_input() {
        assert!(merge(Vec::<Vec<PriceObservation>>::new()).is_empty());
    }
}
