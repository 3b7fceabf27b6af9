mod common;

use common::{daily, date};
use pretty_assertions::assert_eq;
use polars::prelude::{DataType, TakeRandomUtf8};
use price_forecast::data::{observations_to_dataframe, PriceObservation};
use price_forecast::features::{FeatureTransformer, RegionEncoding, MAX_LAG};
use price_forecast::models::FEATURE_NAMES;
use rstest::rstest;

#[test]
fn test_lags_follow_each_region() {
    let start = date("2024-01-01");
    let mut observations = daily("A", start, &(1..=20).collect::<Vec<_>>());
    observations.extend(daily("B", start, &(101..=120).collect::<Vec<_>>()));

    let (table, _) = FeatureTransformer::default().transform(&observations).unwrap();
    assert_eq!(table.len(), 2 * (20 - MAX_LAG));

    for row in table.rows() {
        assert_eq!(row.lag_1, row.price - 1);
        assert_eq!(row.lag_14, row.price - 14);
    }

    let first = &table.rows()[0];
    assert_eq!(first.date, date("2024-01-15"));
    assert_eq!(first.region, "A");
    assert_eq!((first.price, first.lag_1, first.lag_14), (15, 14, 1));
}

#[test]
fn test_two_region_scenario() {
    let start = date("2024-01-01");
    let mut observations = daily("B", start, &[200; 20]);
    observations.extend(daily("A", start, &[100; 20]));

    let (table, encoding) = FeatureTransformer::default().transform(&observations).unwrap();
    assert_eq!(encoding.id("A"), Some(0));
    assert_eq!(encoding.id("B"), Some(1));
    assert_eq!(encoding.regions_by_id(), vec!["A", "B"]);

    for row in table.rows() {
        let expected = if row.region == "A" { 0 } else { 1 };
        assert_eq!(row.region_id, expected);
    }
}

#[test]
fn test_transform_ignores_input_order() {
    let start = date("2024-02-01");
    let mut observations = daily("Aceh", start, &(500..540).collect::<Vec<_>>());
    observations.extend(daily("Bali", start, &(300..340).rev().collect::<Vec<_>>()));
    let mut shuffled = observations.clone();
    shuffled.reverse();
    shuffled.swap(3, 50);

    let transformer = FeatureTransformer::default();
    assert_eq!(
        transformer.transform(&observations).unwrap(),
        transformer.transform(&shuffled).unwrap()
    );
}

#[test]
fn test_encoding_survives_serialization() {
    let start = date("2024-01-01");
    let mut observations = daily("Low", start, &[10, 20]);
    observations.extend(daily("High", start, &[90, 95]));
    let encoding = RegionEncoding::from_observations(&observations);

    let json = serde_json::to_string(&encoding).unwrap();
    let restored: RegionEncoding = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, encoding);
    assert_eq!(restored.regions_by_id(), vec!["Low", "High"]);
}

#[rstest]
#[case("2024-04-02", false, false, false)]
#[case("2024-04-03", true, false, false)]
#[case("2024-04-09", true, false, false)]
#[case("2024-04-10", false, true, false)]
#[case("2024-04-11", false, false, true)]
#[case("2024-04-16", false, false, true)]
#[case("2024-04-17", false, false, false)]
fn test_holiday_flags(
    #[case] day: &str,
    #[case] before: bool,
    #[case] on: bool,
    #[case] after: bool,
) {
    let observations = daily("Aceh", date("2024-03-01"), &[100; 60]);
    let (table, _) = FeatureTransformer::default().transform(&observations).unwrap();

    let row = table
        .rows()
        .iter()
        .find(|row| row.date == date(day))
        .unwrap();
    assert_eq!(
        (row.before_holiday, row.on_holiday, row.after_holiday),
        (before, on, after)
    );
    assert_eq!((row.month, row.year), (4, 2024));
}

#[test]
fn test_feature_dataframe_layout() {
    let observations = daily("Aceh", date("2024-01-01"), &[100; 20]);
    let (table, _) = FeatureTransformer::default().transform(&observations).unwrap();
    let df = table.to_dataframe().unwrap();

    assert_eq!(df.height(), 6);
    let mut expected = vec!["Date", "Province", "Price"];
    expected.extend(FEATURE_NAMES);
    assert_eq!(df.get_column_names(), expected);
}

#[test]
fn test_observation_dataframe_layout() {
    let mut observations = daily("Aceh", date("2024-01-01"), &[100, 110, 120]);
    observations.push(PriceObservation::new(date("2024-01-01"), "Bali", 900));
    let df = observations_to_dataframe(&observations).unwrap();

    assert_eq!(df.height(), 4);
    assert_eq!(df.get_column_names(), vec!["Date", "Province", "Price"]);
    assert_eq!(df.column("Date").unwrap().dtype(), &DataType::Date);
    assert_eq!(df.column("Price").unwrap().dtype(), &DataType::Int64);

    let regions = df.column("Province").unwrap().utf8().unwrap();
    assert_eq!((regions.get(0), regions.get(3)), (Some("Aceh"), Some("Bali")));
}
