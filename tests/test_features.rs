use chrono::{Datelike, Duration, NaiveDate};
use pretty_assertions::assert_eq;
use rstest::rstest;
use stock_forecast::data::PriceSeries;
use stock_forecast::error::ForecastError;
use stock_forecast::features::{build_inference_vector, build_training_table};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn business_days(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(count);
    let mut current = start;
    while dates.len() < count {
        if current.weekday().num_days_from_monday() < 5 {
            dates.push(current);
        }
        current += Duration::days(1);
    }
    dates
}

fn series_of(closes: Vec<f64>) -> PriceSeries {
    let dates = business_days(date(2024, 7, 1), closes.len());
    PriceSeries::from_closes(dates, closes).unwrap()
}

#[test]
fn test_fifteen_points_lag_ten_yields_four_rows() {
    let closes: Vec<f64> = (0..15).map(|i| 10.0 + 0.1 * i as f64).collect();
    let table = build_training_table(&series_of(closes), 10).unwrap();

    assert_eq!(table.len(), 4);
    assert_eq!(table.lag_depth(), 10);
}

#[rstest]
#[case(12, 10, 1)]
#[case(13, 10, 2)]
#[case(20, 5, 14)]
#[case(8, 3, 4)]
fn test_row_count_is_len_minus_depth_minus_one(
    #[case] len: usize,
    #[case] depth: usize,
    #[case] expected_rows: usize,
) {
    let closes: Vec<f64> = (0..len).map(|i| 100.0 + i as f64).collect();
    let table = build_training_table(&series_of(closes), depth).unwrap();

    assert_eq!(table.len(), expected_rows);
}

#[test]
fn test_lag_and_label_alignment() {
    let closes = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let series = series_of(closes);
    let dates = series.dates();
    let table = build_training_table(&series, 2).unwrap();

    // First row sits at index 2: lags are the values at indices 1 and 0,
    // most recent first, and the label is the value at index 3.
    assert_eq!(table.rows()[0].date, dates[2]);
    assert_eq!(table.rows()[0].lags, vec![2.0, 1.0]);
    assert_eq!(table.rows()[0].label, 4.0);

    // Last row labels the final value.
    let last = table.rows().last().unwrap();
    assert_eq!(last.date, dates[4]);
    assert_eq!(last.lags, vec![4.0, 3.0]);
    assert_eq!(last.label, 6.0);
}

#[test]
fn test_short_series_is_insufficient_history() {
    let closes = vec![1.0, 2.0, 3.0, 4.0, 5.0];
    let result = build_training_table(&series_of(closes), 4);

    assert!(matches!(
        result,
        Err(ForecastError::InsufficientHistory(_))
    ));
}

#[test]
fn test_minimum_length_series_yields_one_row() {
    // lag_depth + 2 observations is the smallest series with a full row.
    let closes = vec![1.0, 2.0, 3.0, 4.0, 5.0];
    let table = build_training_table(&series_of(closes), 3).unwrap();

    assert_eq!(table.len(), 1);
    assert_eq!(table.rows()[0].lags, vec![3.0, 2.0, 1.0]);
    assert_eq!(table.rows()[0].label, 5.0);
}

#[test]
fn test_zero_lag_depth_rejected() {
    let closes = vec![1.0, 2.0, 3.0];
    let result = build_training_table(&series_of(closes), 0);

    assert!(matches!(result, Err(ForecastError::InvalidParameter(_))));
}

#[test]
fn test_inference_vector_reads_tail_most_recent_first() {
    let trailing = vec![1.0, 2.0, 3.0, 4.0, 5.0];
    let vector = build_inference_vector(&trailing, date(2024, 8, 1), 3).unwrap();

    assert_eq!(vector.date, date(2024, 8, 1));
    assert_eq!(vector.lags, vec![5.0, 4.0, 3.0]);
}

#[test]
fn test_inference_vector_needs_enough_trailing_values() {
    let trailing = vec![1.0, 2.0];
    let result = build_inference_vector(&trailing, date(2024, 8, 1), 3);

    assert!(matches!(
        result,
        Err(ForecastError::InsufficientHistory(_))
    ));
}
