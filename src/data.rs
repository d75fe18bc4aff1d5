//! Price series data handling for forecasting

use std::fs::File;
use std::path::Path;

use chrono::{Duration, NaiveDate};
use polars::prelude::*;

use crate::error::{ForecastError, Result};

/// Ordered daily `(date, close)` series for one ticker.
///
/// Backed by a two-column DataFrame (`date: Date`, `close: Float64`).
/// Dates are strictly increasing; weekends and holidays are simply absent,
/// no gap filling. Immutable once constructed for a run.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    df: DataFrame,
}

/// Upstream collaborator boundary: "given ticker + date range, return an
/// ordered price series".
///
/// `UnknownTicker` must be distinguishable from `Ok` with an empty series.
pub trait PriceProvider {
    /// Fetch the daily close series for `ticker` over `[start, end]`.
    fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries>;
}

/// Data loader for price series
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a price series from a CSV file.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<PriceSeries> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::from_dataframe(df)
    }

    /// Build a price series from an existing DataFrame, detecting the date
    /// and close columns and dropping everything else (open/high/low/volume
    /// and similar raw columns are not used by the pipeline).
    pub fn from_dataframe(df: DataFrame) -> Result<PriceSeries> {
        let time_column = Self::detect_time_column(&df)?;
        let close_column = Self::detect_close_column(&df)?;

        let dates = Self::column_as_dates(&df, &time_column)?;
        let closes = Self::column_as_f64(&df, &close_column)?;

        PriceSeries::from_closes(dates, closes)
    }

    /// Detect the time column in a DataFrame
    fn detect_time_column(df: &DataFrame) -> Result<String> {
        let column_names = df.get_column_names();

        for name in &column_names {
            let lower_name = name.to_lowercase();
            if lower_name.contains("time")
                || lower_name.contains("date")
                || lower_name.contains("timestamp")
            {
                return Ok(name.to_string());
            }
        }

        if let Some(first_col) = df.get_columns().first() {
            if first_col.dtype().is_temporal() {
                return Ok(first_col.name().to_string());
            }
        }

        Err(ForecastError::DataError(
            "No time column found in data".to_string(),
        ))
    }

    /// Detect the close-price column, falling back to a generic price column
    fn detect_close_column(df: &DataFrame) -> Result<String> {
        let column_names = df.get_column_names();

        for name in &column_names {
            if name.to_lowercase().contains("close") {
                return Ok(name.to_string());
            }
        }
        for name in &column_names {
            if name.to_lowercase().contains("price") {
                return Ok(name.to_string());
            }
        }

        Err(ForecastError::DataError(
            "No close price column found in data".to_string(),
        ))
    }

    fn column_as_dates(df: &DataFrame, column_name: &str) -> Result<Vec<NaiveDate>> {
        let col = df.column(column_name).map_err(|e| {
            ForecastError::DataError(format!("Column '{}' not found: {}", column_name, e))
        })?;
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();

        let dates: Vec<Option<NaiveDate>> = match col.dtype() {
            DataType::Date => col
                .date()?
                .into_iter()
                .map(|opt| opt.map(|days| epoch + Duration::days(days as i64)))
                .collect(),
            DataType::Datetime(time_unit, _) => {
                let per_second: i64 = match time_unit {
                    TimeUnit::Nanoseconds => 1_000_000_000,
                    TimeUnit::Microseconds => 1_000_000,
                    TimeUnit::Milliseconds => 1_000,
                };
                col.datetime()?
                    .into_iter()
                    .map(|opt| opt.map(|ts| epoch + Duration::days(ts / per_second / 86_400)))
                    .collect()
            }
            DataType::Utf8 => col
                .utf8()?
                .into_iter()
                .map(|opt| {
                    opt.and_then(|s| NaiveDate::parse_from_str(&s[..s.len().min(10)], "%Y-%m-%d").ok())
                })
                .collect(),
            _ => {
                return Err(ForecastError::DataError(format!(
                    "Column '{}' cannot be read as dates",
                    column_name
                )))
            }
        };

        dates
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| {
                ForecastError::DataError(format!(
                    "Column '{}' holds missing or unparseable dates",
                    column_name
                ))
            })
    }

    fn column_as_f64(df: &DataFrame, column_name: &str) -> Result<Vec<f64>> {
        let col = df.column(column_name).map_err(|e| {
            ForecastError::DataError(format!("Column '{}' not found: {}", column_name, e))
        })?;

        match col.dtype() {
            DataType::Float64 => Ok(col.f64()?.into_iter().flatten().collect()),
            DataType::Float32 => Ok(col
                .f32()?
                .into_iter()
                .flatten()
                .map(|v| v as f64)
                .collect()),
            DataType::Int64 => Ok(col
                .i64()?
                .into_iter()
                .flatten()
                .map(|v| v as f64)
                .collect()),
            DataType::Int32 => Ok(col
                .i32()?
                .into_iter()
                .flatten()
                .map(|v| v as f64)
                .collect()),
            _ => Err(ForecastError::DataError(format!(
                "Column '{}' cannot be converted to f64",
                column_name
            ))),
        }
    }
}

impl PriceSeries {
    /// Create a price series from parallel date and close vectors.
    ///
    /// Dates must be strictly increasing; duplicates or reordering are a
    /// contract violation from the upstream source.
    pub fn from_closes(dates: Vec<NaiveDate>, closes: Vec<f64>) -> Result<Self> {
        if dates.len() != closes.len() {
            return Err(ForecastError::DataError(format!(
                "Date count ({}) doesn't match close count ({})",
                dates.len(),
                closes.len()
            )));
        }
        for pair in dates.windows(2) {
            if pair[1] <= pair[0] {
                return Err(ForecastError::DataError(format!(
                    "Price series dates must be strictly increasing, got {} after {}",
                    pair[1], pair[0]
                )));
            }
        }

        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        let day_numbers: Vec<i32> = dates
            .iter()
            .map(|d| (*d - epoch).num_days() as i32)
            .collect();

        let date_series = Series::new("date", day_numbers).cast(&DataType::Date)?;
        let close_series = Series::new("close", closes);
        let df = DataFrame::new(vec![date_series, close_series])?;

        Ok(Self { df })
    }

    /// Get the backing DataFrame
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Get the dates as a vector
    pub fn dates(&self) -> Vec<NaiveDate> {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        match self.df.column("date").and_then(|col| col.date()) {
            Ok(ca) => ca
                .into_iter()
                .flatten()
                .map(|days| epoch + Duration::days(days as i64))
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Get the close prices as a vector
    pub fn closes(&self) -> Vec<f64> {
        match self.df.column("close").and_then(|col| col.f64()) {
            Ok(ca) => ca.into_iter().flatten().collect(),
            Err(_) => Vec::new(),
        }
    }

    /// First date in the series, if any.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates().first().copied()
    }

    /// Last date in the series, if any.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates().last().copied()
    }

    /// Check if the series is empty
    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Get the length of the series
    pub fn len(&self) -> usize {
        self.df.height()
    }
}
