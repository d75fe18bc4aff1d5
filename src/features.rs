//! Lagged-feature construction for supervised forecasting.
//!
//! Converts the scalar close series into a table of lagged rows for model
//! fitting, and builds single feature vectors for the recursive multi-step
//! inference loop.

use chrono::NaiveDate;

use crate::data::PriceSeries;
use crate::error::{ForecastError, Result};

/// One supervised-learning row derived from the price series.
///
/// `lags[k-1]` is the close k steps before the row's reference date and
/// `label` is the close one step after it (the one-step-ahead shift).
#[derive(Debug, Clone, PartialEq)]
pub struct LaggedFeatureRow {
    /// Reference date of the row
    pub date: NaiveDate,
    /// Lagged closes, most recent first
    pub lags: Vec<f64>,
    /// Close one step after the reference date
    pub label: f64,
}

impl LaggedFeatureRow {
    /// The row's inputs without its label, for prediction.
    pub fn features(&self) -> FeatureVector {
        FeatureVector {
            date: self.date,
            lags: self.lags.clone(),
        }
    }
}

/// Unlabelled model input: a date plus its lag vector.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    /// Date the prediction is made for
    pub date: NaiveDate,
    /// Lagged closes, most recent first
    pub lags: Vec<f64>,
}

/// Time-ordered collection of lagged rows with a fixed lag depth.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    rows: Vec<LaggedFeatureRow>,
    lag_depth: usize,
}

impl FeatureTable {
    pub(crate) fn new(rows: Vec<LaggedFeatureRow>, lag_depth: usize) -> Self {
        Self { rows, lag_depth }
    }

    /// The table's rows in time order.
    pub fn rows(&self) -> &[LaggedFeatureRow] {
        &self.rows
    }

    /// Number of lag features per row.
    pub fn lag_depth(&self) -> usize {
        self.lag_depth
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The rows' labels in order.
    pub fn labels(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.label).collect()
    }

    /// The rows' feature vectors in order.
    pub fn feature_vectors(&self) -> Vec<FeatureVector> {
        self.rows.iter().map(|r| r.features()).collect()
    }
}

/// Build the training table from a price series.
///
/// For each position `i` with `lag_depth <= i <= len - 2`:
/// `lags = [close[i-1], .., close[i-lag_depth]]`, `label = close[i+1]`,
/// `date = date[i]`. The earliest `lag_depth` positions (insufficient
/// history) and the final position (nothing to label) are dropped, so a
/// series of length L yields exactly `L - lag_depth - 1` rows.
pub fn build_training_table(series: &PriceSeries, lag_depth: usize) -> Result<FeatureTable> {
    if lag_depth == 0 {
        return Err(ForecastError::InvalidParameter(
            "Lag depth must be positive".to_string(),
        ));
    }

    let dates = series.dates();
    let closes = series.closes();
    if closes.len() < lag_depth + 2 {
        return Err(ForecastError::InsufficientHistory(format!(
            "Need at least {} observations for lag depth {}, got {}",
            lag_depth + 2,
            lag_depth,
            closes.len()
        )));
    }

    let mut rows = Vec::with_capacity(closes.len() - lag_depth - 1);
    for i in lag_depth..closes.len() - 1 {
        let lags: Vec<f64> = (1..=lag_depth).map(|k| closes[i - k]).collect();
        rows.push(LaggedFeatureRow {
            date: dates[i],
            lags,
            label: closes[i + 1],
        });
    }

    Ok(FeatureTable::new(rows, lag_depth))
}

/// Build the feature vector for one inference step.
///
/// `trailing` is the working value buffer: observed closes followed by any
/// values predicted in earlier steps. Lags are taken from its tail, most
/// recent first. Only the first forecast step sees fully observed lags;
/// later steps consume prior predictions, which is the accepted source of
/// multi-step accuracy decay in this scheme.
pub fn build_inference_vector(
    trailing: &[f64],
    date: NaiveDate,
    lag_depth: usize,
) -> Result<FeatureVector> {
    if trailing.len() < lag_depth {
        return Err(ForecastError::InsufficientHistory(format!(
            "Need {} trailing values for lag depth {}, got {}",
            lag_depth,
            lag_depth,
            trailing.len()
        )));
    }

    let lags: Vec<f64> = (1..=lag_depth)
        .map(|k| trailing[trailing.len() - k])
        .collect();

    Ok(FeatureVector { date, lags })
}
