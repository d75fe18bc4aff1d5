//! Seasonal-decomposition forecasting: linear trend plus weekly effects.
//!
//! A deterministic closed-form stand-in for the usual additive
//! trend/seasonality decomposition. The trend is an ordinary least-squares
//! line whose slope bends toward the most recent third of the window by an
//! amount governed by `changepoint_prior_scale`; per-weekday effects are
//! shrunken residual means governed by `seasonality_prior_scale`, applied
//! additively or multiplicatively.

use chrono::{Datelike, NaiveDate};

use crate::error::{ForecastError, Result};
use crate::features::{FeatureTable, FeatureVector};

/// How weekly effects combine with the trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonalityMode {
    /// Effects are offsets added to the trend
    Additive,
    /// Effects are factors multiplying the trend
    Multiplicative,
}

impl SeasonalityMode {
    /// Mode name as used in logs and model names.
    pub fn name(&self) -> &'static str {
        match self {
            SeasonalityMode::Additive => "additive",
            SeasonalityMode::Multiplicative => "multiplicative",
        }
    }
}

/// Hyperparameters for the seasonal family.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalParams {
    /// Trend flexibility: how far the slope bends toward the recent window
    pub changepoint_prior_scale: f64,
    /// Shrinkage strength for per-weekday effects
    pub seasonality_prior_scale: f64,
    /// Additive or multiplicative seasonality
    pub seasonality_mode: SeasonalityMode,
}

impl Default for SeasonalParams {
    fn default() -> Self {
        Self {
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            seasonality_mode: SeasonalityMode::Additive,
        }
    }
}

// Half-saturation constants for mapping the prior scales onto [0, 1) weights.
const CHANGEPOINT_PIVOT: f64 = 0.05;
const SEASONALITY_PIVOT: f64 = 1.0;

/// Seasonal model ready to fit
#[derive(Debug, Clone)]
pub struct SeasonalModel {
    name: String,
    params: SeasonalParams,
}

/// Trained seasonal model
#[derive(Debug, Clone)]
pub struct TrainedSeasonalModel {
    name: String,
    origin: NaiveDate,
    slope: f64,
    intercept: f64,
    weekday_effects: [f64; 7],
    mode: SeasonalityMode,
}

impl SeasonalModel {
    /// Create a new seasonal model, validating the parameter combination.
    pub fn new(params: SeasonalParams) -> Result<Self> {
        if params.changepoint_prior_scale <= 0.0 {
            return Err(ForecastError::InvalidParameter(
                "changepoint_prior_scale must be positive".to_string(),
            ));
        }
        if params.seasonality_prior_scale <= 0.0 {
            return Err(ForecastError::InvalidParameter(
                "seasonality_prior_scale must be positive".to_string(),
            ));
        }

        Ok(Self {
            name: format!(
                "Seasonal (changepoint={}, seasonality={}, mode={})",
                params.changepoint_prior_scale,
                params.seasonality_prior_scale,
                params.seasonality_mode.name()
            ),
            params,
        })
    }

    /// Fit trend and weekly effects on the table's (date, label) pairs.
    pub fn fit(&self, table: &FeatureTable) -> Result<TrainedSeasonalModel> {
        let rows = table.rows();
        if rows.len() < 2 {
            return Err(ForecastError::InsufficientHistory(format!(
                "Seasonal fit needs at least 2 rows, got {}",
                rows.len()
            )));
        }

        let origin = rows[0].date;
        let t: Vec<f64> = rows
            .iter()
            .map(|r| (r.date - origin).num_days() as f64)
            .collect();
        let y: Vec<f64> = rows.iter().map(|r| r.label).collect();

        let slope_all = ols_slope(&t, &y).ok_or_else(|| {
            ForecastError::DataError("Degenerate time axis in seasonal fit".to_string())
        })?;

        // Recent-window slope: the last third of the rows, at least two.
        let recent_len = (rows.len() / 3).max(2);
        let recent_start = rows.len() - recent_len;
        let slope_recent =
            ols_slope(&t[recent_start..], &y[recent_start..]).unwrap_or(slope_all);

        let flex = self.params.changepoint_prior_scale
            / (self.params.changepoint_prior_scale + CHANGEPOINT_PIVOT);
        let slope = (1.0 - flex) * slope_all + flex * slope_recent;

        let mean_t = t.iter().sum::<f64>() / t.len() as f64;
        let mean_y = y.iter().sum::<f64>() / y.len() as f64;
        let intercept = mean_y - slope * mean_t;

        // Shrunken per-weekday effects of the detrended series.
        let shrink = self.params.seasonality_prior_scale
            / (self.params.seasonality_prior_scale + SEASONALITY_PIVOT);
        let mut sums = [0.0_f64; 7];
        let mut counts = [0_usize; 7];
        for (row, &ti) in rows.iter().zip(t.iter()) {
            let trend = intercept + slope * ti;
            let w = row.date.weekday().num_days_from_monday() as usize;
            match self.params.seasonality_mode {
                SeasonalityMode::Additive => {
                    sums[w] += row.label - trend;
                    counts[w] += 1;
                }
                SeasonalityMode::Multiplicative => {
                    if trend.abs() > f64::EPSILON {
                        sums[w] += row.label / trend;
                        counts[w] += 1;
                    }
                }
            }
        }

        let neutral = match self.params.seasonality_mode {
            SeasonalityMode::Additive => 0.0,
            SeasonalityMode::Multiplicative => 1.0,
        };
        let mut weekday_effects = [neutral; 7];
        for w in 0..7 {
            if counts[w] > 0 {
                let mean = sums[w] / counts[w] as f64;
                weekday_effects[w] = neutral + (mean - neutral) * shrink;
            }
        }

        Ok(TrainedSeasonalModel {
            name: self.name.clone(),
            origin,
            slope,
            intercept,
            weekday_effects,
            mode: self.params.seasonality_mode,
        })
    }

    /// Name of the model
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedSeasonalModel {
    /// Predict one value per input date; lag features are ignored by this family.
    pub fn predict(&self, inputs: &[FeatureVector]) -> Result<Vec<f64>> {
        Ok(inputs
            .iter()
            .map(|fv| {
                let t = (fv.date - self.origin).num_days() as f64;
                let trend = self.intercept + self.slope * t;
                let effect = self.weekday_effects[fv.date.weekday().num_days_from_monday() as usize];
                match self.mode {
                    SeasonalityMode::Additive => trend + effect,
                    SeasonalityMode::Multiplicative => trend * effect,
                }
            })
            .collect())
    }

    /// Name of the model
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Least-squares slope of y on t; `None` when the time axis has no spread.
fn ols_slope(t: &[f64], y: &[f64]) -> Option<f64> {
    let n = t.len() as f64;
    if t.len() < 2 {
        return None;
    }
    let mean_t = t.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let var_t: f64 = t.iter().map(|&ti| (ti - mean_t).powi(2)).sum();
    if var_t <= f64::EPSILON {
        return None;
    }
    let cov: f64 = t
        .iter()
        .zip(y.iter())
        .map(|(&ti, &yi)| (ti - mean_t) * (yi - mean_y))
        .sum();
    Some(cov / var_t)
}
