//! Hyperparameter grid search with rolling-origin cross-validation.

use chrono::Duration;
use log::{debug, info};
use rayon::prelude::*;

use crate::error::{ForecastError, Result};
use crate::features::FeatureTable;
use crate::models::{self, ModelParams, SeasonalParams, SeasonalityMode};
use crate::split::score;

/// Hyperparameter grid for the seasonal family.
///
/// `candidates()` enumerates the full cartesian product in a fixed order,
/// which is also the tie-break order during selection.
#[derive(Debug, Clone)]
pub struct SeasonalGrid {
    pub changepoint_prior_scale: Vec<f64>,
    pub seasonality_prior_scale: Vec<f64>,
    pub seasonality_mode: Vec<SeasonalityMode>,
}

impl Default for SeasonalGrid {
    fn default() -> Self {
        Self {
            changepoint_prior_scale: vec![0.001, 0.01, 0.05],
            seasonality_prior_scale: vec![0.01, 1.0, 5.0, 10.0],
            seasonality_mode: vec![SeasonalityMode::Additive, SeasonalityMode::Multiplicative],
        }
    }
}

impl SeasonalGrid {
    /// All parameter combinations, changepoint scale varying slowest.
    pub fn candidates(&self) -> Vec<SeasonalParams> {
        let mut all = Vec::with_capacity(
            self.changepoint_prior_scale.len()
                * self.seasonality_prior_scale.len()
                * self.seasonality_mode.len(),
        );
        for &cps in &self.changepoint_prior_scale {
            for &sps in &self.seasonality_prior_scale {
                for &mode in &self.seasonality_mode {
                    all.push(SeasonalParams {
                        changepoint_prior_scale: cps,
                        seasonality_prior_scale: sps,
                        seasonality_mode: mode,
                    });
                }
            }
        }
        all
    }
}

/// Rolling-origin cross-validation windows, in calendar days over the
/// table's date span.
#[derive(Debug, Clone, Copy)]
pub struct CrossValidationConfig {
    /// Span of the first training window
    pub initial_days: i64,
    /// How far the cutoff slides between folds
    pub period_days: i64,
    /// Span forecast past each cutoff
    pub horizon_days: i64,
}

impl Default for CrossValidationConfig {
    fn default() -> Self {
        Self {
            initial_days: 60,
            period_days: 3,
            horizon_days: 3,
        }
    }
}

impl CrossValidationConfig {
    fn validate(&self) -> Result<()> {
        if self.initial_days <= 0 || self.period_days <= 0 || self.horizon_days <= 0 {
            return Err(ForecastError::InvalidParameter(
                "Cross-validation windows must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Row-index bounds of each fold: train is `[0, train_end)`, test is
/// `[train_end, test_end)`.
///
/// The cutoff starts `initial_days` past the first row's date and slides by
/// `period_days` until the test window would run past the last row.
pub fn rolling_origin_folds(
    table: &FeatureTable,
    config: &CrossValidationConfig,
) -> Result<Vec<(usize, usize)>> {
    config.validate()?;

    let dates: Vec<_> = table.rows().iter().map(|r| r.date).collect();
    let mut folds = Vec::new();
    let (Some(&first), Some(&last)) = (dates.first(), dates.last()) else {
        return Ok(folds);
    };

    let mut cutoff = first + Duration::days(config.initial_days);
    while cutoff + Duration::days(config.horizon_days) <= last {
        let train_end = dates.partition_point(|d| *d <= cutoff);
        let test_end =
            dates.partition_point(|d| *d <= cutoff + Duration::days(config.horizon_days));
        if train_end >= 2 && test_end > train_end {
            folds.push((train_end, test_end));
        }
        cutoff += Duration::days(config.period_days);
    }

    Ok(folds)
}

/// Mean absolute error of `params` across all rolling-origin folds.
///
/// Folds are independent and evaluated on rayon workers; the aggregate is a
/// mean over the fold-indexed results, so fold completion order cannot
/// change the outcome.
pub fn cross_validate(
    table: &FeatureTable,
    params: &ModelParams,
    config: &CrossValidationConfig,
) -> Result<f64> {
    let folds = rolling_origin_folds(table, config)?;
    if folds.is_empty() {
        return Err(ForecastError::InsufficientHistory(format!(
            "Table spans too few days for cross-validation (initial={} horizon={})",
            config.initial_days, config.horizon_days
        )));
    }

    let rows = table.rows();
    let depth = table.lag_depth();
    let fold_maes: Result<Vec<f64>> = folds
        .par_iter()
        .map(|&(train_end, test_end)| {
            let train = FeatureTable::new(rows[..train_end].to_vec(), depth);
            let model = models::fit(&train, params)?;

            let test_rows = &rows[train_end..test_end];
            let inputs: Vec<_> = test_rows.iter().map(|r| r.features()).collect();
            let actuals: Vec<f64> = test_rows.iter().map(|r| r.label).collect();
            let predictions = model.predict(&inputs)?;

            Ok(score(&actuals, &predictions)?.mae)
        })
        .collect();
    let fold_maes = fold_maes?;

    Ok(fold_maes.iter().sum::<f64>() / fold_maes.len() as f64)
}

/// Grid-search the seasonal family, selecting the candidate with the
/// minimum cross-validated mean absolute error.
///
/// Candidates are evaluated sequentially in enumeration order; ties keep
/// the first seen. If every candidate fails to fit, the last underlying
/// error surfaces as `TuningExhausted`.
pub fn tune(
    table: &FeatureTable,
    grid: &SeasonalGrid,
    config: &CrossValidationConfig,
) -> Result<SeasonalParams> {
    let mut best: Option<(SeasonalParams, f64)> = None;
    let mut last_error: Option<ForecastError> = None;

    for candidate in grid.candidates() {
        match cross_validate(table, &ModelParams::Seasonal(candidate.clone()), config) {
            Ok(mae) => {
                debug!(
                    "candidate changepoint={} seasonality={} mode={}: cv mae {:.4}",
                    candidate.changepoint_prior_scale,
                    candidate.seasonality_prior_scale,
                    candidate.seasonality_mode.name(),
                    mae
                );
                let improved = best.as_ref().map_or(true, |(_, best_mae)| mae < *best_mae);
                if improved {
                    best = Some((candidate, mae));
                }
            }
            Err(err) => {
                debug!("candidate failed cross-validation: {}", err);
                last_error = Some(err);
            }
        }
    }

    match best {
        Some((params, mae)) => {
            info!(
                "best params: changepoint={} seasonality={} mode={} (cv mae {:.4})",
                params.changepoint_prior_scale,
                params.seasonality_prior_scale,
                params.seasonality_mode.name(),
                mae
            );
            Ok(params)
        }
        None => Err(ForecastError::TuningExhausted(
            last_error.map_or_else(|| "grid holds no candidates".to_string(), |e| e.to_string()),
        )),
    }
}
