//! End-to-end forecast orchestration.
//!
//! Drives the pipeline: fetch history, build the lag table, split,
//! tune/fit, compute future business dates, predict step by step, and
//! assemble one chronologically ordered output series.

use std::sync::Arc;
use std::time::Instant;

use chrono::{Datelike, Duration, Local, NaiveDate};
use log::info;
use serde::Serialize;

use crate::calendar::{add_business_days, HolidayCache, Region};
use crate::data::{PriceProvider, PriceSeries};
use crate::error::{ForecastError, Result};
use crate::features::{build_inference_vector, build_training_table, FeatureTable};
use crate::models::{self, GradientBoostParams, ModelParams, SeasonalParams, TrainedModel};
use crate::split::{score, split, TRAIN_TEST, TRAIN_VAL_TEST};
use crate::tuning::{tune, CrossValidationConfig, SeasonalGrid};

/// One output point: a date paired with an observed close or a predicted
/// value. Serializes to the `{"label": date, "value": number}` record shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    #[serde(rename = "label")]
    pub date: NaiveDate,
    #[serde(rename = "value")]
    pub value: f64,
}

/// Which model family runs, and how it is configured.
#[derive(Debug, Clone)]
pub enum ModelSelection {
    /// Grid-search the seasonal family with rolling-origin cross-validation
    TunedSeasonal {
        grid: SeasonalGrid,
        cv: CrossValidationConfig,
    },
    /// Seasonal family with fixed parameters, no tuning
    Seasonal(SeasonalParams),
    /// Boosted trees with a fixed parameter set; validation rows are only
    /// monitored, never used for selection
    GradientBoost(GradientBoostParams),
}

impl Default for ModelSelection {
    fn default() -> Self {
        ModelSelection::TunedSeasonal {
            grid: SeasonalGrid::default(),
            cv: CrossValidationConfig::default(),
        }
    }
}

/// Orchestration settings for one forecaster.
#[derive(Debug, Clone)]
pub struct ForecastConfig {
    /// Holiday region for the business-day advance
    pub region: Region,
    /// Number of lagged closes per feature row
    pub lag_depth: usize,
    /// Business days to forecast; counts "today" when it is a business day
    pub horizon: usize,
    /// Calendar days of history fetched before `as_of`
    pub lookback_days: i64,
    /// Years past `as_of` covered by the holiday set
    pub holiday_years_ahead: i32,
    /// Model family and tuning choice
    pub model: ModelSelection,
    /// Fixed "today" for reproducible runs; `None` uses the local date
    pub as_of: Option<NaiveDate>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            region: Region::Australia,
            lag_depth: 10,
            horizon: 4,
            lookback_days: 90,
            holiday_years_ahead: 10,
            model: ModelSelection::default(),
            as_of: None,
        }
    }
}

/// Forecast orchestrator: owns the provider boundary, the configuration and
/// the process-wide holiday cache.
#[derive(Debug)]
pub struct Forecaster<P: PriceProvider> {
    provider: P,
    config: ForecastConfig,
    holiday_cache: Arc<HolidayCache>,
}

impl<P: PriceProvider> Forecaster<P> {
    /// Create a forecaster with its own holiday cache.
    pub fn new(provider: P, config: ForecastConfig) -> Self {
        Self::with_cache(provider, config, Arc::new(HolidayCache::new()))
    }

    /// Create a forecaster sharing an existing holiday cache.
    pub fn with_cache(provider: P, config: ForecastConfig, cache: Arc<HolidayCache>) -> Self {
        Self {
            provider,
            config,
            holiday_cache: cache,
        }
    }

    /// The forecaster's configuration.
    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Produce the combined history + forecast series for `ticker`.
    ///
    /// Future dates are the next `horizon` business days anchored at
    /// `as_of - 1 day`, the single rule that makes `as_of` itself the first
    /// forecast date whenever it is a business day.
    pub fn forecast(&self, ticker: &str) -> Result<Vec<ForecastPoint>> {
        let started = Instant::now();
        let as_of = self
            .config
            .as_of
            .unwrap_or_else(|| Local::now().date_naive());

        let end = as_of;
        let start = as_of - Duration::days(1) - Duration::days(self.config.lookback_days);
        let series = self.fetch_with_retry(ticker, start, end)?;
        if series.is_empty() {
            return Err(ForecastError::InsufficientHistory(format!(
                "No observations for {} in {}..={}",
                ticker, start, end
            )));
        }
        info!("obtained {} closes for {}", series.len(), ticker);

        let table = build_training_table(&series, self.config.lag_depth)?;
        let trained = self.train(&table)?;

        let holidays = self.holiday_cache.get_or_build(
            self.config.region,
            as_of.year(),
            as_of.year() + self.config.holiday_years_ahead,
        )?;
        let future_dates =
            add_business_days(as_of - Duration::days(1), self.config.horizon, &holidays)?;

        // Recursive multi-step inference: one value per step, each step's
        // lags drawn from history extended with earlier predictions.
        let mut working = series.closes();
        let mut forecast_points = Vec::with_capacity(future_dates.len());
        for date in future_dates {
            let input = build_inference_vector(&working, date, self.config.lag_depth)?;
            let predicted = trained.predict(std::slice::from_ref(&input))?;
            let value = predicted.first().copied().ok_or_else(|| {
                ForecastError::DataError("Model returned no prediction".to_string())
            })?;
            working.push(value);
            forecast_points.push(ForecastPoint { date, value });
        }

        let history: Vec<ForecastPoint> = series
            .dates()
            .into_iter()
            .zip(series.closes())
            .map(|(date, value)| ForecastPoint { date, value })
            .collect();

        let combined = assemble(history, forecast_points)?;
        info!(
            "forecast for {} took {:.2}s ({} points)",
            ticker,
            started.elapsed().as_secs_f64(),
            combined.len()
        );
        Ok(combined)
    }

    /// Split, optionally tune, fit, and log held-out accuracy.
    fn train(&self, table: &FeatureTable) -> Result<TrainedModel> {
        match &self.config.model {
            ModelSelection::TunedSeasonal { grid, cv } => {
                let parts = split(table, TRAIN_TEST)?;
                info!(
                    "split {} rows into {} train / {} test",
                    table.len(),
                    parts.train.len(),
                    parts.test.len()
                );
                let best = tune(&parts.train, grid, cv)?;
                let model = models::fit(&parts.train, &ModelParams::Seasonal(best))?;
                self.log_held_out(&model, &parts.test)?;
                Ok(model)
            }
            ModelSelection::Seasonal(params) => {
                let parts = split(table, TRAIN_TEST)?;
                let model = models::fit(&parts.train, &ModelParams::Seasonal(params.clone()))?;
                self.log_held_out(&model, &parts.test)?;
                Ok(model)
            }
            ModelSelection::GradientBoost(params) => {
                let parts = split(table, TRAIN_VAL_TEST)?;
                info!(
                    "split {} rows into {} train / {} validation / {} test",
                    table.len(),
                    parts.train.len(),
                    parts.validation.len(),
                    parts.test.len()
                );
                let model = models::fit_monitored(
                    &parts.train,
                    &ModelParams::GradientBoost(params.clone()),
                    Some(&parts.validation),
                )?;
                self.log_held_out(&model, &parts.test)?;
                Ok(model)
            }
        }
    }

    fn log_held_out(&self, model: &TrainedModel, test: &FeatureTable) -> Result<()> {
        if test.is_empty() {
            return Ok(());
        }
        let predictions = model.predict(&test.feature_vectors())?;
        let accuracy = score(&test.labels(), &predictions)?;
        info!("{}: held-out {}", model.name(), accuracy);
        Ok(())
    }

    /// One fetch, retried once with the identical request when the ticker
    /// does not resolve. The retry carries no correction; a second failure
    /// is fatal.
    fn fetch_with_retry(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries> {
        match self.provider.fetch(ticker, start, end) {
            Ok(series) => Ok(series),
            Err(ForecastError::UnknownTicker(_)) => {
                info!("ticker {} did not resolve, retrying fetch once", ticker);
                self.provider.fetch(ticker, start, end)
            }
            Err(err) => Err(err),
        }
    }
}

/// Concatenate history and forecast points into one strictly ascending
/// series. Duplicate dates are a contract violation.
pub fn assemble(
    history: Vec<ForecastPoint>,
    forecast: Vec<ForecastPoint>,
) -> Result<Vec<ForecastPoint>> {
    let mut combined = history;
    combined.extend(forecast);
    combined.sort_by_key(|p| p.date);

    for pair in combined.windows(2) {
        if pair[1].date <= pair[0].date {
            return Err(ForecastError::DataError(format!(
                "Output series has duplicate date {}",
                pair[1].date
            )));
        }
    }

    Ok(combined)
}

/// Serialize points to the list-of-records JSON transport shape.
pub fn to_json_records(points: &[ForecastPoint]) -> Result<String> {
    serde_json::to_string(points)
        .map_err(|e| ForecastError::DataError(format!("JSON serialization failed: {}", e)))
}
