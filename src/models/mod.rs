//! Forecasting model families behind one tagged capability interface.
//!
//! The trainer and tuner are agnostic to which family is active: every
//! family exposes fit-on-a-table and predict-from-feature-vectors, and the
//! family plus its hyperparameters travel together as a tagged variant.

use crate::error::Result;
use crate::features::{FeatureTable, FeatureVector};

pub mod gradient_boost;
pub mod seasonal;

pub use gradient_boost::{GradientBoostModel, GradientBoostParams, TrainedGradientBoost};
pub use seasonal::{SeasonalModel, SeasonalParams, SeasonalityMode, TrainedSeasonalModel};

/// Named hyperparameter set for one model family.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelParams {
    /// Trend + weekly-seasonality decomposition, predicts from dates
    Seasonal(SeasonalParams),
    /// Boosted regression trees, predicts from lag features
    GradientBoost(GradientBoostParams),
}

/// Opaque fitted artifact bound to one parameter set and one training
/// partition. Lives for a single orchestration run; never persisted.
#[derive(Debug, Clone)]
pub enum TrainedModel {
    Seasonal(TrainedSeasonalModel),
    GradientBoost(TrainedGradientBoost),
}

impl TrainedModel {
    /// Predict one value per input feature vector.
    pub fn predict(&self, inputs: &[FeatureVector]) -> Result<Vec<f64>> {
        match self {
            TrainedModel::Seasonal(m) => m.predict(inputs),
            TrainedModel::GradientBoost(m) => m.predict(inputs),
        }
    }

    /// Name of the fitted model
    pub fn name(&self) -> &str {
        match self {
            TrainedModel::Seasonal(m) => m.name(),
            TrainedModel::GradientBoost(m) => m.name(),
        }
    }
}

/// Fit the family selected by `params` on the training table.
pub fn fit(table: &FeatureTable, params: &ModelParams) -> Result<TrainedModel> {
    fit_monitored(table, params, None)
}

/// Fit with an optional validation partition.
///
/// The validation rows are only *monitored* (their error is logged by the
/// tree family); they never drive early stopping or selection. The seasonal
/// family has no per-round progress to monitor and ignores them.
pub fn fit_monitored(
    table: &FeatureTable,
    params: &ModelParams,
    validation: Option<&FeatureTable>,
) -> Result<TrainedModel> {
    match params {
        ModelParams::Seasonal(p) => {
            let model = SeasonalModel::new(p.clone())?;
            Ok(TrainedModel::Seasonal(model.fit(table)?))
        }
        ModelParams::GradientBoost(p) => {
            let model = GradientBoostModel::new(p.clone())?;
            Ok(TrainedModel::GradientBoost(model.fit(table, validation)?))
        }
    }
}
