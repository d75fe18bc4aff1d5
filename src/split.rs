//! Deterministic time-ordered partitioning and accuracy scoring.

use crate::error::{ForecastError, Result};
use crate::features::FeatureTable;

/// Fractions of the table assigned to each partition, in time order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitRatios {
    pub train: f64,
    pub validation: f64,
    pub test: f64,
}

/// 80/20 train/test protocol (no validation partition).
pub const TRAIN_TEST: SplitRatios = SplitRatios {
    train: 0.8,
    validation: 0.0,
    test: 0.2,
};

/// 70/15/15 protocol with a validation partition.
pub const TRAIN_VAL_TEST: SplitRatios = SplitRatios {
    train: 0.7,
    validation: 0.15,
    test: 0.15,
};

impl SplitRatios {
    fn validate(&self) -> Result<()> {
        let parts = [self.train, self.validation, self.test];
        if parts.iter().any(|p| !(0.0..=1.0).contains(p)) {
            return Err(ForecastError::InvalidParameter(
                "Split ratios must lie in [0, 1]".to_string(),
            ));
        }
        let sum: f64 = parts.iter().sum();
        if (sum - 1.0).abs() > 1e-9 {
            return Err(ForecastError::InvalidParameter(format!(
                "Split ratios must sum to 1, got {}",
                sum
            )));
        }
        Ok(())
    }
}

/// Contiguous, order-preserving partitions of a feature table.
#[derive(Debug, Clone)]
pub struct TableSplit {
    pub train: FeatureTable,
    pub validation: FeatureTable,
    pub test: FeatureTable,
}

/// Partition a time-ordered table at index cut-points derived from `ratios`.
///
/// No shuffling: row order is preserved and the partitions are disjoint and
/// exhaustive. Cut-points are `floor(n * train)` and
/// `floor(n * (train + validation))`.
pub fn split(table: &FeatureTable, ratios: SplitRatios) -> Result<TableSplit> {
    ratios.validate()?;

    let n = table.len();
    let rows = table.rows();
    let depth = table.lag_depth();

    let train_end = (n as f64 * ratios.train) as usize;
    let validation_end = (n as f64 * (ratios.train + ratios.validation)) as usize;

    Ok(TableSplit {
        train: FeatureTable::new(rows[..train_end].to_vec(), depth),
        validation: FeatureTable::new(rows[train_end..validation_end].to_vec(), depth),
        test: FeatureTable::new(rows[validation_end..].to_vec(), depth),
    })
}

/// Held-out accuracy: mean absolute error and root-mean-square error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Accuracy {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
}

impl std::fmt::Display for Accuracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MAE={:.4} RMSE={:.4}", self.mae, self.rmse)
    }
}

/// Score predictions against actual values.
pub fn score(actuals: &[f64], predictions: &[f64]) -> Result<Accuracy> {
    if actuals.len() != predictions.len() || actuals.is_empty() {
        return Err(ForecastError::ValidationError(
            "Actuals and predictions must have the same non-zero length".to_string(),
        ));
    }

    let n = actuals.len() as f64;
    let errors: Vec<f64> = actuals
        .iter()
        .zip(predictions.iter())
        .map(|(&a, &p)| a - p)
        .collect();

    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
    let mse = errors.iter().map(|e| e.powi(2)).sum::<f64>() / n;

    Ok(Accuracy {
        mae,
        rmse: mse.sqrt(),
    })
}
