use assert_approx_eq::assert_approx_eq;
use chrono::{Duration, NaiveDate};
use stock_forecast::data::PriceSeries;
use stock_forecast::error::ForecastError;
use stock_forecast::features::{build_training_table, FeatureVector};
use stock_forecast::models::{
    self, GradientBoostModel, GradientBoostParams, ModelParams, SeasonalModel, SeasonalParams,
    SeasonalityMode,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Consecutive calendar dates keep the trend linear in elapsed days.
fn daily_series(closes: Vec<f64>) -> PriceSeries {
    let start = date(2024, 7, 1);
    let dates: Vec<NaiveDate> = (0..closes.len())
        .map(|i| start + Duration::days(i as i64))
        .collect();
    PriceSeries::from_closes(dates, closes).unwrap()
}

#[test]
fn test_seasonal_recovers_linear_trend() {
    // Values 100 + i over consecutive days: the fit is exact and the
    // prediction at a date estimates the value one step after it.
    let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
    let series = daily_series(closes);
    let table = build_training_table(&series, 3).unwrap();

    let model = models::fit(&table, &ModelParams::Seasonal(SeasonalParams::default())).unwrap();

    let last_date = series.dates().last().copied().unwrap();
    let inputs = vec![
        FeatureVector {
            date: last_date,
            lags: Vec::new(),
        },
        FeatureVector {
            date: last_date + Duration::days(1),
            lags: Vec::new(),
        },
    ];
    let predictions = model.predict(&inputs).unwrap();

    assert_approx_eq!(predictions[0], 130.0);
    assert_approx_eq!(predictions[1], 131.0);
}

#[test]
fn test_seasonal_modes_produce_different_fits() {
    // A sawtooth over weekdays gives the modes something to disagree on.
    let closes: Vec<f64> = (0..40)
        .map(|i| 100.0 + 2.0 * i as f64 + if i % 7 == 0 { 8.0 } else { 0.0 })
        .collect();
    let series = daily_series(closes);
    let table = build_training_table(&series, 3).unwrap();

    let additive = SeasonalModel::new(SeasonalParams {
        seasonality_mode: SeasonalityMode::Additive,
        ..SeasonalParams::default()
    })
    .unwrap()
    .fit(&table)
    .unwrap();
    let multiplicative = SeasonalModel::new(SeasonalParams {
        seasonality_mode: SeasonalityMode::Multiplicative,
        ..SeasonalParams::default()
    })
    .unwrap()
    .fit(&table)
    .unwrap();

    let input = vec![FeatureVector {
        date: date(2024, 8, 19),
        lags: Vec::new(),
    }];
    let a = additive.predict(&input).unwrap()[0];
    let m = multiplicative.predict(&input).unwrap()[0];

    assert!(a.is_finite() && m.is_finite());
    assert!((a - m).abs() > 1e-9);
}

#[test]
fn test_seasonal_rejects_non_positive_scales() {
    let result = SeasonalModel::new(SeasonalParams {
        changepoint_prior_scale: 0.0,
        ..SeasonalParams::default()
    });
    assert!(matches!(result, Err(ForecastError::InvalidParameter(_))));

    let result = SeasonalModel::new(SeasonalParams {
        seasonality_prior_scale: -1.0,
        ..SeasonalParams::default()
    });
    assert!(matches!(result, Err(ForecastError::InvalidParameter(_))));
}

#[test]
fn test_gradient_boost_constant_series_predicts_constant() {
    let closes = vec![50.0; 20];
    let series = daily_series(closes);
    let table = build_training_table(&series, 4).unwrap();

    let model = GradientBoostModel::new(GradientBoostParams::default())
        .unwrap()
        .fit(&table, None)
        .unwrap();
    let predictions = model.predict(&table.feature_vectors()).unwrap();

    for p in predictions {
        assert_approx_eq!(p, 50.0);
    }
}

#[test]
fn test_gradient_boost_learns_lag_dependent_labels() {
    // Alternating closes make each label equal its first lag; boosting on
    // that split drives the residuals to zero.
    let closes: Vec<f64> = (0..20)
        .map(|i| if i % 2 == 0 { 10.0 } else { 20.0 })
        .collect();
    let series = daily_series(closes);
    let table = build_training_table(&series, 2).unwrap();

    let params = GradientBoostParams {
        rounds: 300,
        ..GradientBoostParams::default()
    };
    let model = GradientBoostModel::new(params).unwrap().fit(&table, None).unwrap();
    let predictions = model.predict(&table.feature_vectors()).unwrap();

    for (prediction, row) in predictions.iter().zip(table.rows()) {
        assert!(
            (prediction - row.label).abs() < 0.01,
            "prediction {} far from label {}",
            prediction,
            row.label
        );
    }
}

#[test]
fn test_gradient_boost_is_deterministic() {
    let closes: Vec<f64> = (0..30).map(|i| 100.0 + ((i * 13) % 7) as f64).collect();
    let series = daily_series(closes);
    let table = build_training_table(&series, 5).unwrap();

    let fit = |_: ()| {
        GradientBoostModel::new(GradientBoostParams::default())
            .unwrap()
            .fit(&table, None)
            .unwrap()
            .predict(&table.feature_vectors())
            .unwrap()
    };

    assert_eq!(fit(()), fit(()));
}

#[test]
fn test_gradient_boost_rejects_invalid_params() {
    let result = GradientBoostModel::new(GradientBoostParams {
        rounds: 0,
        ..GradientBoostParams::default()
    });
    assert!(matches!(result, Err(ForecastError::InvalidParameter(_))));

    let result = GradientBoostModel::new(GradientBoostParams {
        learning_rate: 1.5,
        ..GradientBoostParams::default()
    });
    assert!(matches!(result, Err(ForecastError::InvalidParameter(_))));
}

#[test]
fn test_gradient_boost_rejects_wrong_lag_count() {
    let closes: Vec<f64> = (0..15).map(|i| 10.0 + i as f64).collect();
    let series = daily_series(closes);
    let table = build_training_table(&series, 3).unwrap();

    let model = GradientBoostModel::new(GradientBoostParams::default())
        .unwrap()
        .fit(&table, None)
        .unwrap();

    let result = model.predict(&[FeatureVector {
        date: date(2024, 8, 1),
        lags: vec![1.0],
    }]);
    assert!(matches!(result, Err(ForecastError::ValidationError(_))));
}

#[test]
fn test_trained_model_names_identify_family() {
    let closes: Vec<f64> = (0..20).map(|i| 10.0 + i as f64).collect();
    let series = daily_series(closes);
    let table = build_training_table(&series, 3).unwrap();

    let seasonal =
        models::fit(&table, &ModelParams::Seasonal(SeasonalParams::default())).unwrap();
    assert!(seasonal.name().contains("Seasonal"));

    let boosted = models::fit(
        &table,
        &ModelParams::GradientBoost(GradientBoostParams::default()),
    )
    .unwrap();
    assert!(boosted.name().contains("Gradient Boost"));
}
