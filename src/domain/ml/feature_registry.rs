use crate::domain::ml::features::FeatureRow;

/// Ordered list of feature names.
/// This order MUST match the weight order of every `TrainedModel`.
pub const FEATURE_NAMES: &[&str] = &[
    "return",
    "volatility",
    "momentum",
    "sma_short",
    "sma_long",
    "macd",
    "macd_signal",
];

pub const FEATURE_COUNT: usize = 7;

/// Converts a feature row into the model input vector (f64, registry order).
pub fn features_to_vector(row: &FeatureRow) -> Vec<f64> {
    vec![
        row.daily_return,
        row.volatility,
        row.momentum,
        row.sma_short,
        row.sma_long,
        row.macd,
        row.macd_signal,
    ]
}

/// Owned copy of the registry, stored with each trained model.
pub fn feature_names() -> Vec<String> {
    FEATURE_NAMES.iter().map(|s| s.to_string()).collect()
}
