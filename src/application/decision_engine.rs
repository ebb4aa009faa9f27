use crate::domain::errors::AnalysisError;
use crate::domain::trading::{TargetCheck, Verdict};

pub const DEFAULT_BUY_THRESHOLD: f64 = 0.7;

/// `Buy` only when the probability strictly exceeds the threshold.
pub fn decide(probability_up: f64, threshold: f64) -> Verdict {
    if probability_up > threshold {
        Verdict::Buy
    } else {
        Verdict::HoldOrWait
    }
}

/// Inclusive: a price sitting exactly on the target counts as reached.
pub fn target_reached(current_price: f64, target_price: f64) -> bool {
    current_price >= target_price
}

pub fn check_target(current_price: f64, target_price: f64) -> TargetCheck {
    TargetCheck {
        target_price,
        current_price,
        reached: target_reached(current_price, target_price),
    }
}

/// Rejects thresholds outside `[0, 1]` (including NaN).
pub fn validate_threshold(threshold: f64) -> Result<f64, AnalysisError> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(AnalysisError::invalid(
            "buy threshold",
            format!("must be within [0, 1], got {}", threshold),
        ))
    }
}

pub fn validate_target_price(target_price: f64) -> Result<f64, AnalysisError> {
    if target_price.is_finite() && target_price > 0.0 {
        Ok(target_price)
    } else {
        Err(AnalysisError::invalid(
            "target price",
            format!("must be a positive number, got {}", target_price),
        ))
    }
}
