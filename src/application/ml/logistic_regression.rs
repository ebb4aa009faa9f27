//! L2-regularised logistic regression trained by full-batch gradient descent.
//!
//! Inputs are z-scored before training and the learned coefficients are
//! mapped back to raw feature space, so the resulting `TrainedModel` scores
//! unscaled rows directly. Weights start at zero, which makes every fit
//! deterministic.

use super::classifier::{Classifier, Standardizer, into_model, training_matrix};
use crate::domain::errors::AnalysisError;
use crate::domain::ml::TrainedModel;
use crate::domain::ml::trained_model::sigmoid;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegressionConfig {
    pub learning_rate: f64,
    pub max_iter: usize,
    /// Stop once the log loss improves by less than this between iterations
    pub tolerance: f64,
    pub l2_penalty: f64,
}

impl Default for LogisticRegressionConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            max_iter: 2_000,
            tolerance: 1e-9,
            l2_penalty: 1e-2,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogisticRegressionClassifier {
    config: LogisticRegressionConfig,
}

impl LogisticRegressionClassifier {
    pub const NAME: &'static str = "logistic";

    pub fn new(config: LogisticRegressionConfig) -> Result<Self, AnalysisError> {
        if !(config.learning_rate > 0.0 && config.learning_rate.is_finite()) {
            return Err(AnalysisError::invalid("learning_rate", "must be a positive number"));
        }
        if config.max_iter == 0 {
            return Err(AnalysisError::invalid("max_iter", "must be > 0"));
        }
        let non_negative = |v: f64| v.is_finite() && v >= 0.0;
        if !non_negative(config.l2_penalty) || !non_negative(config.tolerance) {
            return Err(AnalysisError::invalid(
                "l2_penalty/tolerance",
                "must be non-negative",
            ));
        }
        Ok(Self { config })
    }

    fn gradient_descent(&self, x: &Array2<f64>, y: &Array1<f64>) -> (Array1<f64>, f64) {
        let n = x.nrows() as f64;
        let cfg = &self.config;
        let mut weights = Array1::<f64>::zeros(x.ncols());
        let mut bias = 0.0;
        let mut prev_cost = f64::INFINITY;

        for iter in 0..cfg.max_iter {
            let predictions = (x.dot(&weights) + bias).mapv(sigmoid);
            let errors = &predictions - y;
            let dw = x.t().dot(&errors) / n + &weights * cfg.l2_penalty;
            let db = errors.sum() / n;

            weights = &weights - &(dw * cfg.learning_rate);
            bias -= cfg.learning_rate * db;

            let cost = log_loss(y, &predictions);
            if (prev_cost - cost).abs() < cfg.tolerance {
                debug!("LogisticRegression: converged at iteration {} (loss {:.6})", iter, cost);
                break;
            }
            prev_cost = cost;
        }
        (weights, bias)
    }
}

impl Classifier for LogisticRegressionClassifier {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn fit(&self, features: &[Vec<f64>], labels: &[bool]) -> Result<TrainedModel, AnalysisError> {
        let (x, y) = training_matrix(features, labels)?;
        let scaler = Standardizer::fit(&x);
        let (weights, bias) = self.gradient_descent(&scaler.transform(&x), &y);
        let (raw_weights, raw_bias) = scaler.unscale(&weights, bias);

        debug!(
            "LogisticRegression: fitted on {} rows, bias {:.4}",
            features.len(),
            raw_bias
        );
        into_model(Self::NAME, raw_weights, raw_bias)
    }
}

/// Binary cross-entropy with clipped probabilities.
fn log_loss(y: &Array1<f64>, p: &Array1<f64>) -> f64 {
    let eps = 1e-15;
    -y.iter()
        .zip(p.iter())
        .map(|(&y, &p)| {
            let p = p.clamp(eps, 1.0 - eps);
            y * p.ln() + (1.0 - y) * (1.0 - p).ln()
        })
        .sum::<f64>()
        / y.len() as f64
}
