use crate::domain::errors::AnalysisError;
use serde::{Deserialize, Serialize};

/// Numerically stable logistic function.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let exp_z = z.exp();
        exp_z / (1.0 + exp_z)
    }
}

/// Linear probabilistic model produced by a single `Classifier::fit` call.
///
/// Weights are expressed in raw feature space (any scaling applied during
/// training is already folded in), in the order of `feature_names`.
/// The model lives only for the duration of one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub classifier: String,
    pub feature_names: Vec<String>,
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl TrainedModel {
    pub fn new(
        classifier: impl Into<String>,
        feature_names: Vec<String>,
        weights: Vec<f64>,
        bias: f64,
    ) -> Result<Self, AnalysisError> {
        if feature_names.len() != weights.len() {
            return Err(AnalysisError::invalid(
                "model weights",
                format!(
                    "expected {} weights, got {}",
                    feature_names.len(),
                    weights.len()
                ),
            ));
        }
        if !bias.is_finite() || weights.iter().any(|w| !w.is_finite()) {
            return Err(AnalysisError::Model {
                model: classifier.into(),
                reason: "fit produced non-finite coefficients".to_string(),
            });
        }
        Ok(Self {
            classifier: classifier.into(),
            feature_names,
            weights,
            bias,
        })
    }

    /// Log-odds of the positive class.
    pub fn decision_function(&self, features: &[f64]) -> Result<f64, AnalysisError> {
        if features.len() != self.weights.len() {
            return Err(AnalysisError::invalid(
                "feature vector",
                format!(
                    "expected {} values, got {}",
                    self.weights.len(),
                    features.len()
                ),
            ));
        }
        Ok(self.bias
            + self
                .weights
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>())
    }

    /// Probability that the label is `true`, in [0, 1].
    pub fn predict_probability(&self, features: &[f64]) -> Result<f64, AnalysisError> {
        Ok(sigmoid(self.decision_function(features)?))
    }

    /// Thresholds `predict_probability` at 0.5.
    pub fn predict_label(&self, features: &[f64]) -> Result<bool, AnalysisError> {
        Ok(self.predict_probability(features)? >= 0.5)
    }
}
