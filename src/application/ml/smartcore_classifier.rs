use super::classifier::{Classifier, Standardizer, into_model, training_matrix};
use crate::domain::errors::AnalysisError;
use crate::domain::ml::TrainedModel;
use ndarray::Array1;
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::logistic_regression::{LogisticRegression, LogisticRegressionParameters};
use tracing::debug;

/// Logistic regression backed by smartcore's solver.
///
/// Rows are standardised the same way as for `LogisticRegressionClassifier`
/// and the fitted coefficients are read back into a raw-space `TrainedModel`.
#[derive(Debug, Clone)]
pub struct SmartCoreLogisticClassifier {
    alpha: f64,
}

impl Default for SmartCoreLogisticClassifier {
    fn default() -> Self {
        Self { alpha: 1.0 }
    }
}

impl SmartCoreLogisticClassifier {
    pub const NAME: &'static str = "smartcore";

    /// `alpha` is the L2 penalty strength.
    pub fn new(alpha: f64) -> Result<Self, AnalysisError> {
        if !alpha.is_finite() || alpha < 0.0 {
            return Err(AnalysisError::invalid("alpha", "must be a non-negative number"));
        }
        Ok(Self { alpha })
    }

    fn model_error(reason: impl ToString) -> AnalysisError {
        AnalysisError::Model {
            model: Self::NAME.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl Classifier for SmartCoreLogisticClassifier {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn fit(&self, features: &[Vec<f64>], labels: &[bool]) -> Result<TrainedModel, AnalysisError> {
        let (x, _) = training_matrix(features, labels)?;
        let scaler = Standardizer::fit(&x);
        let scaled = scaler.transform(&x);

        let rows: Vec<Vec<f64>> = scaled.rows().into_iter().map(|r| r.to_vec()).collect();
        let x_matrix = DenseMatrix::from_2d_vec(&rows).map_err(Self::model_error)?;
        let y: Vec<i32> = labels.iter().map(|&l| i32::from(l)).collect();

        let params = LogisticRegressionParameters::default().with_alpha(self.alpha);
        let model = LogisticRegression::fit(&x_matrix, &y, params).map_err(Self::model_error)?;

        let coefficients = model.coefficients();
        let (_, n_features) = coefficients.shape();
        if n_features != scaled.ncols() {
            return Err(Self::model_error(format!(
                "expected {} coefficients, got {}",
                scaled.ncols(),
                n_features
            )));
        }
        let weights: Array1<f64> = (0..n_features).map(|j| *coefficients.get((0, j))).collect();
        let bias = *model.intercept().get((0, 0));

        let (raw_weights, raw_bias) = scaler.unscale(&weights, bias);
        debug!("SmartCore: fitted logistic regression on {} rows", features.len());
        into_model(Self::NAME, raw_weights, raw_bias)
    }
}
