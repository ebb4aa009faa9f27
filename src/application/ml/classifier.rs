use crate::domain::errors::AnalysisError;
use crate::domain::ml::TrainedModel;
use crate::domain::ml::feature_registry::{FEATURE_COUNT, feature_names};
use ndarray::{Array1, Array2, Axis};

/// Interface for binary probabilistic classifiers
pub trait Classifier: Send + Sync {
    /// Get model name/type
    fn name(&self) -> &str;

    /// Fit on rows in registry order. Labels: `true` = price went up.
    fn fit(&self, features: &[Vec<f64>], labels: &[bool]) -> Result<TrainedModel, AnalysisError>;
}

/// Checks shape, finiteness and class balance, and packs the rows into a
/// design matrix.
pub fn training_matrix(
    features: &[Vec<f64>],
    labels: &[bool],
) -> Result<(Array2<f64>, Array1<f64>), AnalysisError> {
    if features.is_empty() {
        return Err(AnalysisError::insufficient("classifier training set", 1, 0));
    }
    if features.len() != labels.len() {
        return Err(AnalysisError::invalid(
            "labels",
            format!("{} labels for {} feature rows", labels.len(), features.len()),
        ));
    }
    if let Some((i, row)) = features
        .iter()
        .enumerate()
        .find(|(_, row)| row.len() != FEATURE_COUNT)
    {
        return Err(AnalysisError::invalid(
            format!("feature row {}", i),
            format!("expected {} values, got {}", FEATURE_COUNT, row.len()),
        ));
    }
    if let Some(i) = features
        .iter()
        .position(|row| row.iter().any(|v| !v.is_finite()))
    {
        return Err(AnalysisError::invalid(
            format!("feature row {}", i),
            "contains a non-finite value",
        ));
    }

    let positives = labels.iter().filter(|&&l| l).count();
    if positives == 0 || positives == labels.len() {
        return Err(AnalysisError::DegenerateLabels {
            label: positives > 0,
            rows: labels.len(),
        });
    }

    let flat: Vec<f64> = features.iter().flatten().copied().collect();
    let x = Array2::from_shape_vec((features.len(), FEATURE_COUNT), flat)
        .map_err(|e| AnalysisError::invalid("feature matrix", e.to_string()))?;
    let y = labels.iter().map(|&l| if l { 1.0 } else { 0.0 }).collect();
    Ok((x, y))
}

/// Per-column z-score scaling fitted on the training rows.
///
/// Constant columns keep a scale of 1.0, so they are only centred.
#[derive(Debug, Clone)]
pub struct Standardizer {
    means: Array1<f64>,
    scales: Array1<f64>,
}

impl Standardizer {
    pub fn fit(x: &Array2<f64>) -> Self {
        let n = x.nrows().max(1) as f64;
        let means = x.sum_axis(Axis(0)) / n;
        let scales = x
            .axis_iter(Axis(1))
            .zip(means.iter())
            .map(|(col, &mean)| {
                let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                let sd = var.sqrt();
                if sd > 1e-12 { sd } else { 1.0 }
            })
            .collect();
        Self { means, scales }
    }

    pub fn transform(&self, x: &Array2<f64>) -> Array2<f64> {
        (x - &self.means) / &self.scales
    }

    /// Maps weights learned on scaled inputs back to raw feature space:
    /// `w_raw = w / s`, `b_raw = b - sum(w * m / s)`.
    pub fn unscale(&self, weights: &Array1<f64>, bias: f64) -> (Vec<f64>, f64) {
        let raw: Array1<f64> = weights / &self.scales;
        let shift = raw.dot(&self.means);
        (raw.to_vec(), bias - shift)
    }
}

/// Wraps fitted raw-space coefficients into a `TrainedModel`.
pub fn into_model(name: &str, weights: Vec<f64>, bias: f64) -> Result<TrainedModel, AnalysisError> {
    TrainedModel::new(name, feature_names(), weights, bias)
}
