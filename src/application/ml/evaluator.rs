use super::classifier::Classifier;
use crate::domain::errors::AnalysisError;
use crate::domain::ml::{FeatureRow, FeatureTable, TrainedModel};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

pub const DEFAULT_HOLDOUT_PERCENT: usize = 20;

/// Result of one chronological train/holdout evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub model: TrainedModel,
    /// Probability of a rise for the inference (most recent) row
    pub probability_up: f64,
    pub holdout_accuracy: f64,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Trains the injected classifier on the older labeled rows and scores it on
/// the most recent ones.
///
/// The split is positional, never shuffled:
/// `test = ceil(n * holdout_percent / 100)`, `train = n - test`.
#[derive(Clone)]
pub struct Evaluator {
    classifier: Arc<dyn Classifier>,
    holdout_percent: usize,
}

impl Evaluator {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self {
            classifier,
            holdout_percent: DEFAULT_HOLDOUT_PERCENT,
        }
    }

    pub fn with_holdout_percent(mut self, percent: usize) -> Result<Self, AnalysisError> {
        if percent == 0 || percent >= 100 {
            return Err(AnalysisError::invalid(
                "holdout_percent",
                format!("must be in 1..=99, got {}", percent),
            ));
        }
        self.holdout_percent = percent;
        Ok(self)
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    /// `(train, test)` row counts for `labeled` labeled rows.
    pub fn split_sizes(&self, labeled: usize) -> (usize, usize) {
        let test = (labeled * self.holdout_percent).div_ceil(100);
        (labeled - test, test)
    }

    pub fn evaluate(&self, table: &FeatureTable) -> Result<Evaluation, AnalysisError> {
        let labeled = table.labeled_rows();
        let (train_rows, test_rows) = self.split_sizes(labeled.len());
        if train_rows == 0 || test_rows == 0 {
            return Err(AnalysisError::insufficient(
                format!(
                    "{} train/test split ({}% holdout)",
                    table.ticker(),
                    self.holdout_percent
                ),
                // Smallest count leaving at least one row on each side
                (100 / (100 - self.holdout_percent)).max(2),
                labeled.len(),
            ));
        }

        let (train, test) = labeled.split_at(train_rows);
        let (x_train, y_train) = to_xy(train);
        let model = self.classifier.fit(&x_train, &y_train)?;

        let mut correct = 0;
        for row in test {
            if Some(model.predict_label(&row.vector())?) == row.label {
                correct += 1;
            }
        }
        let holdout_accuracy = correct as f64 / test_rows as f64;
        let probability_up = model.predict_probability(&table.inference_row().vector())?;

        debug!(
            "Evaluator: {} train rows [{} .. {}], {} test rows",
            train_rows,
            train[0].date,
            train[train_rows - 1].date,
            test_rows
        );
        info!(
            "Evaluator: {} via {} -> P(up) = {:.4}, holdout accuracy = {:.2}%",
            table.ticker(),
            self.classifier.name(),
            probability_up,
            holdout_accuracy * 100.0
        );

        Ok(Evaluation {
            model,
            probability_up,
            holdout_accuracy,
            train_rows,
            test_rows,
        })
    }
}

fn to_xy(rows: &[FeatureRow]) -> (Vec<Vec<f64>>, Vec<bool>) {
    rows.iter()
        .map(|r| (r.vector(), r.label.unwrap_or(false)))
        .unzip()
}
