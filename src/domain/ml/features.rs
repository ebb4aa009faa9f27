use crate::domain::errors::AnalysisError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Indicator values for one bar, plus its forward-looking label.
///
/// `label` is `None` only for the inference row, whose future window has not
/// been observed yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub adjusted_close: f64,
    pub daily_return: f64,
    pub volatility: f64,
    pub momentum: f64,
    pub sma_short: f64,
    pub sma_long: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub label: Option<bool>,
}

impl FeatureRow {
    pub fn vector(&self) -> Vec<f64> {
        crate::domain::ml::feature_registry::features_to_vector(self)
    }
}

/// Labeled feature rows in temporal order, terminated by one unlabeled
/// inference row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    ticker: String,
    future_horizon: usize,
    rows: Vec<FeatureRow>,
}

impl FeatureTable {
    /// Builds a table, enforcing that exactly the last row is unlabeled.
    pub fn new(
        ticker: impl Into<String>,
        future_horizon: usize,
        rows: Vec<FeatureRow>,
    ) -> Result<Self, AnalysisError> {
        let ticker = ticker.into();
        let Some((last, labeled)) = rows.split_last() else {
            return Err(AnalysisError::insufficient(
                format!("feature table {}", ticker),
                2,
                0,
            ));
        };
        if last.label.is_some() {
            return Err(AnalysisError::invalid(
                "feature table",
                "last row must be the unlabeled inference row",
            ));
        }
        if let Some(row) = labeled.iter().find(|r| r.label.is_none()) {
            return Err(AnalysisError::invalid(
                "feature table",
                format!("row {} is missing its label", row.date),
            ));
        }
        Ok(Self {
            ticker,
            future_horizon,
            rows,
        })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn future_horizon(&self) -> usize {
        self.future_horizon
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows usable for training and evaluation (all but the inference row).
    pub fn labeled_rows(&self) -> &[FeatureRow] {
        &self.rows[..self.rows.len() - 1]
    }

    /// The most recent row; its label is always `None`.
    pub fn inference_row(&self) -> &FeatureRow {
        &self.rows[self.rows.len() - 1]
    }

    /// The `n` most recent rows, for display.
    pub fn tail(&self, n: usize) -> &[FeatureRow] {
        &self.rows[self.rows.len().saturating_sub(n)..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(day: u32, label: Option<bool>) -> FeatureRow {
        FeatureRow {
            date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            adjusted_close: 100.0,
            daily_return: 0.0,
            volatility: 0.0,
            momentum: 0.0,
            sma_short: 100.0,
            sma_long: 100.0,
            macd: 0.0,
            macd_signal: 0.0,
            label,
        }
    }

    #[test]
    fn test_table_splits_labeled_and_inference_rows() {
        let table = FeatureTable::new(
            "MSFT",
            5,
            vec![row(1, Some(true)), row(2, Some(false)), row(3, None)],
        )
        .unwrap();

        assert_eq!(table.labeled_rows().len(), 2);
        assert_eq!(table.inference_row().date.to_string(), "2024-05-03");
        assert_eq!(table.tail(2).len(), 2);
        assert_eq!(table.tail(10).len(), 3);
    }

    #[test]
    fn test_table_rejects_labeled_last_row() {
        let err = FeatureTable::new("MSFT", 5, vec![row(1, Some(true)), row(2, Some(true))]);
        assert!(matches!(err, Err(AnalysisError::InvalidInput { .. })));
    }

    #[test]
    fn test_table_rejects_unlabeled_interior_row() {
        let err = FeatureTable::new("MSFT", 5, vec![row(1, None), row(2, None)]);
        assert!(err.is_err());
    }

    #[test]
    fn test_table_rejects_empty() {
        let err = FeatureTable::new("MSFT", 5, vec![]);
        assert!(matches!(err, Err(AnalysisError::InsufficientData { .. })));
    }
}
