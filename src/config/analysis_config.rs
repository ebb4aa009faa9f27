//! Analysis configuration parsing from environment variables.

use super::{Lookup, parse_var};
use crate::application::analyzer::AnalysisSettings;
use crate::application::ml::{Classifier, LogisticRegressionClassifier, SmartCoreLogisticClassifier};
use anyhow::{Context, Result, ensure};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Which classifier backs the evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Logistic,
    SmartCore,
}

impl FromStr for ModelKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "logistic" => Ok(ModelKind::Logistic),
            "smartcore" => Ok(ModelKind::SmartCore),
            _ => anyhow::bail!(
                "Invalid ANALYSIS_MODEL: {}. Must be 'logistic' or 'smartcore'",
                s
            ),
        }
    }
}

impl ModelKind {
    pub fn build(self) -> Arc<dyn Classifier> {
        match self {
            ModelKind::Logistic => Arc::new(LogisticRegressionClassifier::default()),
            ModelKind::SmartCore => Arc::new(SmartCoreLogisticClassifier::default()),
        }
    }
}

/// Analysis environment configuration
#[derive(Debug, Clone)]
pub struct AnalysisEnvConfig {
    pub lookback_days: u32,
    pub future_days: usize,
    pub min_probability_to_buy: f64,
    pub holdout_percent: usize,
    pub model: ModelKind,
    pub price_data_dir: PathBuf,
    pub feature_tail_rows: usize,
}

impl Default for AnalysisEnvConfig {
    fn default() -> Self {
        Self {
            lookback_days: 180,
            future_days: 30,
            min_probability_to_buy: 0.7,
            holdout_percent: 20,
            model: ModelKind::Logistic,
            price_data_dir: PathBuf::from("data/prices"),
            feature_tail_rows: 5,
        }
    }
}

impl AnalysisEnvConfig {
    pub fn from_lookup(lookup: Lookup) -> Result<Self> {
        let defaults = Self::default();
        let model = match lookup("ANALYSIS_MODEL") {
            Some(raw) => ModelKind::from_str(&raw)?,
            None => defaults.model,
        };

        let config = Self {
            lookback_days: parse_var(lookup, "ANALYSIS_LOOKBACK_DAYS", defaults.lookback_days)?,
            future_days: parse_var(lookup, "ANALYSIS_FUTURE_DAYS", defaults.future_days)?,
            min_probability_to_buy: parse_var(
                lookup,
                "MIN_PROBABILITY_TO_BUY",
                defaults.min_probability_to_buy,
            )?,
            holdout_percent: parse_var(lookup, "HOLDOUT_PERCENT", defaults.holdout_percent)?,
            model,
            price_data_dir: lookup("PRICE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.price_data_dir),
            feature_tail_rows: parse_var(lookup, "FEATURE_TAIL_ROWS", defaults.feature_tail_rows)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.lookback_days > 0, "ANALYSIS_LOOKBACK_DAYS must be > 0");
        ensure!(self.future_days > 0, "ANALYSIS_FUTURE_DAYS must be > 0");
        ensure!(
            (0.0..=1.0).contains(&self.min_probability_to_buy),
            "MIN_PROBABILITY_TO_BUY must be within [0, 1], got {}",
            self.min_probability_to_buy
        );
        ensure!(
            (1..100).contains(&self.holdout_percent),
            "HOLDOUT_PERCENT must be within 1..=99, got {}",
            self.holdout_percent
        );
        Ok(())
    }

    /// Per-call settings seeded from this configuration.
    pub fn settings(&self, target_price: Option<f64>) -> Result<AnalysisSettings> {
        AnalysisSettings::new(
            self.min_probability_to_buy,
            target_price,
            self.holdout_percent,
            self.feature_tail_rows,
        )
        .context("Invalid analysis settings")
    }
}
