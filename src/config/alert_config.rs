//! Sell-target configuration: `ALERT_TARGETS=AAPL:200,NVDA:1200,MSFT:450`.

use super::Lookup;
use crate::application::analyzer::normalize_ticker;
use anyhow::{Context, Result, bail};

pub const DEFAULT_ALERT_TARGETS: &str = "AAPL:200,NVDA:1200,MSFT:450";

#[derive(Debug, Clone, PartialEq)]
pub struct AlertTarget {
    pub ticker: String,
    pub target_price: f64,
}

/// Alert environment configuration
#[derive(Debug, Clone)]
pub struct AlertEnvConfig {
    pub targets: Vec<AlertTarget>,
}

impl AlertEnvConfig {
    pub fn from_lookup(lookup: Lookup) -> Result<Self> {
        let raw = lookup("ALERT_TARGETS").unwrap_or_else(|| DEFAULT_ALERT_TARGETS.to_string());
        Ok(Self {
            targets: Self::parse_targets(&raw).context("Failed to parse ALERT_TARGETS")?,
        })
    }

    pub fn target_for(&self, ticker: &str) -> Option<f64> {
        self.targets
            .iter()
            .find(|t| t.ticker.eq_ignore_ascii_case(ticker))
            .map(|t| t.target_price)
    }

    fn parse_targets(raw: &str) -> Result<Vec<AlertTarget>> {
        let mut targets: Vec<AlertTarget> = Vec::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let Some((sym, price)) = entry.split_once(':') else {
                bail!("entry '{}' must look like TICKER:PRICE", entry);
            };
            let ticker = normalize_ticker(sym)?;
            let target_price: f64 = price
                .trim()
                .parse()
                .context(format!("Invalid target price for {}", ticker))?;
            if !(target_price.is_finite() && target_price > 0.0) {
                bail!("target price for {} must be positive, got {}", ticker, target_price);
            }
            if targets.iter().any(|t| t.ticker == ticker) {
                bail!("duplicate ticker {}", ticker);
            }
            targets.push(AlertTarget {
                ticker,
                target_price,
            });
        }
        Ok(targets)
    }
}
