//! Feature derivation from daily price history.
//!
//! Every indicator uses the adjusted close and only bars up to and including
//! the row's own bar. Rows whose trailing window or label lookahead falls
//! outside the series are dropped, never filled.
//!
//! Conventions:
//! - Volatility is the *sample* standard deviation (n - 1) of daily returns
//! - EMAs (and therefore MACD and its signal) are seeded with the first value
//! - Rolling means and deviations are recomputed per window, so no running-sum
//!   drift builds up over long series

use crate::domain::errors::AnalysisError;
use crate::domain::market::PriceSeries;
use crate::domain::ml::{FeatureRow, FeatureTable};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use ta::Next;
use ta::indicators::{BollingerBands, MovingAverageConvergenceDivergence, RelativeStrengthIndex};
use tracing::debug;

/// Window lengths (in bars) of every derived indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEngineConfig {
    pub volatility_window: usize,
    pub momentum_lookback: usize,
    pub sma_short_period: usize,
    pub sma_long_period: usize,
    pub ema_fast_period: usize,
    pub ema_slow_period: usize,
    pub signal_period: usize,
}

impl Default for FeatureEngineConfig {
    fn default() -> Self {
        Self {
            volatility_window: 5,
            momentum_lookback: 5,
            sma_short_period: 20,
            sma_long_period: 50,
            ema_fast_period: 12,
            ema_slow_period: 26,
            signal_period: 9,
        }
    }
}

impl FeatureEngineConfig {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let periods = [
            ("momentum_lookback", self.momentum_lookback),
            ("sma_short_period", self.sma_short_period),
            ("sma_long_period", self.sma_long_period),
            ("ema_fast_period", self.ema_fast_period),
            ("ema_slow_period", self.ema_slow_period),
            ("signal_period", self.signal_period),
        ];
        for (field, value) in periods {
            if value == 0 {
                return Err(AnalysisError::invalid(field, "must be > 0"));
            }
        }
        if self.volatility_window < 2 {
            return Err(AnalysisError::invalid(
                "volatility_window",
                "sample standard deviation needs at least 2 returns",
            ));
        }
        if self.ema_fast_period >= self.ema_slow_period {
            return Err(AnalysisError::invalid(
                "ema_fast_period",
                format!(
                    "must be shorter than ema_slow_period ({} >= {})",
                    self.ema_fast_period, self.ema_slow_period
                ),
            ));
        }
        Ok(())
    }

    /// Index of the first bar whose features are all defined.
    ///
    /// Returns start at bar 1, so `volatility_window` returns end no earlier
    /// than bar `volatility_window`.
    pub fn warmup(&self) -> usize {
        self.sma_long_period.saturating_sub(1)
            .max(self.sma_short_period.saturating_sub(1))
            .max(self.volatility_window)
            .max(self.momentum_lookback)
    }

    /// Shortest series yielding one labeled row plus one inference row.
    pub fn min_series_len(&self, future_horizon: usize) -> usize {
        self.warmup() + future_horizon + 2
    }
}

/// Latest indicator values for display. Not used for training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub date: chrono::NaiveDate,
    pub adjusted_close: f64,
    pub sma_20: f64,
    pub sma_50: f64,
    pub momentum: f64,
    pub volatility: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub bb_upper: f64,
    pub bb_lower: f64,
    pub rsi_14: f64,
}

const BB_PERIOD: usize = 20;
const BB_STD_DEV: f64 = 2.0;
const RSI_PERIOD: usize = 14;

/// Pure transform from a `PriceSeries` to a labeled `FeatureTable`.
#[derive(Debug, Clone, Default)]
pub struct FeatureEngine {
    config: FeatureEngineConfig,
}

impl FeatureEngine {
    pub fn new(config: FeatureEngineConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FeatureEngineConfig {
        &self.config
    }

    /// Derives features and labels.
    ///
    /// Labeled rows are bars `warmup..=n-2-h`: the most recent bar is kept
    /// back as the inference row and never serves as a label target. The
    /// table therefore holds exactly `n - warmup - h` rows.
    pub fn derive(
        &self,
        series: &PriceSeries,
        future_horizon: usize,
    ) -> Result<FeatureTable, AnalysisError> {
        if future_horizon == 0 {
            return Err(AnalysisError::invalid(
                "future_horizon",
                "must be at least 1 bar",
            ));
        }

        let prices = positive_prices(series)?;
        let n = prices.len();
        let required = self.config.min_series_len(future_horizon);
        if n < required {
            return Err(AnalysisError::insufficient(
                format!(
                    "{} feature table (horizon {} bars)",
                    series.ticker(),
                    future_horizon
                ),
                required,
                n,
            ));
        }

        let cfg = &self.config;
        let warmup = cfg.warmup();
        let last_labeled = n - 2 - future_horizon;
        let returns = daily_returns(&prices);
        let mut macd = self.macd()?;

        let bars = series.bars();
        let mut rows = Vec::with_capacity(n - warmup - future_horizon);
        for i in 0..n {
            // The recursive averages must see every bar, including warm-up bars.
            let macd_out = macd.next(prices[i]);
            if i < warmup {
                continue;
            }

            let label = if i <= last_labeled {
                Some(prices[i + future_horizon] > prices[i])
            } else if i == n - 1 {
                None
            } else {
                continue;
            };

            rows.push(FeatureRow {
                date: bars[i].date,
                adjusted_close: prices[i],
                daily_return: returns[i],
                volatility: trailing(&returns, i, cfg.volatility_window).std_dev(),
                momentum: prices[i] - prices[i - cfg.momentum_lookback],
                sma_short: trailing(&prices, i, cfg.sma_short_period).mean(),
                sma_long: trailing(&prices, i, cfg.sma_long_period).mean(),
                macd: macd_out.macd,
                macd_signal: macd_out.signal,
                label,
            });
        }

        debug!(
            "FeatureEngine: {} bars -> {} rows for {} (warmup {}, horizon {})",
            n,
            rows.len(),
            series.ticker(),
            warmup,
            future_horizon
        );

        FeatureTable::new(series.ticker(), future_horizon, rows)
    }

    /// Display indicators for the most recent bar.
    pub fn indicator_snapshot(&self, series: &PriceSeries) -> Result<IndicatorSnapshot, AnalysisError> {
        let prices = positive_prices(series)?;
        let n = prices.len();
        let cfg = &self.config;
        let required = cfg.warmup().max(BB_PERIOD).max(RSI_PERIOD) + 1;
        if n < required {
            return Err(AnalysisError::insufficient(
                format!("{} indicator snapshot", series.ticker()),
                required,
                n,
            ));
        }

        let mut macd = self.macd()?;
        let mut bb = BollingerBands::new(BB_PERIOD, BB_STD_DEV)
            .map_err(|e| AnalysisError::invalid("bollinger bands", format!("{:?}", e)))?;
        let mut rsi = RelativeStrengthIndex::new(RSI_PERIOD)
            .map_err(|e| AnalysisError::invalid("rsi period", format!("{:?}", e)))?;

        let mut last_macd = None;
        let mut last_bb = None;
        let mut last_rsi = 0.0;
        for &price in &prices {
            last_macd = Some(macd.next(price));
            last_bb = Some(bb.next(price));
            last_rsi = rsi.next(price);
        }
        let (Some(macd_out), Some(bb_out), Some(bar)) = (last_macd, last_bb, series.last()) else {
            return Err(AnalysisError::insufficient("indicator snapshot", 1, 0));
        };

        let returns = daily_returns(&prices);
        let i = n - 1;
        Ok(IndicatorSnapshot {
            date: bar.date,
            adjusted_close: prices[i],
            sma_20: trailing(&prices, i, cfg.sma_short_period).mean(),
            sma_50: trailing(&prices, i, cfg.sma_long_period).mean(),
            momentum: prices[i] - prices[i - cfg.momentum_lookback],
            volatility: trailing(&returns, i, cfg.volatility_window).std_dev(),
            macd: macd_out.macd,
            macd_signal: macd_out.signal,
            bb_upper: bb_out.upper,
            bb_lower: bb_out.lower,
            rsi_14: last_rsi,
        })
    }

    fn macd(&self) -> Result<MovingAverageConvergenceDivergence, AnalysisError> {
        MovingAverageConvergenceDivergence::new(
            self.config.ema_fast_period,
            self.config.ema_slow_period,
            self.config.signal_period,
        )
        .map_err(|e| AnalysisError::invalid("macd periods", format!("{:?}", e)))
    }
}

/// Adjusted closes, rejecting zero prices (returns would be undefined).
fn positive_prices(series: &PriceSeries) -> Result<Vec<f64>, AnalysisError> {
    let prices = series.adjusted_closes();
    if let Some(bar) = series.bars().iter().find(|b| b.adjusted_close <= 0.0) {
        return Err(AnalysisError::invalid(
            format!("bar {} adjusted_close", bar.date),
            "must be > 0 to compute returns",
        ));
    }
    Ok(prices)
}

/// `returns[i] = p[i] / p[i-1] - 1`; `returns[0]` is NaN and never read.
fn daily_returns(prices: &[f64]) -> Vec<f64> {
    std::iter::once(f64::NAN)
        .chain(prices.windows(2).map(|w| w[1] / w[0] - 1.0))
        .collect()
}

/// The `len` values ending at (and including) index `i`.
fn trailing(values: &[f64], i: usize, len: usize) -> &[f64] {
    &values[i + 1 - len..=i]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::Bar;
    use chrono::NaiveDate;

    fn series_from(prices: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let bars = prices
            .iter()
            .enumerate()
            .map(|(i, &p)| Bar::flat(start + chrono::Duration::days(i as i64), p, 1_000.0))
            .collect();
        PriceSeries::new("TEST", bars).unwrap()
    }

    fn linear(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    fn ema(values: &[f64], span: usize) -> Vec<f64> {
        let alpha = 2.0 / (span as f64 + 1.0);
        let mut out: Vec<f64> = Vec::with_capacity(values.len());
        for &v in values {
            let next = match out.last() {
                Some(&prev) => alpha * v + (1.0 - alpha) * prev,
                None => v,
            };
            out.push(next);
        }
        out
    }

    #[test]
    fn test_default_warmup_is_longest_window_minus_one() {
        assert_eq!(FeatureEngineConfig::default().warmup(), 49);
        assert_eq!(FeatureEngineConfig::default().min_series_len(30), 81);
    }

    #[test]
    fn test_table_length_matches_formula() {
        let engine = FeatureEngine::default();
        for (n, h) in [(120, 10), (200, 30), (81, 30), (60, 1)] {
            let table = engine.derive(&series_from(&linear(n)), h).unwrap();
            assert_eq!(table.len(), n - 49 - h, "n={} h={}", n, h);
        }
    }

    #[test]
    fn test_boundary_lengths() {
        let engine = FeatureEngine::default();
        let h = 10;

        let table = engine.derive(&series_from(&linear(51 + h)), h).unwrap();
        assert_eq!(table.labeled_rows().len(), 1);
        assert!(table.inference_row().label.is_none());

        let err = engine.derive(&series_from(&linear(50 + h)), h).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InsufficientData {
                required: 61,
                available: 60,
                ..
            }
        ));
    }

    #[test]
    fn test_zero_horizon_is_invalid() {
        let err = FeatureEngine::default()
            .derive(&series_from(&linear(100)), 0)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput { .. }));
    }

    #[test]
    fn test_first_row_values_on_linear_series() {
        let prices = linear(100);
        let table = FeatureEngine::default().derive(&series_from(&prices), 5).unwrap();
        let row = &table.rows()[0];

        // First defined row is bar 49 (price 149)
        assert_eq!(row.adjusted_close, 149.0);
        assert!((row.daily_return - (149.0 / 148.0 - 1.0)).abs() < 1e-12);
        assert!((row.momentum - 5.0).abs() < 1e-12);
        assert!((row.sma_short - 139.5).abs() < 1e-9);
        assert!((row.sma_long - 124.5).abs() < 1e-9);

        let window: Vec<f64> = (45..=49)
            .map(|i| prices[i] / prices[i - 1] - 1.0)
            .collect();
        let mean = window.iter().sum::<f64>() / 5.0;
        let sample_var = window.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / 4.0;
        assert!((row.volatility - sample_var.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_macd_uses_first_value_seeded_emas() {
        let prices: Vec<f64> = (0..90)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 4.0 + i as f64 * 0.2)
            .collect();
        let table = FeatureEngine::default().derive(&series_from(&prices), 3).unwrap();

        let ema12 = ema(&prices, 12);
        let ema26 = ema(&prices, 26);
        let macd: Vec<f64> = ema12.iter().zip(&ema26).map(|(a, b)| a - b).collect();
        let signal = ema(&macd, 9);

        let row = &table.rows()[0];
        assert!((row.macd - macd[49]).abs() < 1e-9);
        assert!((row.macd_signal - signal[49]).abs() < 1e-9);

        let last = table.inference_row();
        assert!((last.macd - macd[89]).abs() < 1e-9);
        assert!((last.macd_signal - signal[89]).abs() < 1e-9);
    }

    #[test]
    fn test_labels_look_exactly_horizon_bars_ahead() {
        let prices: Vec<f64> = (0..80)
            .map(|i| if i % 3 == 0 { 90.0 } else { 110.0 + i as f64 })
            .collect();
        let h = 4;
        let table = FeatureEngine::default().derive(&series_from(&prices), h).unwrap();

        for (k, row) in table.labeled_rows().iter().enumerate() {
            let i = 49 + k;
            assert_eq!(row.label, Some(prices[i + h] > prices[i]), "bar {}", i);
        }
        // Last labeled row never reaches the final bar
        assert_eq!(49 + table.labeled_rows().len() - 1 + h, prices.len() - 2);
    }

    #[test]
    fn test_inference_row_is_latest_bar() {
        let prices = linear(70);
        let series = series_from(&prices);
        let table = FeatureEngine::default().derive(&series, 7).unwrap();

        let last = table.inference_row();
        assert_eq!(last.date, series.last().unwrap().date);
        assert_eq!(last.label, None);
    }

    #[test]
    fn test_zero_price_is_rejected() {
        let mut prices = linear(100);
        prices[10] = 0.0;
        let err = FeatureEngine::default()
            .derive(&series_from(&prices), 5)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput { .. }));
    }

    #[test]
    fn test_config_validation() {
        let bad = FeatureEngineConfig {
            ema_fast_period: 26,
            ema_slow_period: 12,
            ..Default::default()
        };
        assert!(FeatureEngine::new(bad).is_err());

        let bad = FeatureEngineConfig {
            volatility_window: 1,
            ..Default::default()
        };
        assert!(FeatureEngine::new(bad).is_err());

        let custom = FeatureEngineConfig {
            sma_long_period: 30,
            ..Default::default()
        };
        assert_eq!(FeatureEngine::new(custom).unwrap().config().warmup(), 29);
    }

    #[test]
    fn test_indicator_snapshot_matches_last_row() {
        let prices: Vec<f64> = (0..120)
            .map(|i| 50.0 + (i as f64 * 0.3).cos() * 2.0 + i as f64 * 0.1)
            .collect();
        let series = series_from(&prices);
        let engine = FeatureEngine::default();
        let table = engine.derive(&series, 10).unwrap();
        let snapshot = engine.indicator_snapshot(&series).unwrap();
        let last = table.inference_row();

        assert_eq!(snapshot.date, last.date);
        assert!((snapshot.sma_20 - last.sma_short).abs() < 1e-12);
        assert!((snapshot.sma_50 - last.sma_long).abs() < 1e-12);
        assert!((snapshot.macd - last.macd).abs() < 1e-12);
        assert!(snapshot.bb_upper > snapshot.bb_lower);
        assert!((0.0..=100.0).contains(&snapshot.rsi_14));
    }
}
