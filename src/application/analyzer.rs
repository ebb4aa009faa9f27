//! End-to-end analysis of one ticker, or of many in parallel.
//!
//! Source -> FeatureEngine -> Evaluator -> DecisionEngine, with an optional
//! target-price check that is independent of the model verdict.

use crate::application::decision_engine::{
    self, DEFAULT_BUY_THRESHOLD, validate_target_price, validate_threshold,
};
use crate::application::feature_engineering_service::{FeatureEngine, IndicatorSnapshot};
use crate::application::ml::evaluator::DEFAULT_HOLDOUT_PERCENT;
use crate::application::ml::{Classifier, Evaluator};
use crate::domain::errors::AnalysisError;
use crate::domain::market::PriceSeries;
use crate::domain::ml::{FeatureRow, TrainedModel};
use crate::domain::ports::{AlertNotifier, PriceHistorySource};
use crate::domain::trading::{TargetAlert, TargetCheck, Verdict};
use chrono::{Duration, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_TAIL_ROWS: usize = 5;

/// Uppercases and checks a ticker symbol (`BRK.B`, `^GSPC`, `RDS-A` are valid).
pub fn normalize_ticker(ticker: &str) -> Result<String, AnalysisError> {
    let ticker = ticker.trim();
    if ticker.is_empty() {
        return Err(AnalysisError::invalid("ticker", "must not be empty"));
    }
    if let Some(c) = ticker
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^')))
    {
        return Err(AnalysisError::invalid(
            "ticker",
            format!("'{}' contains invalid character '{}'", ticker, c),
        ));
    }
    Ok(ticker.to_ascii_uppercase())
}

/// What to analyze: one ticker, a history length and a label horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub ticker: String,
    /// Calendar days of history before the label horizon
    pub lookback_days: u32,
    /// Label horizon in bars; also added (as calendar days) to the fetch window
    pub future_horizon: usize,
    pub as_of: NaiveDate,
}

impl AnalysisRequest {
    pub fn new(
        ticker: &str,
        lookback_days: u32,
        future_horizon: usize,
        as_of: NaiveDate,
    ) -> Result<Self, AnalysisError> {
        if lookback_days == 0 {
            return Err(AnalysisError::invalid("lookback_days", "must be > 0"));
        }
        if future_horizon == 0 {
            return Err(AnalysisError::invalid("future_horizon", "must be > 0"));
        }
        Ok(Self {
            ticker: normalize_ticker(ticker)?,
            lookback_days,
            future_horizon,
            as_of,
        })
    }

    /// `[as_of - (lookback + horizon) days, as_of]`
    pub fn fetch_window(&self) -> (NaiveDate, NaiveDate) {
        let days = i64::from(self.lookback_days) + self.future_horizon as i64;
        (self.as_of - Duration::days(days), self.as_of)
    }
}

/// Per-call decision settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    pub buy_threshold: f64,
    pub target_price: Option<f64>,
    pub holdout_percent: usize,
    /// Feature rows echoed in the report
    pub tail_rows: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            buy_threshold: DEFAULT_BUY_THRESHOLD,
            target_price: None,
            holdout_percent: DEFAULT_HOLDOUT_PERCENT,
            tail_rows: DEFAULT_TAIL_ROWS,
        }
    }
}

impl AnalysisSettings {
    pub fn new(
        buy_threshold: f64,
        target_price: Option<f64>,
        holdout_percent: usize,
        tail_rows: usize,
    ) -> Result<Self, AnalysisError> {
        Ok(Self {
            buy_threshold: validate_threshold(buy_threshold)?,
            target_price: target_price.map(validate_target_price).transpose()?,
            holdout_percent,
            tail_rows,
        })
    }

    pub fn with_target(mut self, target_price: f64) -> Result<Self, AnalysisError> {
        self.target_price = Some(validate_target_price(target_price)?);
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub ticker: String,
    /// Date of the most recent bar (the inference row)
    pub as_of: NaiveDate,
    pub current_price: f64,
    pub probability_up: f64,
    pub verdict: Verdict,
    pub buy_threshold: f64,
    pub holdout_accuracy: f64,
    pub train_rows: usize,
    pub test_rows: usize,
    pub future_horizon: usize,
    pub feature_table_tail: Vec<FeatureRow>,
    pub indicators: Option<IndicatorSnapshot>,
    pub target: Option<TargetCheck>,
    pub model: TrainedModel,
}

/// Outcome for one ticker of a batch run.
#[derive(Debug)]
pub struct BatchOutcome<T> {
    pub ticker: String,
    pub result: Result<T, AnalysisError>,
}

pub struct StockAnalyzer {
    source: Arc<dyn PriceHistorySource>,
    classifier: Arc<dyn Classifier>,
    engine: FeatureEngine,
    notifier: Option<Arc<dyn AlertNotifier>>,
}

impl StockAnalyzer {
    pub fn new(source: Arc<dyn PriceHistorySource>, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            source,
            classifier,
            engine: FeatureEngine::default(),
            notifier: None,
        }
    }

    pub fn with_engine(mut self, engine: FeatureEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn AlertNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    fn fetch(&self, request: &AnalysisRequest) -> Result<PriceSeries, AnalysisError> {
        let (start, end) = request.fetch_window();
        debug!(
            "StockAnalyzer: fetching {} [{} .. {}] from {}",
            request.ticker,
            start,
            end,
            self.source.name()
        );
        let series = self.source.fetch(&request.ticker, start, end)?;
        info!(
            "StockAnalyzer: {} bars for {} from {}",
            series.len(),
            request.ticker,
            self.source.name()
        );
        Ok(series)
    }

    pub fn analyze(
        &self,
        request: &AnalysisRequest,
        settings: &AnalysisSettings,
    ) -> Result<AnalysisReport, AnalysisError> {
        let series = self.fetch(request)?;
        self.analyze_series(&series, request.future_horizon, settings)
    }

    /// Runs the pipeline on an already loaded series.
    pub fn analyze_series(
        &self,
        series: &PriceSeries,
        future_horizon: usize,
        settings: &AnalysisSettings,
    ) -> Result<AnalysisReport, AnalysisError> {
        let buy_threshold = validate_threshold(settings.buy_threshold)?;
        let evaluator =
            Evaluator::new(self.classifier.clone()).with_holdout_percent(settings.holdout_percent)?;

        let table = self.engine.derive(series, future_horizon)?;
        let evaluation = evaluator.evaluate(&table)?;
        let verdict = decision_engine::decide(evaluation.probability_up, buy_threshold);

        let latest = table.inference_row();
        let current_price = latest.adjusted_close;
        let indicators = match self.engine.indicator_snapshot(series) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                debug!("StockAnalyzer: no indicator snapshot for {}: {}", series.ticker(), e);
                None
            }
        };
        let target = settings
            .target_price
            .map(|target| self.check_and_notify(series.ticker(), current_price, target));

        info!(
            "StockAnalyzer: {} @ {:.2} on {} -> {} (P(up) {:.2}%, accuracy {:.2}%)",
            series.ticker(),
            current_price,
            latest.date,
            verdict,
            evaluation.probability_up * 100.0,
            evaluation.holdout_accuracy * 100.0
        );

        Ok(AnalysisReport {
            ticker: series.ticker().to_string(),
            as_of: latest.date,
            current_price,
            probability_up: evaluation.probability_up,
            verdict,
            buy_threshold,
            holdout_accuracy: evaluation.holdout_accuracy,
            train_rows: evaluation.train_rows,
            test_rows: evaluation.test_rows,
            future_horizon,
            feature_table_tail: table.tail(settings.tail_rows).to_vec(),
            indicators,
            target,
            model: evaluation.model,
        })
    }

    /// Compares the latest adjusted price with `target_price` without
    /// training a model. Notifies when the target is reached.
    pub fn check_target(
        &self,
        request: &AnalysisRequest,
        target_price: f64,
    ) -> Result<TargetCheck, AnalysisError> {
        let target_price = validate_target_price(target_price)?;
        let series = self.fetch(request)?;
        let bar = series.last().ok_or_else(|| {
            AnalysisError::insufficient(format!("{} latest price", request.ticker), 1, 0)
        })?;
        Ok(self.check_and_notify(series.ticker(), bar.adjusted_close, target_price))
    }

    fn check_and_notify(&self, ticker: &str, current_price: f64, target_price: f64) -> TargetCheck {
        let check = decision_engine::check_target(current_price, target_price);
        if check.reached {
            info!(
                "StockAnalyzer: {} reached target {:.2} (current {:.2})",
                ticker, target_price, current_price
            );
            if let Some(notifier) = &self.notifier {
                notifier.notify(&TargetAlert {
                    ticker: ticker.to_string(),
                    target_price,
                    current_price,
                });
            }
        }
        check
    }

    /// Analyzes every request in parallel. A failing ticker is logged and
    /// reported on its own; it never aborts the others.
    pub fn analyze_batch(
        &self,
        jobs: &[(AnalysisRequest, AnalysisSettings)],
    ) -> Vec<BatchOutcome<AnalysisReport>> {
        jobs.par_iter()
            .map(|(request, settings)| BatchOutcome {
                ticker: request.ticker.clone(),
                result: self
                    .analyze(request, settings)
                    .inspect_err(|e| warn!("StockAnalyzer: analysis of {} failed: {}", request.ticker, e)),
            })
            .collect()
    }

    /// Target checks for several tickers in parallel.
    pub fn check_targets(&self, targets: &[(AnalysisRequest, f64)]) -> Vec<BatchOutcome<TargetCheck>> {
        targets
            .par_iter()
            .map(|(request, target)| BatchOutcome {
                ticker: request.ticker.clone(),
                result: self
                    .check_target(request, *target)
                    .inspect_err(|e| warn!("StockAnalyzer: target check of {} failed: {}", request.ticker, e)),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ml::LogisticRegressionClassifier;
    use crate::domain::market::Bar;
    use crate::infrastructure::in_memory::InMemoryPriceSource;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CollectingNotifier {
        alerts: Mutex<Vec<TargetAlert>>,
    }

    impl AlertNotifier for CollectingNotifier {
        fn notify(&self, alert: &TargetAlert) {
            self.alerts.lock().unwrap().push(alert.clone());
        }
    }

    fn day(i: usize) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(i as i64)
    }

    /// Saw-tooth with an upward drift: both label classes in every window.
    fn sawtooth(ticker: &str, n: usize) -> PriceSeries {
        let bars = (0..n)
            .map(|i| Bar::flat(day(i), 100.0 + i as f64 * 0.1 + (i % 7) as f64, 1e6))
            .collect();
        PriceSeries::new(ticker, bars).unwrap()
    }

    fn analyzer(series: Vec<PriceSeries>) -> StockAnalyzer {
        let source = InMemoryPriceSource::new();
        for s in series {
            source.insert(s);
        }
        StockAnalyzer::new(
            Arc::new(source),
            Arc::new(LogisticRegressionClassifier::default()),
        )
    }

    #[test]
    fn test_normalize_ticker() {
        assert_eq!(normalize_ticker(" brk.b ").unwrap(), "BRK.B");
        assert_eq!(normalize_ticker("^gspc").unwrap(), "^GSPC");
        assert!(normalize_ticker("").is_err());
        assert!(normalize_ticker("AA PL").is_err());
        assert!(normalize_ticker("../etc").is_err());
    }

    #[test]
    fn test_fetch_window_spans_lookback_plus_horizon() {
        let req = AnalysisRequest::new("aapl", 180, 30, day(300)).unwrap();
        assert_eq!(req.ticker, "AAPL");
        assert_eq!(req.fetch_window(), (day(90), day(300)));
    }

    #[test]
    fn test_settings_validation() {
        assert!(AnalysisSettings::new(1.5, None, 20, 5).is_err());
        assert!(AnalysisSettings::new(0.7, Some(-3.0), 20, 5).is_err());
        assert!(AnalysisSettings::default().with_target(200.0).is_ok());
    }

    #[test]
    fn test_analyze_produces_report() {
        let analyzer = analyzer(vec![sawtooth("AAPL", 200)]);
        let req = AnalysisRequest::new("AAPL", 190, 10, day(199)).unwrap();
        let report = analyzer.analyze(&req, &AnalysisSettings::default()).unwrap();

        assert_eq!(report.ticker, "AAPL");
        assert_eq!(report.as_of, day(199));
        assert_eq!(report.train_rows + report.test_rows, 200 - 49 - 10 - 1);
        assert_eq!(report.feature_table_tail.len(), DEFAULT_TAIL_ROWS);
        assert!(report.feature_table_tail.last().unwrap().label.is_none());
        assert!((0.0..=1.0).contains(&report.probability_up));
        assert_eq!(
            report.verdict,
            decision_engine::decide(report.probability_up, DEFAULT_BUY_THRESHOLD)
        );
        assert!(report.indicators.is_some());
        assert!(report.target.is_none());
    }

    #[test]
    fn test_target_alert_is_independent_of_verdict() {
        let notifier = Arc::new(CollectingNotifier::default());
        let analyzer = analyzer(vec![sawtooth("NVDA", 120)]).with_notifier(notifier.clone());
        let req = AnalysisRequest::new("NVDA", 110, 5, day(119)).unwrap();

        let current = sawtooth("NVDA", 120).last().unwrap().adjusted_close;
        let check = analyzer.check_target(&req, current).unwrap();
        assert!(check.reached);
        let check = analyzer.check_target(&req, current + 0.01).unwrap();
        assert!(!check.reached);

        let alerts = notifier.alerts.lock().unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].ticker, "NVDA");
    }

    #[test]
    fn test_unknown_ticker_is_data_unavailable() {
        let analyzer = analyzer(vec![]);
        let req = AnalysisRequest::new("ZZZZ", 180, 30, day(300)).unwrap();
        let err = analyzer.analyze(&req, &AnalysisSettings::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::DataUnavailable(_)));
    }

    #[test]
    fn test_batch_isolates_failures() {
        let analyzer = analyzer(vec![sawtooth("AAPL", 200), sawtooth("MSFT", 40)]);
        let settings = AnalysisSettings::default();
        let jobs: Vec<_> = ["AAPL", "MSFT", "ZZZZ"]
            .iter()
            .map(|t| (AnalysisRequest::new(t, 190, 10, day(199)).unwrap(), settings.clone()))
            .collect();

        let outcomes = analyzer.analyze_batch(&jobs);

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].ticker, "AAPL");
        assert!(outcomes[0].result.is_ok());
        assert!(matches!(
            outcomes[1].result,
            Err(AnalysisError::InsufficientData { .. })
        ));
        assert!(matches!(
            outcomes[2].result,
            Err(AnalysisError::DataUnavailable(_))
        ));
    }
}
