//! End-to-end scenarios through the public analyzer API.

mod common;

use common::{day, random_walk, series, v_shape};
use std::sync::Arc;
use stockcast::application::analyzer::{AnalysisRequest, AnalysisSettings, StockAnalyzer};
use stockcast::application::feature_engineering_service::FeatureEngine;
use stockcast::application::ml::{
    Classifier, Evaluator, LogisticRegressionClassifier, SmartCoreLogisticClassifier,
};
use stockcast::domain::errors::AnalysisError;
use stockcast::domain::market::PriceSeries;
use stockcast::domain::trading::Verdict;
use stockcast::infrastructure::InMemoryPriceSource;

fn analyzer_for(series: Vec<PriceSeries>, classifier: Arc<dyn Classifier>) -> StockAnalyzer {
    let source = InMemoryPriceSource::new();
    for s in series {
        source.insert(s);
    }
    StockAnalyzer::new(Arc::new(source), classifier)
}

fn logistic() -> Arc<dyn Classifier> {
    Arc::new(LogisticRegressionClassifier::default())
}

#[test]
fn test_recovering_uptrend_is_a_buy() {
    let prices = v_shape(250);
    let analyzer = analyzer_for(vec![series("UPTR", &prices)], logistic());
    let request = AnalysisRequest::new("UPTR", 240, 10, day(249)).unwrap();

    let report = analyzer
        .analyze(&request, &AnalysisSettings::default())
        .unwrap();

    assert!(
        report.probability_up > 0.7,
        "probability_up = {}",
        report.probability_up
    );
    assert_eq!(report.verdict, Verdict::Buy);
    assert_eq!(report.train_rows + report.test_rows, 250 - 49 - 10 - 1);
    // Holdout is the late, steadily rising stretch
    assert!(report.holdout_accuracy > 0.9);
}

#[test]
fn test_strictly_increasing_series_has_single_label_class() {
    let prices: Vec<f64> = (0..200).map(|i| 100.0 + i as f64).collect();
    let analyzer = analyzer_for(vec![series("MONO", &prices)], logistic());
    let request = AnalysisRequest::new("MONO", 190, 10, day(199)).unwrap();

    let err = analyzer
        .analyze(&request, &AnalysisSettings::default())
        .unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::DegenerateLabels { label: true, .. }
    ));
}

#[test]
fn test_flat_series_is_never_a_buy() {
    let prices = vec![50.0; 200];
    let analyzer = analyzer_for(vec![series("FLAT", &prices)], logistic());
    let request = AnalysisRequest::new("FLAT", 190, 10, day(199)).unwrap();

    match analyzer.analyze(&request, &AnalysisSettings::default()) {
        Err(AnalysisError::DegenerateLabels { label, .. }) => assert!(!label),
        Ok(report) => {
            assert!((report.probability_up - 0.5).abs() < 0.05);
            assert_eq!(report.verdict, Verdict::HoldOrWait);
        }
        Err(e) => panic!("unexpected error: {}", e),
    }
}

#[test]
fn test_analysis_is_idempotent() {
    let prices = random_walk(220, 7);
    let analyzer = analyzer_for(vec![series("RAND", &prices)], logistic());
    let request = AnalysisRequest::new("RAND", 210, 15, day(219)).unwrap();
    let settings = AnalysisSettings::default();

    let first = analyzer.analyze(&request, &settings);
    let second = analyzer.analyze(&request, &settings);
    assert_eq!(first, second);
}

#[test]
fn test_smartcore_model_is_a_drop_in_substitute() {
    let prices = v_shape(250);
    let table = FeatureEngine::default()
        .derive(&series("SUBS", &prices), 10)
        .unwrap();

    let logistic = Evaluator::new(logistic()).evaluate(&table).unwrap();
    let smartcore = Evaluator::new(Arc::new(SmartCoreLogisticClassifier::default()))
        .evaluate(&table)
        .unwrap();

    assert_eq!(smartcore.model.classifier, "smartcore");
    assert_eq!(
        (smartcore.train_rows, smartcore.test_rows),
        (logistic.train_rows, logistic.test_rows)
    );
    assert!((0.0..=1.0).contains(&smartcore.probability_up));
    assert!((0.0..=1.0).contains(&smartcore.holdout_accuracy));
}

#[test]
fn test_minimum_series_length_boundary() {
    let engine = FeatureEngine::default();
    for h in [1, 5, 30] {
        let ok = engine.derive(&series("EDGE", &random_walk(51 + h, 3)), h);
        assert_eq!(ok.unwrap().len(), 2, "h = {}", h);

        let short = engine.derive(&series("EDGE", &random_walk(50 + h, 3)), h);
        assert!(
            matches!(short, Err(AnalysisError::InsufficientData { .. })),
            "h = {}",
            h
        );
    }
}

#[test]
fn test_threshold_is_a_per_call_setting() {
    let prices = v_shape(250);
    let analyzer = analyzer_for(vec![series("UPTR", &prices)], logistic());
    let request = AnalysisRequest::new("UPTR", 240, 10, day(249)).unwrap();

    let strict = AnalysisSettings::new(1.0, None, 20, 5).unwrap();
    let report = analyzer.analyze(&request, &strict).unwrap();
    assert_eq!(report.verdict, Verdict::HoldOrWait);

    let lenient = AnalysisSettings::new(0.0, None, 20, 5).unwrap();
    let report = analyzer.analyze(&request, &lenient).unwrap();
    assert_eq!(report.verdict, Verdict::Buy);
}
