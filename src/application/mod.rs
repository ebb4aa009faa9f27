// Feature derivation from price history
pub mod feature_engineering_service;

// Classifiers and chronological evaluation
pub mod ml;

// Probability -> verdict, target checks
pub mod decision_engine;

// Pipeline facade (single ticker and batch)
pub mod analyzer;
