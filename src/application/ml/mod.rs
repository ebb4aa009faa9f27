pub mod classifier;
pub mod evaluator;
pub mod logistic_regression;
pub mod smartcore_classifier;

pub use classifier::Classifier;
pub use evaluator::{Evaluation, Evaluator};
pub use logistic_regression::LogisticRegressionClassifier;
pub use smartcore_classifier::SmartCoreLogisticClassifier;
