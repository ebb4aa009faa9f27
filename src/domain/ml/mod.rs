pub mod feature_registry;
pub mod features;
pub mod trained_model;

pub use features::{FeatureRow, FeatureTable};
pub use trained_model::TrainedModel;
