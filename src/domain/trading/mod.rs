// Verdicts and price alerts
pub mod verdict;

pub use verdict::{TargetAlert, TargetCheck, Verdict};
