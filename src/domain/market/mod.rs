// Daily price history
pub mod bar;

pub use bar::{Bar, PriceSeries};
