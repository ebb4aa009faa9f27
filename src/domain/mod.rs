// Price history domain
pub mod market;

// Feature tables and trained models
pub mod ml;

// Port interfaces
pub mod ports;

// Verdicts and alerts
pub mod trading;

// Domain-specific error types
pub mod errors;
