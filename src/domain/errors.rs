use thiserror::Error;

/// Errors raised by the data-source port when a price history cannot be served
#[derive(Debug, Error, PartialEq)]
pub enum MarketDataError {
    #[error("Unknown ticker: {ticker}")]
    UnknownTicker { ticker: String },

    #[error("No bars for {ticker} between {start} and {end}")]
    EmptyRange {
        ticker: String,
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("Malformed price data for {ticker}: {reason}")]
    Malformed { ticker: String, reason: String },

    #[error("Failed to read price data for {ticker}: {reason}")]
    Io { ticker: String, reason: String },
}

/// Errors raised by the analysis pipeline (feature derivation, training, decision)
#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("Insufficient data for {context}: need {required}, have {available}")]
    InsufficientData {
        context: String,
        required: usize,
        available: usize,
    },

    #[error("Degenerate labels: all {rows} training rows are labelled {label}")]
    DegenerateLabels { label: bool, rows: usize },

    #[error("Invalid input: {field} {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Data unavailable: {0}")]
    DataUnavailable(#[from] MarketDataError),

    #[error("Model error ({model}): {reason}")]
    Model { model: String, reason: String },
}

impl AnalysisError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AnalysisError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn insufficient(context: impl Into<String>, required: usize, available: usize) -> Self {
        AnalysisError::InsufficientData {
            context: context.into(),
            required,
            available,
        }
    }
}
