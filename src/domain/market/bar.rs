use crate::domain::errors::AnalysisError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily price bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adjusted_close: f64,
    pub volume: f64,
}

impl Bar {
    /// Bar where every price field equals `price`. Handy for synthetic series.
    pub fn flat(date: NaiveDate, price: f64, volume: f64) -> Self {
        Self {
            date,
            open: price,
            high: price,
            low: price,
            close: price,
            adjusted_close: price,
            volume,
        }
    }

    fn validate(&self) -> Result<(), AnalysisError> {
        let fields = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("adjusted_close", self.adjusted_close),
            ("volume", self.volume),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(AnalysisError::invalid(
                    format!("bar {} {}", self.date, name),
                    format!("must be a finite non-negative number, got {}", value),
                ));
            }
        }
        Ok(())
    }
}

/// Daily price history of a single ticker.
///
/// # Invariants
///
/// - Dates are strictly increasing (no duplicates, no reordering)
/// - Every numeric field is finite and non-negative
///
/// Missing trading days are kept missing: bars are never interpolated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    ticker: String,
    bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn new(ticker: impl Into<String>, bars: Vec<Bar>) -> Result<Self, AnalysisError> {
        let ticker = ticker.into();
        if bars.is_empty() {
            return Err(AnalysisError::insufficient(
                format!("price series {}", ticker),
                1,
                0,
            ));
        }

        for bar in &bars {
            bar.validate()?;
        }

        if let Some(pair) = bars.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(AnalysisError::invalid(
                format!("price series {}", ticker),
                format!(
                    "dates must be strictly increasing ({} followed by {})",
                    pair[0].date, pair[1].date
                ),
            ));
        }

        Ok(Self { ticker, bars })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Adjusted closes, the price used by every indicator.
    pub fn adjusted_closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.adjusted_close).collect()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Series restricted to the first `len` bars (used to replay history up to a date).
    pub fn prefix(&self, len: usize) -> Result<Self, AnalysisError> {
        Self::new(self.ticker.clone(), self.bars[..len.min(self.bars.len())].to_vec())
    }
}
