pub mod alerting;
pub mod csv_price_source;
pub mod in_memory;

pub use alerting::LogAlertNotifier;
pub use csv_price_source::CsvPriceSource;
pub use in_memory::InMemoryPriceSource;

use crate::domain::errors::MarketDataError;
use crate::domain::market::{Bar, PriceSeries};
use chrono::NaiveDate;

/// Keeps the bars dated within `[start, end]`, sorted ascending.
pub(crate) fn series_in_range(
    ticker: &str,
    mut bars: Vec<Bar>,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<PriceSeries, MarketDataError> {
    bars.retain(|b| b.date >= start && b.date <= end);
    if bars.is_empty() {
        return Err(MarketDataError::EmptyRange {
            ticker: ticker.to_string(),
            start,
            end,
        });
    }
    bars.sort_by_key(|b| b.date);
    PriceSeries::new(ticker, bars).map_err(|e| MarketDataError::Malformed {
        ticker: ticker.to_string(),
        reason: e.to_string(),
    })
}
