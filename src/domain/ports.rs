use crate::domain::errors::MarketDataError;
use crate::domain::market::PriceSeries;
use crate::domain::trading::TargetAlert;
use chrono::NaiveDate;

/// Source of daily price history. Implementations must return bars sorted
/// ascending with no duplicate dates, restricted to `[start, end]`.
pub trait PriceHistorySource: Send + Sync {
    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, MarketDataError>;

    /// Get source name (for logs)
    fn name(&self) -> &str;
}

/// Delivery channel for target-price alerts.
pub trait AlertNotifier: Send + Sync {
    fn notify(&self, alert: &TargetAlert);
}
