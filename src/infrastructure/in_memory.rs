use crate::domain::errors::MarketDataError;
use crate::domain::market::PriceSeries;
use crate::domain::ports::PriceHistorySource;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::RwLock;

/// Price source backed by series held in memory (tests, replays).
#[derive(Default)]
pub struct InMemoryPriceSource {
    series: RwLock<HashMap<String, PriceSeries>>,
}

impl InMemoryPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the series stored under its ticker.
    pub fn insert(&self, series: PriceSeries) {
        if let Ok(mut map) = self.series.write() {
            map.insert(series.ticker().to_ascii_uppercase(), series);
        }
    }

    pub fn tickers(&self) -> Vec<String> {
        let mut tickers: Vec<String> = self
            .series
            .read()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default();
        tickers.sort();
        tickers
    }
}

impl PriceHistorySource for InMemoryPriceSource {
    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, MarketDataError> {
        let bars = {
            let map = self.series.read().map_err(|e| MarketDataError::Io {
                ticker: ticker.to_string(),
                reason: e.to_string(),
            })?;
            map.get(&ticker.to_ascii_uppercase())
                .map(|s| s.bars().to_vec())
                .ok_or_else(|| MarketDataError::UnknownTicker {
                    ticker: ticker.to_string(),
                })?
        };
        super::series_in_range(ticker, bars, start, end)
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
