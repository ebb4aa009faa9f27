use crate::domain::errors::MarketDataError;
use crate::domain::market::{Bar, PriceSeries};
use crate::domain::ports::PriceHistorySource;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One row of `<TICKER>.csv`. Yahoo-style headers are accepted as aliases.
#[derive(Debug, Deserialize)]
struct PriceRecord {
    #[serde(alias = "Date")]
    date: NaiveDate,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "Adj Close", alias = "adjusted_close")]
    adj_close: f64,
    #[serde(alias = "Volume")]
    volume: f64,
}

impl From<PriceRecord> for Bar {
    fn from(r: PriceRecord) -> Self {
        Bar {
            date: r.date,
            open: r.open,
            high: r.high,
            low: r.low,
            close: r.close,
            adjusted_close: r.adj_close,
            volume: r.volume,
        }
    }
}

/// Reads daily bars from `<dir>/<TICKER>.csv`
/// (`date,open,high,low,close,adj_close,volume`, ISO dates).
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    dir: PathBuf,
}

impl CsvPriceSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", ticker.to_ascii_uppercase()))
    }

    fn read_bars(&self, ticker: &str) -> Result<Vec<Bar>, MarketDataError> {
        let path = self.path_for(ticker);
        let file = File::open(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => MarketDataError::UnknownTicker {
                ticker: ticker.to_string(),
            },
            _ => MarketDataError::Io {
                ticker: ticker.to_string(),
                reason: format!("{}: {}", path.display(), e),
            },
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(BufReader::new(file));
        let mut bars = Vec::new();
        for (line, result) in rdr.deserialize::<PriceRecord>().enumerate() {
            let record = result.map_err(|e| MarketDataError::Malformed {
                ticker: ticker.to_string(),
                // +2: header line and 1-based numbering
                reason: format!("{} line {}: {}", path.display(), line + 2, e),
            })?;
            bars.push(record.into());
        }
        debug!("CsvPriceSource: read {} rows from {}", bars.len(), path.display());
        Ok(bars)
    }
}

impl PriceHistorySource for CsvPriceSource {
    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, MarketDataError> {
        let bars = self.read_bars(ticker)?;
        super::series_in_range(ticker, bars, start, end)
    }

    fn name(&self) -> &str {
        "csv"
    }
}
