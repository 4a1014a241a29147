use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One OHLCV record, keyed by (symbol, timestamp).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockBar {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}
