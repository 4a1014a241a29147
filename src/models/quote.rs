use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Latest quote for a symbol. Fields the provider sent as unparsable strings
/// are `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub price: Option<f64>,
    pub volume: Option<f64>,
    pub latest_trading_day: Option<NaiveDate>,
    pub previous_close: Option<f64>,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
}
