use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Derived per-symbol summary. Recomputed from stored fundamentals and
/// replaced wholesale on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scorecard {
    pub symbol: String,
    pub company_name: Option<String>,
    pub pe_ratio: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub price_to_book: Option<f64>,
    pub roe_ttm: Option<f64>,
    pub operating_margin: Option<f64>,
    pub profit_margin: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub beta: Option<f64>,

    pub revenue_5y_growth: f64,
    // fiscal year ("2023") -> ROE %
    pub historical_roe: BTreeMap<String, f64>,

    pub updated_at: i64,
}
