use serde::{Deserialize, Serialize};

/// Ratio snapshot for a company, keyed by symbol.
///
/// Every ratio is optional: the provider sends empty strings or `"None"` when
/// it has no value, and that must stay distinct from a genuine `0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyOverview {
    pub symbol: String,
    pub name: Option<String>,
    pub pe_ratio: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub price_to_book: Option<f64>,
    pub return_on_equity_ttm: Option<f64>,
    pub operating_margin: Option<f64>,
    pub profit_margin: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub beta: Option<f64>,
}

/// One annual income statement, keyed by (symbol, fiscal_date_ending).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeReport {
    pub symbol: String,
    pub fiscal_date_ending: String,
    pub total_revenue: Option<f64>,
    pub net_income: Option<f64>,
}

/// One annual balance sheet, keyed by (symbol, fiscal_date_ending).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceReport {
    pub symbol: String,
    pub fiscal_date_ending: String,
    pub total_shareholder_equity: Option<f64>,
}
