use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use chrono::Utc;
use regex::Regex;

use crate::error::{AppError, Result};
use crate::models::{BalanceReport, CompanyOverview, IncomeReport, Scorecard};
use crate::services::store::StockStore;

/// Years of history looked at for growth and ROE.
pub const HISTORY_YEARS: usize = 5;

fn fiscal_year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{4})").expect("valid fiscal year regex"))
}

pub fn fiscal_year(fiscal_date_ending: &str) -> Option<&str> {
    fiscal_year_re()
        .captures(fiscal_date_ending.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Percentage growth between the most recent report and the one five years
/// earlier. `income` must be most recent first. Returns 0 when there are fewer
/// than six reports, when the base revenue is 0, or when either revenue is
/// missing.
pub fn revenue_5y_growth(income: &[IncomeReport]) -> f64 {
    if income.len() <= HISTORY_YEARS {
        return 0.0;
    }

    match (income[0].total_revenue, income[HISTORY_YEARS].total_revenue) {
        (Some(latest), Some(base)) if base != 0.0 => (latest - base) / base * 100.0,
        _ => 0.0,
    }
}

/// Net income over shareholder equity, per fiscal year, for up to five of the
/// most recent years present in both histories. Years with zero or missing
/// equity are left out.
pub fn historical_roe(income: &[IncomeReport], balance: &[BalanceReport]) -> BTreeMap<String, f64> {
    let mut out = BTreeMap::new();
    let years = HISTORY_YEARS.min(income.len()).min(balance.len());

    for inc in income.iter().take(years) {
        let Some(year) = fiscal_year(&inc.fiscal_date_ending) else {
            tracing::warn!(symbol = %inc.symbol, date = %inc.fiscal_date_ending, "unparsable fiscal date");
            continue;
        };

        let Some(bal) = balance
            .iter()
            .take(years)
            .find(|b| fiscal_year(&b.fiscal_date_ending) == Some(year))
        else {
            continue;
        };

        match (inc.net_income, bal.total_shareholder_equity) {
            (Some(net), Some(equity)) if equity != 0.0 => {
                out.insert(year.to_string(), net / equity * 100.0);
            }
            _ => {}
        }
    }

    out
}

pub fn build_scorecard(overview: &CompanyOverview, income: &[IncomeReport], balance: &[BalanceReport]) -> Scorecard {
    Scorecard {
        symbol: overview.symbol.clone(),
        company_name: overview.name.clone(),
        pe_ratio: overview.pe_ratio,
        peg_ratio: overview.peg_ratio,
        price_to_book: overview.price_to_book,
        roe_ttm: overview.return_on_equity_ttm,
        operating_margin: overview.operating_margin,
        profit_margin: overview.profit_margin,
        dividend_yield: overview.dividend_yield,
        beta: overview.beta,
        revenue_5y_growth: revenue_5y_growth(income),
        historical_roe: historical_roe(income, balance),
        updated_at: Utc::now().timestamp(),
    }
}

pub struct ScorecardService {
    store: Arc<dyn StockStore>,
}

impl ScorecardService {
    pub fn new(store: Arc<dyn StockStore>) -> Self {
        Self { store }
    }

    /// Recompute the scorecard from stored fundamentals and replace the stored one.
    pub async fn compute_scorecard(&self, symbol: &str) -> Result<Scorecard> {
        let overview = self
            .store
            .get_overview(symbol)
            .await?
            .ok_or_else(|| missing(symbol, "overview"))?;

        let income = self.store.income_reports(symbol).await?;
        if income.is_empty() {
            return Err(missing(symbol, "income statement"));
        }

        let balance = self.store.balance_reports(symbol).await?;
        if balance.is_empty() {
            return Err(missing(symbol, "balance sheet"));
        }

        let card = build_scorecard(&overview, &income, &balance);
        self.store.upsert_scorecard(&card).await?;

        tracing::info!(
            symbol,
            growth = card.revenue_5y_growth,
            roe_years = card.historical_roe.len(),
            "scorecard computed"
        );
        Ok(card)
    }

    pub async fn get_scorecard(&self, symbol: &str) -> Result<Scorecard> {
        self.store
            .get_scorecard(symbol)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("scorecard for {symbol}")))
    }
}

fn missing(symbol: &str, what: &'static str) -> AppError {
    AppError::MissingFundamentals {
        symbol: symbol.to_string(),
        what,
    }
}
