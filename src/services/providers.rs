//! Capability traits implemented by the provider adapters.
//!
//! No provider covers every capability; the extraction service holds one
//! adapter per capability.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{
    BalanceReport, CompanyOverview, CompanyProfile, IncomeReport, Quote, StockBar, SymbolListing,
};
use crate::services::context::CallContext;

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_quote(&self, ctx: &CallContext, symbol: &str) -> Result<Quote>;

    /// Intraday series, oldest bar first.
    async fn fetch_time_series(&self, ctx: &CallContext, symbol: &str) -> Result<Vec<StockBar>>;
}

#[async_trait]
pub trait SymbolProvider: Send + Sync {
    async fn fetch_symbols(&self, ctx: &CallContext, exchange: &str) -> Result<Vec<SymbolListing>>;

    async fn fetch_company_profile(&self, ctx: &CallContext, symbol: &str) -> Result<CompanyProfile>;
}

/// Bars plus the ticker the provider reports back, which may be a normalized
/// form of the requested one.
#[derive(Debug, Clone)]
pub struct IntradayBars {
    pub symbol: String,
    pub bars: Vec<StockBar>,
}

#[async_trait]
pub trait BarProvider: Send + Sync {
    async fn fetch_intraday_bars(
        &self,
        ctx: &CallContext,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<IntradayBars>;
}

#[async_trait]
pub trait FundamentalsProvider: Send + Sync {
    async fn fetch_overview(&self, ctx: &CallContext, symbol: &str) -> Result<CompanyOverview>;

    /// Annual reports, most recent first.
    async fn fetch_income_statement(&self, ctx: &CallContext, symbol: &str) -> Result<Vec<IncomeReport>>;

    /// Annual reports, most recent first.
    async fn fetch_balance_sheet(&self, ctx: &CallContext, symbol: &str) -> Result<Vec<BalanceReport>>;
}
